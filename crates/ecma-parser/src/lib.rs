//! # Reference parser collaborator
//!
//! A lexer, recursive-descent parser, and scope binder for the JavaScript
//! subset the linting core's test suite exercises. Implements the core's
//! [`Parser`] contract so it can be plugged into a lint configuration via
//! `language_options.parser`.
//!
//! This crate is the collaborator, not part of the core: the linting engine
//! never parses on its own.

pub mod binder;
pub mod lexer;
pub mod parser;

use ecma_linter::{ParseFailure, ParseResult, Parser, ParserOptions};
use ecma_source::{LineIndex, ParserServices};

/// The parser handed to `LanguageOptions::parser`.
///
/// `ecmaVersion` is accepted and ignored: this parser always speaks the
/// newest grammar it implements, which is what `"latest"` asks for.
#[derive(Debug, Default, Clone, Copy)]
pub struct EcmaParser;

impl EcmaParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Parser for EcmaParser {
    fn parse(&self, text: &str, _options: &ParserOptions) -> Result<ParseResult, ParseFailure> {
        let lexed = lexer::tokenize(text)
            .map_err(|error| failure(text, error.message, error.offset))?;
        let tree = parser::parse_program(text, &lexed.tokens)
            .map_err(|error| failure(text, error.message, error.offset))?;
        let scopes = binder::bind(&tree);
        Ok(ParseResult {
            tree,
            tokens: lexed.tokens,
            comments: lexed.comments,
            scopes,
            services: ParserServices::new(),
            visitor_keys: None,
        })
    }
}

fn failure(text: &str, message: String, offset: usize) -> ParseFailure {
    let position = LineIndex::new(text).position(offset);
    ParseFailure {
        message,
        line: Some(position.line),
        column: Some(position.column + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_linter::{EcmaVersion, SourceType};

    fn options() -> ParserOptions {
        ParserOptions {
            ecma_version: EcmaVersion::Latest,
            source_type: SourceType::Script,
        }
    }

    #[test]
    fn test_full_parse() {
        let result = EcmaParser::new()
            .parse("var x = 1; // one\n", &options())
            .unwrap();
        assert_eq!(result.tokens.len(), 5);
        assert_eq!(result.comments.len(), 1);
        assert!(!result.scopes.is_empty());
    }

    #[test]
    fn test_failure_carries_position() {
        let failure = EcmaParser::new().parse("var x =", &options()).unwrap_err();
        assert_eq!(failure.message, "Unexpected end of input");
        assert_eq!(failure.line, Some(1));
        assert_eq!(failure.column, Some(8));
    }
}
