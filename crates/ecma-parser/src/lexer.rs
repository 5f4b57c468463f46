//! Tokenizer for the supported JavaScript subset.
//!
//! Produces the token and comment streams the source-code object expects:
//! both sorted by range start, comments separated out, shebang recognized
//! on the first line only.

use ecma_ast::{TextRange, Token, TokenKind};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LexError {
    pub message: String,
    pub offset: usize,
}

impl LexError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

const KEYWORDS: &[&str] = &[
    "break", "case", "catch", "const", "continue", "debugger", "default", "delete", "do", "else",
    "finally", "for", "function", "if", "in", "instanceof", "let", "new", "return", "switch",
    "this", "throw", "try", "typeof", "var", "void", "while",
];

/// Multi-character punctuators, longest first so maximal munch works.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", ">>>", "...", "<<=", ">>=", "==", "!=", "<=", ">=", "&&", "||", "++", "--",
    "+=", "-=", "*=", "/=", "%=", "=>", "<<", ">>", "{", "}", "(", ")", "[", "]", ";", ",", "<",
    ">", "+", "-", "*", "/", "%", "=", "!", "?", ":", ".", "&", "|", "^", "~",
];

#[derive(Debug)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub comments: Vec<Token>,
}

/// Tokenize `text`. Fails on unterminated strings or block comments and on
/// characters outside the supported subset.
pub fn tokenize(text: &str) -> Result<LexOutput, LexError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut comments = Vec::new();
    let mut pos = 0;

    // Shebang is only special at offset zero.
    if text.starts_with("#!") {
        let end = line_end(text, 0);
        comments.push(Token::new(
            TokenKind::Shebang,
            &text[2..end],
            TextRange::new(0, end),
        ));
        pos = end;
    }

    while pos < bytes.len() {
        let c = bytes[pos];

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }
        // Multi-byte whitespace (U+2028, U+2029, NBSP) is rare; treat any
        // non-ASCII whitespace char the same way.
        if c >= 0x80 {
            let ch = text[pos..].chars().next().unwrap_or('\u{fffd}');
            if ch.is_whitespace() {
                pos += ch.len_utf8();
                continue;
            }
            return Err(LexError::new(format!("Unexpected character '{ch}'"), pos));
        }

        if c == b'/' && pos + 1 < bytes.len() {
            match bytes[pos + 1] {
                b'/' => {
                    let end = line_end(text, pos);
                    comments.push(Token::new(
                        TokenKind::LineComment,
                        &text[pos + 2..end],
                        TextRange::new(pos, end),
                    ));
                    pos = end;
                    continue;
                }
                b'*' => {
                    let close = text[pos + 2..]
                        .find("*/")
                        .ok_or_else(|| LexError::new("Unterminated block comment", pos))?;
                    let end = pos + 2 + close + 2;
                    comments.push(Token::new(
                        TokenKind::BlockComment,
                        &text[pos + 2..end - 2],
                        TextRange::new(pos, end),
                    ));
                    pos = end;
                    continue;
                }
                _ => {}
            }
        }

        if c == b'"' || c == b'\'' {
            let (token, next) = lex_string(text, pos)?;
            tokens.push(token);
            pos = next;
            continue;
        }

        if c.is_ascii_digit() {
            let (token, next) = lex_number(text, pos);
            tokens.push(token);
            pos = next;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            let end = ident_end(text, pos);
            let word = &text[pos..end];
            let kind = match word {
                "true" | "false" => TokenKind::Boolean,
                "null" => TokenKind::Null,
                w if KEYWORDS.contains(&w) => TokenKind::Keyword,
                _ => TokenKind::Identifier,
            };
            tokens.push(Token::new(kind, word, TextRange::new(pos, end)));
            pos = end;
            continue;
        }

        let rest = &text[pos..];
        let Some(punct) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) else {
            return Err(LexError::new(
                format!("Unexpected character '{}'", c as char),
                pos,
            ));
        };
        tokens.push(Token::new(
            TokenKind::Punctuator,
            *punct,
            TextRange::new(pos, pos + punct.len()),
        ));
        pos += punct.len();
    }

    Ok(LexOutput { tokens, comments })
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..]
        .find(['\n', '\r', '\u{2028}', '\u{2029}'])
        .map_or(text.len(), |i| from + i)
}

fn ident_end(text: &str, from: usize) -> usize {
    text[from..]
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_' || *c == '$'))
        .map_or(text.len(), |(i, _)| from + i)
}

fn lex_string(text: &str, start: usize) -> Result<(Token, usize), LexError> {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => {
                if pos + 1 >= bytes.len() {
                    break;
                }
                pos += 2;
            }
            b'\n' | b'\r' => break,
            c if c == quote => {
                // Token value carries the raw text, quotes included.
                let range = TextRange::new(start, pos + 1);
                return Ok((Token::new(TokenKind::String, &text[start..pos + 1], range), pos + 1));
            }
            c if c < 0x80 => pos += 1,
            _ => pos += text[pos..].chars().next().map_or(1, char::len_utf8),
        }
    }
    Err(LexError::new("Unterminated string literal", start))
}

fn lex_number(text: &str, start: usize) -> (Token, usize) {
    let end = text[start..]
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(text.len(), |(i, _)| start + i);
    (
        Token::new(TokenKind::Numeric, &text[start..end], TextRange::new(start, end)),
        end,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, String)> {
        tokenize(text)
            .unwrap()
            .tokens
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn test_basic_statement() {
        let tokens = kinds("var x = 1;");
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Keyword, "var".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Punctuator, "=".to_string()),
                (TokenKind::Numeric, "1".to_string()),
                (TokenKind::Punctuator, ";".to_string()),
            ]
        );
    }

    #[test]
    fn test_maximal_munch() {
        let tokens = kinds("a === b");
        assert_eq!(tokens[1], (TokenKind::Punctuator, "===".to_string()));
        let tokens = kinds("i++");
        assert_eq!(tokens[1], (TokenKind::Punctuator, "++".to_string()));
    }

    #[test]
    fn test_comments_separated() {
        let out = tokenize("var x; // note\n/* block */ var y;").unwrap();
        assert_eq!(out.comments.len(), 2);
        assert_eq!(out.comments[0].kind, TokenKind::LineComment);
        assert_eq!(out.comments[0].value, " note");
        assert_eq!(out.comments[1].kind, TokenKind::BlockComment);
        assert_eq!(out.comments[1].value, " block ");
        assert_eq!(out.tokens.len(), 6);
    }

    #[test]
    fn test_shebang() {
        let out = tokenize("#!/usr/bin/env node\nvar x;").unwrap();
        assert_eq!(out.comments.len(), 1);
        assert_eq!(out.comments[0].kind, TokenKind::Shebang);
        assert_eq!(out.comments[0].value, "/usr/bin/env node");
        assert_eq!(out.tokens[0].range.start, 20);
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds("'a' + \"b\"");
        assert_eq!(tokens[0], (TokenKind::String, "'a'".to_string()));
        assert_eq!(tokens[2], (TokenKind::String, "\"b\"".to_string()));
    }

    #[test]
    fn test_boolean_and_null() {
        let tokens = kinds("true false null undefined");
        assert_eq!(tokens[0].0, TokenKind::Boolean);
        assert_eq!(tokens[1].0, TokenKind::Boolean);
        assert_eq!(tokens[2].0, TokenKind::Null);
        assert_eq!(tokens[3].0, TokenKind::Identifier);
    }

    #[test]
    fn test_unterminated_string() {
        let error = tokenize("var x = 'oops").unwrap_err();
        assert!(error.message.contains("Unterminated string"));
        assert_eq!(error.offset, 8);
    }

    #[test]
    fn test_unterminated_block_comment() {
        assert!(tokenize("/* nope").is_err());
    }
}
