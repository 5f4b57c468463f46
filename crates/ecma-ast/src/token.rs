//! Tokens and comments.
//!
//! Comments are represented as tokens whose kind is one of the comment
//! kinds, so the token store can expose a single merged, range-sorted
//! stream of both. The `value` of a comment excludes its delimiters.

use crate::span::TextRange;

/// Lexical kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Boolean,
    Identifier,
    Keyword,
    Null,
    Numeric,
    Punctuator,
    String,
    Template,
    RegularExpression,
    /// `// …` comment; `value` is the text after `//`.
    LineComment,
    /// `/* … */` comment; `value` is the text between the delimiters.
    BlockComment,
    /// `#!…` on the first line; `value` is the text after `#!`.
    Shebang,
}

impl TokenKind {
    /// Returns `true` for the comment kinds (line, block, shebang).
    #[must_use]
    pub const fn is_comment(self) -> bool {
        matches!(self, Self::LineComment | Self::BlockComment | Self::Shebang)
    }
}

/// A single token or comment with its source range.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub range: TextRange,
}

impl Token {
    #[must_use]
    pub fn new(kind: TokenKind, value: impl Into<String>, range: TextRange) -> Self {
        Self {
            kind,
            value: value.into(),
            range,
        }
    }

    /// Returns `true` for comment tokens.
    #[must_use]
    pub const fn is_comment(&self) -> bool {
        self.kind.is_comment()
    }

    /// Returns `true` if this is a punctuator with the given spelling.
    #[must_use]
    pub fn is_punct(&self, value: &str) -> bool {
        self.kind == TokenKind::Punctuator && self.value == value
    }

    /// Returns `true` if this is a keyword with the given spelling.
    #[must_use]
    pub fn is_keyword(&self, value: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_kinds() {
        assert!(TokenKind::LineComment.is_comment());
        assert!(TokenKind::BlockComment.is_comment());
        assert!(TokenKind::Shebang.is_comment());
        assert!(!TokenKind::Punctuator.is_comment());
    }

    #[test]
    fn test_punct_match() {
        let token = Token::new(TokenKind::Punctuator, ";", TextRange::new(3, 4));
        assert!(token.is_punct(";"));
        assert!(!token.is_punct(","));
        assert!(!token.is_keyword(";"));
    }
}
