//! Positional queries over tokens and comments.
//!
//! The store materializes the merged token∪comment stream once at
//! construction, builds the location→index maps for the O(1) boundary fast
//! path, and answers every query by composing cursors (see [`crate::cursor`]).
//! Queries never mutate; out-of-range queries return `None` or an empty
//! vector, never an error.

use std::collections::HashMap;

use ecma_ast::{TextRange, Token};

use crate::cursor::{collect, decorate, Backward, Cursor, Forward};

/// Options accepted by every token query.
///
/// `count: None` means "all matching".
#[derive(Default, Clone, Copy)]
pub struct TokenQuery<'p> {
    /// Include comments in the stream being queried.
    pub include_comments: bool,
    /// Discard the first `skip` yielded items.
    pub skip: usize,
    /// Yield at most `count` items (multi-token queries only).
    pub count: Option<usize>,
    /// Drop items failing this predicate.
    pub filter: Option<&'p dyn Fn(&Token) -> bool>,
}

impl<'p> TokenQuery<'p> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Query over the merged token∪comment stream.
    #[must_use]
    pub fn with_comments() -> Self {
        Self {
            include_comments: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: &'p dyn Fn(&Token) -> bool) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// The token store: code tokens, comments, and the merged stream, each
/// sorted by `range.start` and non-overlapping.
#[derive(Debug)]
pub struct TokenStore {
    tokens: Vec<Token>,
    comments: Vec<Token>,
    merged: Vec<Token>,
    /// `range.start` → token index. Comment starts point at the following
    /// token, so hits must be re-checked against the queried bound.
    starts: HashMap<usize, usize>,
    /// `range.end` → token index + 1 (the count of tokens ending at or
    /// before that offset).
    ends: HashMap<usize, usize>,
}

impl TokenStore {
    /// Build the store. Both inputs must already be sorted by `range.start`;
    /// tokens and comments never overlap.
    #[must_use]
    pub fn new(tokens: Vec<Token>, comments: Vec<Token>) -> Self {
        let mut merged = Vec::with_capacity(tokens.len() + comments.len());
        let mut starts = HashMap::with_capacity(tokens.len() + comments.len());
        let mut ends = HashMap::with_capacity(tokens.len() + comments.len());

        let mut ti = 0;
        let mut ci = 0;
        let mut token_count = 0;
        while ti < tokens.len() || ci < comments.len() {
            let take_token = match (tokens.get(ti), comments.get(ci)) {
                (Some(t), Some(c)) => t.range.start < c.range.start,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if take_token {
                let token = &tokens[ti];
                starts.insert(token.range.start, token_count);
                ends.insert(token.range.end, token_count + 1);
                token_count += 1;
                merged.push(token.clone());
                ti += 1;
            } else {
                let comment = &comments[ci];
                // Comments map to the index of the token that follows them.
                starts.insert(comment.range.start, token_count);
                ends.insert(comment.range.end, token_count);
                merged.push(comment.clone());
                ci += 1;
            }
        }

        Self {
            tokens,
            comments,
            merged,
            starts,
            ends,
        }
    }

    /// All code tokens.
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// All comments.
    #[must_use]
    pub fn comments(&self) -> &[Token] {
        &self.comments
    }

    /// The merged token∪comment stream.
    #[must_use]
    pub fn merged(&self) -> &[Token] {
        &self.merged
    }

    fn stream(&self, include_comments: bool) -> &[Token] {
        if include_comments {
            &self.merged
        } else {
            &self.tokens
        }
    }

    /// Least index in `stream` whose token starts at or after `offset`.
    fn lower_bound(&self, include_comments: bool, offset: usize) -> usize {
        if !include_comments {
            if let Some(&index) = self.starts.get(&offset) {
                // Comment starts alias the following token; verify the bound.
                if self
                    .tokens
                    .get(index)
                    .is_none_or(|t| t.range.start >= offset)
                {
                    return index;
                }
            }
        }
        self.stream(include_comments)
            .partition_point(|t| t.range.start < offset)
    }

    /// Count of tokens in `stream` ending at or before `offset`.
    fn upper_bound(&self, include_comments: bool, offset: usize) -> usize {
        if !include_comments {
            if let Some(&index) = self.ends.get(&offset) {
                if index == 0 || self.tokens[index - 1].range.end <= offset {
                    return index;
                }
            }
        }
        self.stream(include_comments)
            .partition_point(|t| t.range.end <= offset)
    }

    fn forward<'a, 'c>(
        &'a self,
        include_comments: bool,
        begin: usize,
        end: usize,
        query: &TokenQuery<'c>,
        limited: bool,
    ) -> Box<dyn Cursor<'a> + 'c>
    where
        'a: 'c,
    {
        let base = Box::new(Forward::new(self.stream(include_comments), begin, end));
        decorate(
            base,
            query.filter,
            query.skip,
            if limited { query.count } else { None },
        )
    }

    fn backward<'a, 'c>(
        &'a self,
        include_comments: bool,
        begin: usize,
        end: usize,
        query: &TokenQuery<'c>,
        limited: bool,
    ) -> Box<dyn Cursor<'a> + 'c>
    where
        'a: 'c,
    {
        let base = Box::new(Backward::new(self.stream(include_comments), begin, end));
        decorate(
            base,
            query.filter,
            query.skip,
            if limited { query.count } else { None },
        )
    }

    fn first<'a>(mut cursor: Box<dyn Cursor<'a> + '_>) -> Option<&'a Token> {
        if cursor.move_next() {
            cursor.current()
        } else {
            None
        }
    }

    /// First token inside `range`.
    #[must_use]
    pub fn first_token(&self, range: TextRange, query: &TokenQuery<'_>) -> Option<&Token> {
        let begin = self.lower_bound(query.include_comments, range.start);
        let end = self.upper_bound(query.include_comments, range.end);
        Self::first(self.forward(query.include_comments, begin, end, query, false))
    }

    /// Last token inside `range`.
    #[must_use]
    pub fn last_token(&self, range: TextRange, query: &TokenQuery<'_>) -> Option<&Token> {
        let begin = self.lower_bound(query.include_comments, range.start);
        let end = self.upper_bound(query.include_comments, range.end);
        Self::first(self.backward(query.include_comments, begin, end, query, false))
    }

    /// Token immediately before `range`.
    #[must_use]
    pub fn token_before(&self, range: TextRange, query: &TokenQuery<'_>) -> Option<&Token> {
        let end = self.upper_bound(query.include_comments, range.start);
        Self::first(self.backward(query.include_comments, 0, end, query, false))
    }

    /// Token immediately after `range`.
    #[must_use]
    pub fn token_after(&self, range: TextRange, query: &TokenQuery<'_>) -> Option<&Token> {
        let begin = self.lower_bound(query.include_comments, range.end);
        let len = self.stream(query.include_comments).len();
        Self::first(self.forward(query.include_comments, begin, len, query, false))
    }

    /// The first `count` tokens inside `range`, in source order.
    #[must_use]
    pub fn first_tokens(&self, range: TextRange, query: &TokenQuery<'_>) -> Vec<&Token> {
        let begin = self.lower_bound(query.include_comments, range.start);
        let end = self.upper_bound(query.include_comments, range.end);
        collect(self.forward(query.include_comments, begin, end, query, true))
    }

    /// The last `count` tokens inside `range`, in source order.
    #[must_use]
    pub fn last_tokens(&self, range: TextRange, query: &TokenQuery<'_>) -> Vec<&Token> {
        let begin = self.lower_bound(query.include_comments, range.start);
        let end = self.upper_bound(query.include_comments, range.end);
        let mut out = collect(self.backward(query.include_comments, begin, end, query, true));
        out.reverse();
        out
    }

    /// All tokens inside `range` (both endpoints of every returned token lie
    /// within it).
    #[must_use]
    pub fn tokens_inside(&self, range: TextRange, query: &TokenQuery<'_>) -> Vec<&Token> {
        self.first_tokens(range, query)
    }

    /// Tokens strictly between two ranges.
    #[must_use]
    pub fn tokens_between(
        &self,
        left: TextRange,
        right: TextRange,
        query: &TokenQuery<'_>,
    ) -> Vec<&Token> {
        let begin = self.lower_bound(query.include_comments, left.end);
        let end = self.upper_bound(query.include_comments, right.start);
        collect(self.forward(query.include_comments, begin, end, query, true))
    }

    /// Up to `count` tokens before `range`, in source order.
    #[must_use]
    pub fn tokens_before(&self, range: TextRange, query: &TokenQuery<'_>) -> Vec<&Token> {
        let end = self.upper_bound(query.include_comments, range.start);
        let mut out = collect(self.backward(query.include_comments, 0, end, query, true));
        out.reverse();
        out
    }

    /// Up to `count` tokens after `range`, in source order.
    #[must_use]
    pub fn tokens_after(&self, range: TextRange, query: &TokenQuery<'_>) -> Vec<&Token> {
        let begin = self.lower_bound(query.include_comments, range.end);
        let len = self.stream(query.include_comments).len();
        collect(self.forward(query.include_comments, begin, len, query, true))
    }

    /// The token whose range starts exactly at `offset`, if any.
    #[must_use]
    pub fn token_by_range_start(&self, offset: usize, include_comments: bool) -> Option<&Token> {
        let stream = self.stream(include_comments);
        let index = stream.partition_point(|t| t.range.start < offset);
        stream.get(index).filter(|t| t.range.start == offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::TokenKind;

    // `var x = 1; /* note */ var y;`
    fn store() -> TokenStore {
        let tokens = vec![
            Token::new(TokenKind::Keyword, "var", TextRange::new(0, 3)),
            Token::new(TokenKind::Identifier, "x", TextRange::new(4, 5)),
            Token::new(TokenKind::Punctuator, "=", TextRange::new(6, 7)),
            Token::new(TokenKind::Numeric, "1", TextRange::new(8, 9)),
            Token::new(TokenKind::Punctuator, ";", TextRange::new(9, 10)),
            Token::new(TokenKind::Keyword, "var", TextRange::new(23, 26)),
            Token::new(TokenKind::Identifier, "y", TextRange::new(27, 28)),
            Token::new(TokenKind::Punctuator, ";", TextRange::new(28, 29)),
        ];
        let comments = vec![Token::new(
            TokenKind::BlockComment,
            " note ",
            TextRange::new(11, 22),
        )];
        TokenStore::new(tokens, comments)
    }

    #[test]
    fn test_merged_stream_is_sorted() {
        let store = store();
        assert_eq!(store.merged().len(), 9);
        let starts: Vec<_> = store.merged().iter().map(|t| t.range.start).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn test_first_and_last_token() {
        let store = store();
        let program = TextRange::new(0, 29);
        assert_eq!(
            store.first_token(program, &TokenQuery::new()).unwrap().value,
            "var"
        );
        assert_eq!(
            store.last_token(program, &TokenQuery::new()).unwrap().value,
            ";"
        );
        let second = store
            .first_token(program, &TokenQuery::new().skip(1))
            .unwrap();
        assert_eq!(second.value, "x");
    }

    #[test]
    fn test_token_before_after() {
        let store = store();
        let x = TextRange::new(4, 5);
        assert_eq!(store.token_before(x, &TokenQuery::new()).unwrap().value, "var");
        assert_eq!(store.token_after(x, &TokenQuery::new()).unwrap().value, "=");

        // With comments, the token after the first `;` is the block comment.
        let semi = TextRange::new(9, 10);
        let after = store.token_after(semi, &TokenQuery::with_comments()).unwrap();
        assert_eq!(after.kind, TokenKind::BlockComment);
        let after_no_comments = store.token_after(semi, &TokenQuery::new()).unwrap();
        assert_eq!(after_no_comments.value, "var");
    }

    #[test]
    fn test_before_after_round_trip() {
        // token_after(token_before(x)) == x for interior tokens.
        let store = store();
        for token in &store.tokens()[1..store.tokens().len() - 1] {
            let before = store.token_before(token.range, &TokenQuery::new()).unwrap();
            let again = store.token_after(before.range, &TokenQuery::new()).unwrap();
            assert_eq!(again, token);
        }
    }

    #[test]
    fn test_tokens_between() {
        let store = store();
        let x = TextRange::new(4, 5);
        let one = TextRange::new(8, 9);
        let between: Vec<_> = store
            .tokens_between(x, one, &TokenQuery::new())
            .iter()
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(between, ["="]);
    }

    #[test]
    fn test_tokens_inside_bounds() {
        let store = store();
        // Declaration `var y;` spans [23, 29).
        let decl = TextRange::new(23, 29);
        let inside: Vec<_> = store
            .tokens_inside(decl, &TokenQuery::new())
            .iter()
            .map(|t| t.value.clone())
            .collect();
        assert_eq!(inside, ["var", "y", ";"]);
    }

    #[test]
    fn test_filter_and_count() {
        let store = store();
        let program = TextRange::new(0, 29);
        let idents = |t: &Token| t.kind == TokenKind::Identifier;
        let found = store.first_tokens(program, &TokenQuery::new().filter(&idents));
        assert_eq!(found.len(), 2);
        let found = store.first_tokens(program, &TokenQuery::new().filter(&idents).count(1));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "x");
    }

    #[test]
    fn test_tokens_before_after_order() {
        let store = store();
        let eq = TextRange::new(6, 7);
        let before: Vec<_> = store
            .tokens_before(eq, &TokenQuery::new().count(2))
            .iter()
            .map(|t| t.value.clone())
            .collect();
        // Source order, nearest last.
        assert_eq!(before, ["var", "x"]);
    }

    #[test]
    fn test_out_of_range_is_none() {
        let store = store();
        let past_end = TextRange::new(100, 110);
        assert!(store.first_token(past_end, &TokenQuery::new()).is_none());
        assert!(store.token_after(past_end, &TokenQuery::new()).is_none());
        assert!(store
            .tokens_inside(past_end, &TokenQuery::new())
            .is_empty());
    }

    #[test]
    fn test_token_by_range_start() {
        let store = store();
        assert_eq!(
            store.token_by_range_start(4, false).unwrap().value,
            "x"
        );
        assert!(store.token_by_range_start(5, false).is_none());
        assert_eq!(
            store.token_by_range_start(11, true).unwrap().kind,
            TokenKind::BlockComment
        );
        assert!(store.token_by_range_start(11, false).is_none());
    }
}
