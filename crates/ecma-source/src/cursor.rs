//! Cursors over the token and merged token∪comment streams.
//!
//! A cursor is a one-shot iterator with a `move_next`/`current` protocol.
//! Four base cursors walk a backing slice forward or backward between
//! precomputed index bounds; three decorators (filter, skip, limit) wrap any
//! cursor. Composition order is fixed at base → filter → skip → limit, so
//! the output is deterministic no matter what the predicate does.

use ecma_ast::Token;

/// One-shot iterator protocol over borrowed tokens.
///
/// `'a` is the lifetime of the backing store; the cursor object itself may
/// live shorter (it usually exists only for the duration of one query).
pub(crate) trait Cursor<'a> {
    /// Advance to the next item. Returns `false` once exhausted.
    fn move_next(&mut self) -> bool;

    /// The item the cursor currently rests on.
    fn current(&self) -> Option<&'a Token>;
}

/// Forward iteration over `tokens[next..end]`.
pub(crate) struct Forward<'a> {
    tokens: &'a [Token],
    next: usize,
    end: usize,
    current: Option<&'a Token>,
}

impl<'a> Forward<'a> {
    pub(crate) fn new(tokens: &'a [Token], begin: usize, end: usize) -> Self {
        Self {
            tokens,
            next: begin,
            end: end.min(tokens.len()),
            current: None,
        }
    }
}

impl<'a> Cursor<'a> for Forward<'a> {
    fn move_next(&mut self) -> bool {
        if self.next < self.end {
            self.current = Some(&self.tokens[self.next]);
            self.next += 1;
            true
        } else {
            self.current = None;
            false
        }
    }

    fn current(&self) -> Option<&'a Token> {
        self.current
    }
}

/// Backward iteration over `tokens[begin..next]`.
pub(crate) struct Backward<'a> {
    tokens: &'a [Token],
    begin: usize,
    next: usize,
    current: Option<&'a Token>,
}

impl<'a> Backward<'a> {
    pub(crate) fn new(tokens: &'a [Token], begin: usize, end: usize) -> Self {
        Self {
            tokens,
            begin,
            next: end.min(tokens.len()),
            current: None,
        }
    }
}

impl<'a> Cursor<'a> for Backward<'a> {
    fn move_next(&mut self) -> bool {
        if self.next > self.begin {
            self.next -= 1;
            self.current = Some(&self.tokens[self.next]);
            true
        } else {
            self.current = None;
            false
        }
    }

    fn current(&self) -> Option<&'a Token> {
        self.current
    }
}

/// Filter decorator: drops items failing the predicate.
pub(crate) struct Filter<'a, 'c> {
    inner: Box<dyn Cursor<'a> + 'c>,
    predicate: &'c dyn Fn(&Token) -> bool,
}

impl<'a, 'c> Filter<'a, 'c> {
    pub(crate) fn new(
        inner: Box<dyn Cursor<'a> + 'c>,
        predicate: &'c dyn Fn(&Token) -> bool,
    ) -> Self {
        Self { inner, predicate }
    }
}

impl<'a> Cursor<'a> for Filter<'a, '_> {
    fn move_next(&mut self) -> bool {
        while self.inner.move_next() {
            if self.inner.current().is_some_and(|t| (self.predicate)(t)) {
                return true;
            }
        }
        false
    }

    fn current(&self) -> Option<&'a Token> {
        self.inner.current()
    }
}

/// Skip decorator: discards the first `n` yielded items.
pub(crate) struct Skip<'a, 'c> {
    inner: Box<dyn Cursor<'a> + 'c>,
    remaining: usize,
}

impl<'a, 'c> Skip<'a, 'c> {
    pub(crate) fn new(inner: Box<dyn Cursor<'a> + 'c>, count: usize) -> Self {
        Self {
            inner,
            remaining: count,
        }
    }
}

impl<'a> Cursor<'a> for Skip<'a, '_> {
    fn move_next(&mut self) -> bool {
        while self.remaining > 0 {
            self.remaining -= 1;
            if !self.inner.move_next() {
                return false;
            }
        }
        self.inner.move_next()
    }

    fn current(&self) -> Option<&'a Token> {
        self.inner.current()
    }
}

/// Limit decorator: yields at most `n` items.
pub(crate) struct Limit<'a, 'c> {
    inner: Box<dyn Cursor<'a> + 'c>,
    remaining: usize,
    exhausted: bool,
}

impl<'a, 'c> Limit<'a, 'c> {
    pub(crate) fn new(inner: Box<dyn Cursor<'a> + 'c>, count: usize) -> Self {
        Self {
            inner,
            remaining: count,
            exhausted: false,
        }
    }
}

impl<'a> Cursor<'a> for Limit<'a, '_> {
    fn move_next(&mut self) -> bool {
        if self.remaining == 0 {
            self.exhausted = true;
            return false;
        }
        self.remaining -= 1;
        if self.inner.move_next() {
            true
        } else {
            self.exhausted = true;
            false
        }
    }

    fn current(&self) -> Option<&'a Token> {
        if self.exhausted {
            None
        } else {
            self.inner.current()
        }
    }
}

/// Apply the decorators in the fixed base → filter → skip → limit order.
pub(crate) fn decorate<'a: 'c, 'c>(
    base: Box<dyn Cursor<'a> + 'c>,
    filter: Option<&'c dyn Fn(&Token) -> bool>,
    skip: usize,
    count: Option<usize>,
) -> Box<dyn Cursor<'a> + 'c> {
    let mut cursor = base;
    if let Some(predicate) = filter {
        cursor = Box::new(Filter::new(cursor, predicate));
    }
    if skip > 0 {
        cursor = Box::new(Skip::new(cursor, skip));
    }
    if let Some(count) = count {
        cursor = Box::new(Limit::new(cursor, count));
    }
    cursor
}

/// Drain a cursor into a vector.
pub(crate) fn collect<'a>(mut cursor: Box<dyn Cursor<'a> + '_>) -> Vec<&'a Token> {
    let mut out = Vec::new();
    while cursor.move_next() {
        if let Some(token) = cursor.current() {
            out.push(token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::{TextRange, TokenKind};

    fn tokens() -> Vec<Token> {
        (0..5)
            .map(|i| {
                Token::new(
                    TokenKind::Identifier,
                    format!("t{i}"),
                    TextRange::new(i * 2, i * 2 + 1),
                )
            })
            .collect()
    }

    #[test]
    fn test_forward() {
        let tokens = tokens();
        let cursor = Forward::new(&tokens, 1, 4);
        let values: Vec<_> = collect(Box::new(cursor)).iter().map(|t| &t.value).collect();
        assert_eq!(values, ["t1", "t2", "t3"]);
    }

    #[test]
    fn test_backward() {
        let tokens = tokens();
        let cursor = Backward::new(&tokens, 1, 4);
        let values: Vec<_> = collect(Box::new(cursor)).iter().map(|t| &t.value).collect();
        assert_eq!(values, ["t3", "t2", "t1"]);
    }

    #[test]
    fn test_decoration_order() {
        let tokens = tokens();
        let predicate = |t: &Token| t.value != "t1";
        let cursor = decorate(
            Box::new(Forward::new(&tokens, 0, 5)),
            Some(&predicate),
            1,
            Some(2),
        );
        // filter drops t1, skip drops t0, limit keeps two: t2, t3
        let values: Vec<_> = collect(cursor).iter().map(|t| &t.value).collect();
        assert_eq!(values, ["t2", "t3"]);
    }

    #[test]
    fn test_limit_exhaustion() {
        let tokens = tokens();
        let mut cursor = Limit::new(Box::new(Forward::new(&tokens, 0, 5)), 1);
        assert!(cursor.move_next());
        assert!(!cursor.move_next());
        assert!(!cursor.move_next());
    }
}
