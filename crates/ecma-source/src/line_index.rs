//! Line index for a file: the bidirectional map between byte offsets and
//! line/column positions.
//!
//! The line-start table is built in a single pass recognizing LF, CR, CRLF,
//! U+2028 (LINE SEPARATOR), and U+2029 (PARAGRAPH SEPARATOR) as terminators.
//! Lines are 1-based, columns 0-based byte offsets within the line.

use ecma_ast::Position;

/// Byte offset of the start of each line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    text_len: usize,
}

impl LineIndex {
    /// Create a new line index from source text.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut iter = text.char_indices().peekable();

        while let Some((i, c)) = iter.next() {
            match c {
                '\n' | '\u{2028}' | '\u{2029}' => line_starts.push(i + c.len_utf8()),
                '\r' => {
                    // CRLF counts as a single terminator.
                    if iter.peek().is_some_and(|&(_, next)| next == '\n') {
                        iter.next();
                        line_starts.push(i + 2);
                    } else {
                        line_starts.push(i + 1);
                    }
                }
                _ => {}
            }
        }

        Self {
            line_starts,
            text_len: bytes.len(),
        }
    }

    /// Convert a byte offset to a position. Offsets past the end of the
    /// text clamp to the final position.
    #[must_use]
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text_len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let column = offset - self.line_starts[line];
        Position::new(u32::try_from(line + 1).unwrap_or(u32::MAX), column as u32)
    }

    /// Convert a position back to a byte offset. Returns `None` when the
    /// line does not exist or the column runs past the end of the text.
    #[must_use]
    pub fn offset(&self, position: Position) -> Option<usize> {
        if position.line == 0 {
            return None;
        }
        let line = position.line as usize - 1;
        let start = *self.line_starts.get(line)?;
        let offset = start + position.column as usize;
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text_len + 1);
        if offset < line_end && offset <= self.text_len {
            Some(offset)
        } else {
            None
        }
    }

    /// Byte offset of the start of a 1-based line.
    #[must_use]
    pub fn line_start(&self, line: u32) -> Option<usize> {
        if line == 0 {
            return None;
        }
        self.line_starts.get(line as usize - 1).copied()
    }

    /// Number of lines (at least 1, even for empty text).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Length of the indexed text in bytes.
    #[must_use]
    pub const fn text_len(&self) -> usize {
        self.text_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_positions() {
        let index = LineIndex::new("line 1\nline 2\nline 3");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.position(0), Position::new(1, 0));
        assert_eq!(index.position(5), Position::new(1, 5));
        assert_eq!(index.position(7), Position::new(2, 0));
        assert_eq!(index.position(10), Position::new(2, 3));
        assert_eq!(index.position(14), Position::new(3, 0));
    }

    #[test]
    fn test_crlf_is_one_terminator() {
        let index = LineIndex::new("a\r\nb\rc\nd");
        assert_eq!(index.line_count(), 4);
        assert_eq!(index.position(3), Position::new(2, 0));
        assert_eq!(index.position(5), Position::new(3, 0));
        assert_eq!(index.position(7), Position::new(4, 0));
    }

    #[test]
    fn test_unicode_separators() {
        let text = "a\u{2028}b\u{2029}c";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 3);
        // U+2028 is 3 bytes long.
        assert_eq!(index.position(4), Position::new(2, 0));
        assert_eq!(index.position(8), Position::new(3, 0));
    }

    #[test]
    fn test_round_trip() {
        let text = "var x = 1;\nlet y = 2;\r\nz();\n";
        let index = LineIndex::new(text);
        for offset in 0..=text.len() {
            let position = index.position(offset);
            assert_eq!(
                index.offset(position),
                Some(offset),
                "round trip failed at offset {offset}"
            );
        }
    }

    #[test]
    fn test_out_of_bounds() {
        let index = LineIndex::new("ab\ncd");
        assert_eq!(index.offset(Position::new(3, 0)), None);
        assert_eq!(index.offset(Position::new(1, 99)), None);
        assert_eq!(index.offset(Position::new(0, 0)), None);
        // End-of-text position is valid.
        assert_eq!(index.offset(Position::new(2, 2)), Some(5));
    }

    #[test]
    fn test_empty_text() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.position(0), Position::new(1, 0));
        assert_eq!(index.offset(Position::new(1, 0)), Some(0));
    }
}
