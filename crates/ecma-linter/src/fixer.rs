//! Fix construction and conflict-free application.
//!
//! [`RuleFixer`] is the edit-constructor object handed to a rule's lazy fix
//! closure. [`apply_fixes`] is the arbitrator: it selects a maximal
//! non-conflicting subset of the candidate fixes (touching endpoints do not
//! conflict) and splices them into the source in one ascending pass.

use ecma_ast::{NodeId, TextRange};
use ecma_source::SourceCode;

use crate::diagnostics::{Fix, LintMessage};

/// Edit constructors for rule fixes and suggestions.
pub struct RuleFixer<'a> {
    source: &'a SourceCode,
}

impl<'a> RuleFixer<'a> {
    pub(crate) fn new(source: &'a SourceCode) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn source(&self) -> &'a SourceCode {
        self.source
    }

    /// Replace a byte range.
    #[must_use]
    pub fn replace_range(&self, range: TextRange, text: impl Into<String>) -> Fix {
        Fix::new(range, text)
    }

    /// Replace a node's whole text.
    #[must_use]
    pub fn replace(&self, node: NodeId, text: impl Into<String>) -> Fix {
        Fix::new(self.source.tree().range(node), text)
    }

    /// Remove a node's whole text.
    #[must_use]
    pub fn remove(&self, node: NodeId) -> Fix {
        Fix::delete(self.source.tree().range(node))
    }

    #[must_use]
    pub fn remove_range(&self, range: TextRange) -> Fix {
        Fix::delete(range)
    }

    /// Insert text directly before a node.
    #[must_use]
    pub fn insert_before(&self, node: NodeId, text: impl Into<String>) -> Fix {
        Fix::insert(self.source.tree().range(node).start, text)
    }

    /// Insert text directly after a node.
    #[must_use]
    pub fn insert_after(&self, node: NodeId, text: impl Into<String>) -> Fix {
        Fix::insert(self.source.tree().range(node).end, text)
    }

    /// Insert text directly after a byte range.
    #[must_use]
    pub fn insert_after_range(&self, range: TextRange, text: impl Into<String>) -> Fix {
        Fix::insert(range.end, text)
    }
}

/// Result of one arbitration pass.
#[derive(Debug)]
pub struct AppliedFixes {
    /// Whether at least one fix was applied.
    pub fixed: bool,
    /// The rewritten source text.
    pub output: String,
    /// Problems whose fixes were not applied (including all problems that
    /// had no fix). The rest are considered resolved.
    pub remaining: Vec<LintMessage>,
}

/// Apply a maximal non-conflicting subset of the messages' fixes to `text`.
///
/// Candidates are ordered by `(range.start, range.end)`; a fix is accepted
/// when it starts at or after the last accepted end. Messages without a fix
/// always survive into `remaining`, preserving their relative order.
#[must_use]
pub fn apply_fixes(text: &str, messages: Vec<LintMessage>) -> AppliedFixes {
    // Indices of fixable messages, in application order.
    let mut candidates: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.fix.is_some())
        .map(|(i, _)| i)
        .collect();
    candidates.sort_by_key(|&i| {
        let range = messages[i].fix.as_ref().map_or(TextRange::at(0), |f| f.range);
        (range.start, range.end)
    });

    let mut accepted = vec![false; messages.len()];
    let mut last_end: Option<usize> = None;
    for &index in &candidates {
        let Some(fix) = &messages[index].fix else {
            continue;
        };
        if fix.range.start > fix.range.end || fix.range.end > text.len() {
            tracing::warn!(
                start = fix.range.start,
                end = fix.range.end,
                len = text.len(),
                "skipping fix with out-of-bounds range"
            );
            continue;
        }
        if last_end.is_none_or(|end| fix.range.start >= end) {
            accepted[index] = true;
            last_end = Some(fix.range.end);
        }
    }

    if !accepted.iter().any(|&a| a) {
        return AppliedFixes {
            fixed: false,
            output: text.to_string(),
            remaining: messages,
        };
    }

    // Splice accepted fixes in ascending range order.
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;
    for &index in &candidates {
        if !accepted[index] {
            continue;
        }
        let Some(fix) = &messages[index].fix else {
            continue;
        };
        output.push_str(&text[cursor..fix.range.start]);
        output.push_str(&fix.text);
        cursor = fix.range.end;
    }
    output.push_str(&text[cursor..]);

    let remaining = messages
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !accepted[*i])
        .map(|(_, m)| m)
        .collect();

    AppliedFixes {
        fixed: true,
        output,
        remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Severity;

    fn message(start: usize, end: usize, text: &str) -> LintMessage {
        let mut m = LintMessage::core(Severity::Error, "test", 1, 1);
        m.fix = Some(Fix::new(TextRange::new(start, end), text));
        m
    }

    #[test]
    fn test_applies_disjoint_fixes() {
        let result = apply_fixes(
            "var x=1;\nvar y=2;\n",
            vec![message(0, 3, "let"), message(9, 12, "let")],
        );
        assert!(result.fixed);
        assert_eq!(result.output, "let x=1;\nlet y=2;\n");
        assert!(result.remaining.is_empty());
    }

    #[test]
    fn test_conflicting_fix_survives() {
        // Both rewrite [0, 5): only the first (by range order) is applied.
        let result = apply_fixes("aaaaab", vec![message(0, 5, "x"), message(0, 5, "y")]);
        assert!(result.fixed);
        assert_eq!(result.output, "xb");
        assert_eq!(result.remaining.len(), 1);
    }

    #[test]
    fn test_touching_endpoints_do_not_conflict() {
        let result = apply_fixes("abcd", vec![message(0, 2, "X"), message(2, 4, "Y")]);
        assert!(result.fixed);
        assert_eq!(result.output, "XY");
        assert!(result.remaining.is_empty());
    }

    #[test]
    fn test_unfixable_messages_survive() {
        let plain = LintMessage::core(Severity::Warn, "no fix", 1, 1);
        let result = apply_fixes("abc", vec![plain.clone(), message(0, 1, "z")]);
        assert!(result.fixed);
        assert_eq!(result.output, "zbc");
        assert_eq!(result.remaining, vec![plain]);
    }

    #[test]
    fn test_out_of_bounds_fix_skipped() {
        let result = apply_fixes("ab", vec![message(0, 10, "nope")]);
        assert!(!result.fixed);
        assert_eq!(result.output, "ab");
        assert_eq!(result.remaining.len(), 1);
    }

    #[test]
    fn test_no_fixes() {
        let plain = LintMessage::core(Severity::Warn, "plain", 1, 1);
        let result = apply_fixes("ab", vec![plain]);
        assert!(!result.fixed);
        assert_eq!(result.output, "ab");
    }
}
