//! The stable problem shape returned by a lint run, plus fixes and
//! suggestions.

use ecma_ast::TextRange;
use serde::{Deserialize, Serialize};

use crate::config::Severity;

/// A textual edit: replace `text[range.start..range.end]` with `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    pub range: TextRange,
    pub text: String,
}

impl Fix {
    #[must_use]
    pub fn new(range: TextRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }

    /// A deletion edit.
    #[must_use]
    pub fn delete(range: TextRange) -> Self {
        Self::new(range, "")
    }

    /// An insertion edit at a single offset.
    #[must_use]
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(TextRange::at(offset), text)
    }
}

/// An advisory fix a user must pick explicitly; never auto-applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    pub fix: Fix,
}

/// Why a suppressed problem was suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Currently always `"directive"`.
    pub kind: String,
    pub justification: String,
}

/// One reported problem — the stable output shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintMessage {
    /// `None` for parse errors and other core-generated problems.
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// 1-based line of the problem start.
    pub line: u32,
    /// 1-based column of the problem start.
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<Fix>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<Suggestion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressions: Vec<Suppression>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl LintMessage {
    /// A fatal parse-error problem. The lint returns only this.
    #[must_use]
    pub fn fatal(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            rule_id: None,
            severity: Severity::Error,
            message: message.into(),
            message_id: None,
            line,
            column,
            end_line: None,
            end_column: None,
            node_type: None,
            fix: None,
            suggestions: Vec::new(),
            suppressions: Vec::new(),
            fatal: true,
        }
    }

    /// A non-fatal core-generated problem (configuration or directive
    /// misuse, unknown rule).
    #[must_use]
    pub fn core(severity: Severity, message: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            rule_id: None,
            severity,
            message: message.into(),
            message_id: None,
            line,
            column,
            end_line: None,
            end_column: None,
            node_type: None,
            fix: None,
            suggestions: Vec::new(),
            suppressions: Vec::new(),
            fatal: false,
        }
    }

    /// Whether this problem is currently suppressed by a directive.
    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        !self.suppressions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_serialization_shape() {
        let message = LintMessage {
            rule_id: Some("no-var".to_string()),
            severity: Severity::Error,
            message: "Unexpected var, use let or const instead.".to_string(),
            message_id: Some("unexpectedVar".to_string()),
            line: 1,
            column: 1,
            end_line: Some(1),
            end_column: Some(11),
            node_type: Some("VariableDeclaration".to_string()),
            fix: Some(Fix::new(TextRange::new(0, 3), "let")),
            suggestions: Vec::new(),
            suppressions: Vec::new(),
            fatal: false,
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["ruleId"], "no-var");
        assert_eq!(json["severity"], 2);
        assert_eq!(json["endColumn"], 11);
        assert_eq!(json["fix"]["range"][0], 0);
        assert_eq!(json["fix"]["range"][1], 3);
        assert!(json.get("fatal").is_none(), "false fatal is omitted");
        assert!(json.get("suggestions").is_none(), "empty list omitted");
    }

    #[test]
    fn test_fatal_constructor() {
        let message = LintMessage::fatal("Unexpected end of input", 1, 8);
        assert!(message.fatal);
        assert_eq!(message.severity, Severity::Error);
        assert_eq!(message.rule_id, None);
    }
}
