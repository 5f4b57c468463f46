//! Error types of the linting core.
//!
//! Directive and configuration mistakes never surface here: they become
//! non-fatal problems in the output. These types cover the failures the
//! caller must handle — a rule blowing up at runtime, or input that cannot
//! be linted at all.

use thiserror::Error;

/// Failure raised by a rule: either a `create`/listener error or a misuse
/// of the reporting contract.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("unknown message id \"{0}\" (not present in meta.messages)")]
    UnknownMessageId(String),

    #[error("rule produced a fix but its meta does not declare `fixable`")]
    NotFixable,

    #[error("rule produced suggestions but its meta does not declare `has_suggestions`")]
    NoSuggestions,

    #[error("invalid selector: {0}")]
    BadSelector(#[from] crate::selector::SelectorParseError),

    #[error("{0}")]
    Other(String),
}

/// Failure of a whole lint run.
#[derive(Debug, Error)]
pub enum LinterError {
    /// A rule threw. Intentionally fatal for the run: the caller decides how
    /// to surface internal failures.
    #[error("rule \"{rule_id}\" errored at line {line}: {source}")]
    Rule {
        rule_id: String,
        line: u32,
        #[source]
        source: RuleError,
    },

    #[error("invalid source-code object: {0}")]
    InvalidSource(String),

    #[error("raw-text input requires `language_options.parser`")]
    MissingParser,
}
