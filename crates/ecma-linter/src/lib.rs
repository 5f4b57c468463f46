//! # Linting core
//!
//! The per-file linting engine: it consumes a parsed source-code object
//! (text, tokens, comments, AST, scopes) plus a rule configuration and
//! produces an ordered list of problems and, through `verify_and_fix`, a
//! rewritten source text.
//!
//! The pipeline: the rule runner traverses the AST once, feeding a
//! selector-indexed dispatcher wrapped by the code-path analyzer; rules
//! report through their contexts; reports are merged with parse- and
//! directive-level problems, filtered by the disable-directive applier,
//! and finally handed to the fix arbitrator.
//!
//! Parsing and scope analysis stay outside: any collaborator implementing
//! [`Parser`] plugs in via the language options.

pub mod code_path;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod directives;
pub mod error;
pub mod fixer;
pub mod linter;
pub mod registry;
pub mod rule;
pub mod rules;
pub mod selector;
pub mod suppress;
pub mod traverser;

mod emitter;
mod node_events;
mod runner;

pub use code_path::{CodePath, CodePathAnalyzer, CodePathSegment, PathEvent, PathEventKind, SegmentId};
pub use config::{
    EcmaVersion, GlobalValue, LanguageOptions, LintConfig, RuleEntry, Severity, SourceType,
};
pub use context::{Report, RuleContext, Suggest};
pub use diagnostics::{Fix, LintMessage, Suggestion, Suppression};
pub use error::{LinterError, RuleError};
pub use fixer::{apply_fixes, AppliedFixes, RuleFixer};
pub use linter::{
    CodeBlock, FixReport, FixSelect, Linter, ParseFailure, ParseResult, Parser, ParserOptions,
    Processor, SourceInput, VerifyOptions,
};
pub use registry::RuleRegistry;
pub use rule::{Fixable, Rule, RuleListener, RuleMeta, RuleType};
pub use selector::{CompiledSelector, SelectorParseError, Specificity};
pub use suppress::UnusedDirectivesMode;
