//! # Shared data model
//!
//! Types shared by the parser collaborator, the source-code object, and the
//! linting core: byte ranges and line/column positions, tokens (comments are
//! tokens too), the arena-backed syntax tree with per-kind visitor keys, and
//! the read-only scope model produced by scope analysis.
//!
//! Everything here lives for exactly one lint pass of one file. The tree and
//! the scope manager are dropped together with the source-code object that
//! owns them.

pub mod node;
pub mod scope;
pub mod span;
pub mod token;
pub mod visitor_keys;

pub use node::{
    Child, ChildSlot, NodeData, NodeId, NodeKind, PropValue, SyntaxTree, SyntaxTreeBuilder,
};
pub use scope::{
    Reference, ReferenceId, Scope, ScopeId, ScopeKind, ScopeManager, Variable, VariableId,
};
pub use span::{Position, SourceLocation, TextRange};
pub use token::{Token, TokenKind};
pub use visitor_keys::visitor_keys;
