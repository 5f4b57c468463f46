//! # Per-file source access
//!
//! The source-code object and the positional machinery behind it: the line
//! index mapping offsets to line/column positions, and the token store
//! answering positional queries over tokens and comments through composable
//! cursors.
//!
//! Everything in this crate is built once per file and dropped when the
//! lint pass ends.

pub mod line_index;
pub mod source;
pub mod token_store;

mod cursor;

pub use line_index::LineIndex;
pub use source::{ParserServices, SourceCode, VisitorKeyOverrides};
pub use token_store::{TokenQuery, TokenStore};
