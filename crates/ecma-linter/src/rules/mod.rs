//! Built-in rules.
//!
//! These exercise every capability of the runner: plain node selectors,
//! token-store queries, scope access, code-path reachability, fixes, and
//! suggestions.

pub mod no_debugger;
pub mod no_empty;
pub mod no_undef;
pub mod no_unreachable;
pub mod no_unused_vars;
pub mod no_var;
pub mod prefer_const;
pub mod semi;

use std::sync::Arc;

use crate::rule::Rule;

/// The built-in rule set, in id order.
pub(crate) fn builtin_rules() -> Vec<(&'static str, Arc<dyn Rule>)> {
    vec![
        ("no-debugger", Arc::new(no_debugger::NoDebugger::new()) as Arc<dyn Rule>),
        ("no-empty", Arc::new(no_empty::NoEmpty::new())),
        ("no-undef", Arc::new(no_undef::NoUndef::new())),
        ("no-unreachable", Arc::new(no_unreachable::NoUnreachable::new())),
        ("no-unused-vars", Arc::new(no_unused_vars::NoUnusedVars::new())),
        ("no-var", Arc::new(no_var::NoVar::new())),
        ("prefer-const", Arc::new(prefer_const::PreferConst::new())),
        ("semi", Arc::new(semi::Semi::new())),
    ]
}
