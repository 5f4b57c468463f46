//! `no-undef`: disallow references to undeclared variables.
//!
//! Runs entirely on the scope model: every reference that resolved to no
//! variable (after config and directive globals were merged into the global
//! scope) is reported.

use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Rule, RuleListener, RuleMeta, RuleType};

pub struct NoUndef {
    meta: RuleMeta,
}

impl NoUndef {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Problem)
                .description("disallow the use of undeclared variables")
                .recommended()
                .message("undef", "'{{name}}' is not defined."),
        }
    }
}

impl Default for NoUndef {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoUndef {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        Ok(vec![RuleListener::node("Program:exit", |ctx, _node| {
            for reference in ctx.scopes().unresolved() {
                ctx.report(
                    Report::on(reference.identifier)
                        .message_id("undef")
                        .data("name", reference.name.clone()),
                )?;
            }
            Ok(())
        })])
    }
}
