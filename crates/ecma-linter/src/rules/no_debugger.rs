//! `no-debugger`: disallow `debugger` statements.

use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Fixable, Rule, RuleListener, RuleMeta, RuleType};

pub struct NoDebugger {
    meta: RuleMeta,
}

impl NoDebugger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Problem)
                .description("disallow the use of `debugger`")
                .recommended()
                .fixable(Fixable::Code)
                .message("unexpected", "Unexpected 'debugger' statement."),
        }
    }
}

impl Default for NoDebugger {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoDebugger {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        Ok(vec![RuleListener::node("DebuggerStatement", |ctx, node| {
            ctx.report(
                Report::on(node)
                    .message_id("unexpected")
                    .fix(move |fixer| Some(fixer.remove(node))),
            )
        })])
    }
}
