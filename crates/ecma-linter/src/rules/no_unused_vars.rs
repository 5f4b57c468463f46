//! `no-unused-vars`: disallow variables that are declared and never read.
//!
//! A variable counts as used when it has a read reference, was flagged via
//! `mark_variable_as_used`, or appears in an `exported` directive. Function
//! parameters are not reported.

use ecma_ast::{NodeKind, Variable};

use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Rule, RuleListener, RuleMeta, RuleType};

pub struct NoUnusedVars {
    meta: RuleMeta,
}

impl NoUnusedVars {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Problem)
                .description("disallow unused variables")
                .recommended()
                .message("unusedVar", "'{{name}}' is defined but never used."),
        }
    }
}

impl Default for NoUnusedVars {
    fn default() -> Self {
        Self::new()
    }
}

fn is_used(ctx: &RuleContext<'_>, variable: &Variable) -> bool {
    if variable.is_marked_used() || variable.is_exported() {
        return true;
    }
    variable
        .references
        .iter()
        .any(|r| ctx.scopes().reference(*r).read)
}

fn is_parameter(ctx: &RuleContext<'_>, variable: &Variable) -> bool {
    variable.identifiers.iter().any(|&ident| {
        ctx.tree().parent(ident).is_some_and(|parent| {
            ctx.tree().kind(parent).is_function()
                && ctx.tree().child(parent, "id") != Some(ident)
        })
    })
}

impl Rule for NoUnusedVars {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        Ok(vec![RuleListener::node("Program:exit", |ctx, _node| {
            for id in ctx.scopes().variable_ids() {
                let variable = ctx.scopes().variable(id);
                // Globals from config or environments have no identifiers.
                let Some(&ident) = variable.identifiers.first() else {
                    continue;
                };
                if is_used(ctx, variable) || is_parameter(ctx, variable) {
                    continue;
                }
                // A function expression's own name is visible only inside
                // itself; skip the self-binding.
                if ctx.tree().parent(ident).is_some_and(|p| {
                    ctx.tree().kind(p) == NodeKind::FunctionExpression
                }) {
                    continue;
                }
                ctx.report(
                    Report::on(ident)
                        .message_id("unusedVar")
                        .data("name", variable.name.clone()),
                )?;
            }
            Ok(())
        })])
    }
}
