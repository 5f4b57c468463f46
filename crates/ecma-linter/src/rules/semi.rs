//! `semi`: require or disallow statement-terminating semicolons.

use ecma_ast::NodeKind;
use ecma_source::TokenQuery;

use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Fixable, Rule, RuleListener, RuleMeta, RuleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Mode {
    #[default]
    Always,
    Never,
}

pub struct Semi {
    meta: RuleMeta,
}

impl Semi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Layout)
                .description("require or disallow semicolons instead of ASI")
                .fixable(Fixable::Code)
                .message("missingSemi", "Missing semicolon.")
                .message("extraSemi", "Extra semicolon.")
                .schema(serde_json::json!([{ "enum": ["always", "never"] }])),
        }
    }
}

impl Default for Semi {
    fn default() -> Self {
        Self::new()
    }
}

const TERMINATED: &str = "ExpressionStatement, VariableDeclaration, ReturnStatement, \
     ThrowStatement, BreakStatement, ContinueStatement, DebuggerStatement, DoWhileStatement";

impl Rule for Semi {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        let mode = match ctx.options().first().and_then(|v| v.as_str()) {
            Some("never") => Mode::Never,
            _ => Mode::Always,
        };

        Ok(vec![RuleListener::node(TERMINATED, move |ctx, node| {
            // Declarations in a `for` head are not statements of their own.
            if ctx.tree().kind(node) == NodeKind::VariableDeclaration {
                let parent_kind = ctx.tree().parent(node).map(|p| ctx.tree().kind(p));
                if matches!(
                    parent_kind,
                    Some(
                        NodeKind::ForStatement
                            | NodeKind::ForInStatement
                            | NodeKind::ForOfStatement
                    )
                ) {
                    return Ok(());
                }
            }

            let range = ctx.tree().range(node);
            let last = ctx
                .source()
                .token_store()
                .last_token(range, &TokenQuery::new());
            let Some(last) = last else {
                return Ok(());
            };
            let has_semi = last.is_punct(";");
            let last_range = last.range;

            match mode {
                Mode::Always if !has_semi => {
                    let end = ctx.source().position(last_range.end);
                    ctx.report(
                        Report::on(node)
                            .at(end, end)
                            .message_id("missingSemi")
                            .fix(move |fixer| {
                                Some(fixer.insert_after_range(last_range, ";"))
                            }),
                    )
                }
                Mode::Never if has_semi => ctx.report(
                    Report::on_range(last_range)
                        .message_id("extraSemi")
                        .fix(move |fixer| Some(fixer.remove_range(last_range))),
                ),
                _ => Ok(()),
            }
        })])
    }
}
