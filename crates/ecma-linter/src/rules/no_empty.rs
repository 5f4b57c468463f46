//! `no-empty`: disallow empty block statements.
//!
//! Blocks that contain comments are not empty, and function bodies are out
//! of scope for this rule. The `allowEmptyCatch` option tolerates an empty
//! `catch` block.

use ecma_ast::NodeKind;
use serde::Deserialize;

use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Rule, RuleListener, RuleMeta, RuleType};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Options {
    allow_empty_catch: bool,
}

pub struct NoEmpty {
    meta: RuleMeta,
}

impl NoEmpty {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Suggestion)
                .description("disallow empty block statements")
                .recommended()
                .message("unexpected", "Empty {{type}} statement.")
                .schema(serde_json::json!([
                    {
                        "type": "object",
                        "properties": { "allowEmptyCatch": { "type": "boolean" } },
                        "additionalProperties": false
                    }
                ])),
        }
    }
}

impl Default for NoEmpty {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoEmpty {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        let options: Options = ctx
            .options()
            .first()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        Ok(vec![RuleListener::node("BlockStatement", move |ctx, node| {
            if !ctx.tree().list(node, "body").is_empty() {
                return Ok(());
            }
            let parent_kind = ctx.tree().parent(node).map(|p| ctx.tree().kind(p));
            // Function bodies may legitimately be empty.
            if parent_kind.is_some_and(NodeKind::is_function) {
                return Ok(());
            }
            if options.allow_empty_catch && parent_kind == Some(NodeKind::CatchClause) {
                return Ok(());
            }
            // A comment inside the braces counts as content.
            if !ctx.source().comments_inside(node).is_empty() {
                return Ok(());
            }
            ctx.report(
                Report::on(node)
                    .message_id("unexpected")
                    .data("type", "block"),
            )
        })])
    }
}
