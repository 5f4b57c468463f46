//! `prefer-const`: suggest `const` for `let` bindings that are never
//! reassigned.
//!
//! Advisory only: the change is offered as a suggestion, never applied by
//! `--fix`.

use ecma_ast::NodeKind;
use ecma_source::TokenQuery;

use crate::context::{Report, RuleContext, Suggest};
use crate::error::RuleError;
use crate::rule::{Rule, RuleListener, RuleMeta, RuleType};

pub struct PreferConst {
    meta: RuleMeta,
}

impl PreferConst {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Suggestion)
                .description("require `const` for bindings that are never reassigned")
                .with_suggestions()
                .message(
                    "useConst",
                    "'{{name}}' is never reassigned. Use 'const' instead.",
                )
                .message("suggestConst", "Change 'let' to 'const'."),
        }
    }
}

impl Default for PreferConst {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for PreferConst {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        Ok(vec![RuleListener::node(
            "VariableDeclaration[kind=let]",
            |ctx, node| {
                let declarators = ctx.tree().list(node, "declarations");
                let mut names = Vec::new();
                for declarator in &declarators {
                    // Only simple `let x = init` bindings qualify.
                    if ctx.tree().child(*declarator, "init").is_none() {
                        return Ok(());
                    }
                    let Some(id) = ctx.tree().child(*declarator, "id") else {
                        return Ok(());
                    };
                    if ctx.tree().kind(id) != NodeKind::Identifier {
                        return Ok(());
                    }
                    let scope = ctx.scope_for(*declarator);
                    let Some(name) = ctx.tree().prop(id, "name").and_then(|p| p.as_str()) else {
                        return Ok(());
                    };
                    let Some(variable) = ctx.scopes().lookup(scope, name) else {
                        return Ok(());
                    };
                    let reassigned = ctx
                        .scopes()
                        .variable(variable)
                        .references
                        .iter()
                        .any(|r| ctx.scopes().reference(*r).write);
                    if reassigned {
                        return Ok(());
                    }
                    names.push(name.to_string());
                }
                if names.is_empty() {
                    return Ok(());
                }

                let keyword = ctx
                    .source()
                    .token_store()
                    .first_token(ctx.tree().range(node), &TokenQuery::new())
                    .filter(|t| t.is_keyword("let"))
                    .map(|t| t.range);

                let mut report = Report::on(node)
                    .message_id("useConst")
                    .data("name", names.join("', '"));
                if let Some(keyword_range) = keyword {
                    report = report.suggest(Suggest::with_message_id("suggestConst", move |fixer| {
                        Some(fixer.replace_range(keyword_range, "const"))
                    }));
                }
                ctx.report(report)
            },
        )])
    }
}
