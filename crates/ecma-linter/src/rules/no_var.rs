//! `no-var`: require `let` or `const` instead of `var`.

use ecma_source::TokenQuery;

use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Fixable, Rule, RuleListener, RuleMeta, RuleType};

pub struct NoVar {
    meta: RuleMeta,
}

impl NoVar {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Suggestion)
                .description("require `let` or `const` instead of `var`")
                .recommended()
                .fixable(Fixable::Code)
                .message("unexpectedVar", "Unexpected var, use let or const instead."),
        }
    }
}

impl Default for NoVar {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoVar {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        Ok(vec![RuleListener::node(
            "VariableDeclaration[kind=var]",
            |ctx, node| {
                let range = ctx.tree().range(node);
                let keyword = ctx
                    .source()
                    .token_store()
                    .first_token(range, &TokenQuery::new())
                    .filter(|t| t.is_keyword("var"))
                    .map(|t| t.range);
                let mut report = Report::on(node).message_id("unexpectedVar");
                if let Some(keyword_range) = keyword {
                    report = report.fix(move |fixer| {
                        Some(fixer.replace_range(keyword_range, "let"))
                    });
                }
                ctx.report(report)
            },
        )])
    }
}
