//! The per-rule context: everything a rule may read, plus `report`.

use std::cell::RefCell;

use ecma_ast::{
    NodeId, Position, ScopeId, ScopeManager, SourceLocation, SyntaxTree, TextRange, VariableId,
};
use ecma_source::{ParserServices, SourceCode};
use serde_json::Value;

use crate::config::{LanguageOptions, Severity};
use crate::diagnostics::{Fix, LintMessage, Suggestion};
use crate::error::RuleError;
use crate::fixer::RuleFixer;
use crate::rule::RuleMeta;

/// The context handed to a rule's `create` function and to every listener
/// invocation.
pub struct RuleContext<'a> {
    pub(crate) id: &'a str,
    pub(crate) severity: Severity,
    pub(crate) options: &'a [Value],
    pub(crate) settings: &'a serde_json::Map<String, Value>,
    pub(crate) language_options: &'a LanguageOptions,
    pub(crate) filename: &'a str,
    pub(crate) source: &'a SourceCode,
    pub(crate) meta: &'a RuleMeta,
    pub(crate) sink: &'a RefCell<Vec<LintMessage>>,
}

impl<'a> RuleContext<'a> {
    /// The rule's id in the configuration (`"no-var"`).
    #[must_use]
    pub fn id(&self) -> &str {
        self.id
    }

    /// The configured options, excluding the severity.
    #[must_use]
    pub fn options(&self) -> &[Value] {
        self.options
    }

    /// Shared settings, opaque to the core.
    #[must_use]
    pub fn settings(&self) -> &serde_json::Map<String, Value> {
        self.settings
    }

    #[must_use]
    pub fn language_options(&self) -> &LanguageOptions {
        self.language_options
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        self.filename
    }

    #[must_use]
    pub fn source(&self) -> &'a SourceCode {
        self.source
    }

    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.source.tree()
    }

    #[must_use]
    pub fn scopes(&self) -> &'a ScopeManager {
        self.source.scopes()
    }

    #[must_use]
    pub fn parser_services(&self) -> &'a ParserServices {
        self.source.parser_services()
    }

    /// Ancestors of `node`, nearest first.
    #[must_use]
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        self.tree().ancestors(node)
    }

    /// The innermost scope containing `node`.
    #[must_use]
    pub fn scope_for(&self, node: NodeId) -> ScopeId {
        self.source.scope_for(node)
    }

    /// Variables declared by `node` (its identifier descendants that are
    /// declaration sites).
    #[must_use]
    pub fn declared_variables(&self, node: NodeId) -> Vec<VariableId> {
        let range = self.tree().range(node);
        let scopes = self.scopes();
        scopes
            .variable_ids()
            .filter(|id| {
                scopes
                    .variable(*id)
                    .identifiers
                    .iter()
                    .any(|ident| range.contains_range(self.tree().range(*ident)))
            })
            .collect()
    }

    /// Mark `name` as used, walking the scope chain upward from the scope
    /// containing `node`. Returns `true` when a variable was found.
    pub fn mark_variable_as_used(&self, name: &str, node: NodeId) -> bool {
        let from = self.scope_for(node);
        match self.scopes().lookup(from, name) {
            Some(variable) => {
                self.scopes().variable(variable).mark_used();
                true
            }
            None => false,
        }
    }

    /// Report a problem. See [`Report`] for the descriptor builder.
    pub fn report(&self, report: Report<'_>) -> Result<(), RuleError> {
        let location = self.resolve_location(&report);
        let message_text = self.resolve_message(&report.message, &report.data)?;

        let fix = match report.fix {
            Some(build) => {
                let fixer = RuleFixer::new(self.source);
                match build(&fixer) {
                    Some(fix) => {
                        if self.meta.fixable.is_none() {
                            return Err(RuleError::NotFixable);
                        }
                        Some(fix)
                    }
                    None => None,
                }
            }
            None => None,
        };

        let mut suggestions = Vec::new();
        if !report.suggestions.is_empty() {
            if !self.meta.has_suggestions {
                return Err(RuleError::NoSuggestions);
            }
            for spec in report.suggestions {
                let fixer = RuleFixer::new(self.source);
                let Some(fix) = (spec.fix)(&fixer) else {
                    continue;
                };
                let desc = self.resolve_message(&spec.message, &spec.data)?;
                suggestions.push(Suggestion {
                    desc,
                    message_id: match spec.message {
                        MessageSpec::Id(id) => Some(id),
                        MessageSpec::Raw(_) => None,
                    },
                    fix,
                });
            }
        }

        self.sink.borrow_mut().push(LintMessage {
            rule_id: Some(self.id.to_string()),
            severity: self.severity,
            message: message_text,
            message_id: match report.message {
                MessageSpec::Id(id) => Some(id),
                MessageSpec::Raw(_) => None,
            },
            line: location.start.line,
            column: location.start.column + 1,
            end_line: Some(location.end.line),
            end_column: Some(location.end.column + 1),
            node_type: report
                .node
                .map(|node| self.tree().kind(node).as_str().to_string()),
            fix,
            suggestions,
            suppressions: Vec::new(),
            fatal: false,
        });
        Ok(())
    }

    fn resolve_location(&self, report: &Report<'_>) -> SourceLocation {
        if let Some(loc) = report.loc {
            return loc;
        }
        let range = report
            .range
            .or_else(|| report.node.map(|node| self.tree().range(node)))
            .unwrap_or(TextRange::at(0));
        self.source.location(range)
    }

    fn resolve_message(
        &self,
        spec: &MessageSpec,
        data: &[(String, String)],
    ) -> Result<String, RuleError> {
        let template = match spec {
            MessageSpec::Raw(text) => text.clone(),
            MessageSpec::Id(id) => self
                .meta
                .messages
                .get(id)
                .cloned()
                .ok_or_else(|| RuleError::UnknownMessageId(id.clone()))?,
        };
        Ok(interpolate(&template, data))
    }
}

/// Replace `{{name}}` placeholders. Unmatched placeholders stay literal.
fn interpolate(template: &str, data: &[(String, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in data {
        out = out.replace(&format!("{{{{{key}}}}}"), value);
        out = out.replace(&format!("{{{{ {key} }}}}"), value);
    }
    out
}

#[derive(Debug, Clone)]
pub(crate) enum MessageSpec {
    Raw(String),
    Id(String),
}

type FixBuilder<'r> = Box<dyn FnOnce(&RuleFixer<'_>) -> Option<Fix> + 'r>;

/// A suggestion attached to a report.
pub struct Suggest<'r> {
    message: MessageSpec,
    data: Vec<(String, String)>,
    fix: FixBuilder<'r>,
}

impl<'r> Suggest<'r> {
    /// Suggestion with a raw description.
    pub fn new(
        desc: &str,
        fix: impl FnOnce(&RuleFixer<'_>) -> Option<Fix> + 'r,
    ) -> Self {
        Self {
            message: MessageSpec::Raw(desc.to_string()),
            data: Vec::new(),
            fix: Box::new(fix),
        }
    }

    /// Suggestion described by a message id from the rule's meta.
    pub fn with_message_id(
        id: &str,
        fix: impl FnOnce(&RuleFixer<'_>) -> Option<Fix> + 'r,
    ) -> Self {
        Self {
            message: MessageSpec::Id(id.to_string()),
            data: Vec::new(),
            fix: Box::new(fix),
        }
    }

    #[must_use]
    pub fn data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.push((key.to_string(), value.into()));
        self
    }
}

/// Report descriptor builder.
///
/// ```ignore
/// ctx.report(
///     Report::on(node)
///         .message_id("unexpectedVar")
///         .fix(|fixer| Some(fixer.replace_range(kw_range, "let"))),
/// )?;
/// ```
pub struct Report<'r> {
    node: Option<NodeId>,
    range: Option<TextRange>,
    loc: Option<SourceLocation>,
    message: MessageSpec,
    data: Vec<(String, String)>,
    fix: Option<FixBuilder<'r>>,
    suggestions: Vec<Suggest<'r>>,
}

impl<'r> Report<'r> {
    /// Report on a node; location and node type come from it.
    #[must_use]
    pub fn on(node: NodeId) -> Self {
        Self {
            node: Some(node),
            range: None,
            loc: None,
            message: MessageSpec::Raw(String::new()),
            data: Vec::new(),
            fix: None,
            suggestions: Vec::new(),
        }
    }

    /// Report on a bare text range.
    #[must_use]
    pub fn on_range(range: TextRange) -> Self {
        Self {
            node: None,
            range: Some(range),
            loc: None,
            message: MessageSpec::Raw(String::new()),
            data: Vec::new(),
            fix: None,
            suggestions: Vec::new(),
        }
    }

    /// Override the reported location.
    #[must_use]
    pub fn at(mut self, start: Position, end: Position) -> Self {
        self.loc = Some(SourceLocation::new(start, end));
        self
    }

    #[must_use]
    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.message = MessageSpec::Raw(text.into());
        self
    }

    #[must_use]
    pub fn message_id(mut self, id: &str) -> Self {
        self.message = MessageSpec::Id(id.to_string());
        self
    }

    #[must_use]
    pub fn data(mut self, key: &str, value: impl Into<String>) -> Self {
        self.data.push((key.to_string(), value.into()));
        self
    }

    /// Attach a lazily built fix.
    #[must_use]
    pub fn fix(mut self, build: impl FnOnce(&RuleFixer<'_>) -> Option<Fix> + 'r) -> Self {
        self.fix = Some(Box::new(build));
        self
    }

    #[must_use]
    pub fn suggest(mut self, suggestion: Suggest<'r>) -> Self {
        self.suggestions.push(suggestion);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation() {
        let data = vec![("name".to_string(), "x".to_string())];
        assert_eq!(
            interpolate("'{{name}}' is defined but never used.", &data),
            "'x' is defined but never used."
        );
        assert_eq!(
            interpolate("'{{ name }}' here", &data),
            "'x' here"
        );
        assert_eq!(
            interpolate("{{missing}} stays literal", &data),
            "{{missing}} stays literal"
        );
    }
}
