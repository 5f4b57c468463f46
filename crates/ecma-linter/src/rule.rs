//! The rule contract: metadata plus a `create` function returning
//! selector-keyed listeners.

use std::collections::HashMap;

use ecma_ast::NodeId;
use serde_json::Value;

use crate::code_path::{PathEvent, PathEventKind};
use crate::context::RuleContext;
use crate::error::RuleError;

/// What a rule is about, mirrored in its documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    /// Code that is wrong or will error at runtime.
    Problem,
    /// Something that could be done better.
    Suggestion,
    /// Formatting concerns only.
    Layout,
}

/// What a rule's fixes may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixable {
    Code,
    Whitespace,
}

#[derive(Debug, Clone, Default)]
pub struct RuleDocs {
    pub description: String,
    pub recommended: bool,
    pub url: Option<String>,
}

/// Static metadata of a rule.
#[derive(Debug, Clone)]
pub struct RuleMeta {
    pub rule_type: RuleType,
    pub docs: RuleDocs,
    /// `None` means the rule must not produce fixes.
    pub fixable: Option<Fixable>,
    /// Whether the rule may attach suggestions to its reports.
    pub has_suggestions: bool,
    /// Message templates, keyed by message id.
    pub messages: HashMap<String, String>,
    /// JSON schema of the rule's options array. Only the arity is enforced.
    pub schema: Option<Value>,
    pub deprecated: bool,
    pub replaced_by: Vec<String>,
}

impl RuleMeta {
    #[must_use]
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            docs: RuleDocs::default(),
            fixable: None,
            has_suggestions: false,
            messages: HashMap::new(),
            schema: None,
            deprecated: false,
            replaced_by: Vec::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.docs.description = description.to_string();
        self
    }

    #[must_use]
    pub fn recommended(mut self) -> Self {
        self.docs.recommended = true;
        self
    }

    #[must_use]
    pub fn url(mut self, url: &str) -> Self {
        self.docs.url = Some(url.to_string());
        self
    }

    #[must_use]
    pub fn fixable(mut self, fixable: Fixable) -> Self {
        self.fixable = Some(fixable);
        self
    }

    #[must_use]
    pub fn with_suggestions(mut self) -> Self {
        self.has_suggestions = true;
        self
    }

    #[must_use]
    pub fn message(mut self, id: &str, template: &str) -> Self {
        self.messages.insert(id.to_string(), template.to_string());
        self
    }

    #[must_use]
    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn deprecated(mut self, replaced_by: &[&str]) -> Self {
        self.deprecated = true;
        self.replaced_by = replaced_by.iter().map(ToString::to_string).collect();
        self
    }
}

/// Handler for node events. Receives the context and the matched node.
pub type NodeHandler = Box<dyn FnMut(&RuleContext<'_>, NodeId) -> Result<(), RuleError>>;

/// Handler for synthetic code-path events.
pub type PathHandler = Box<dyn FnMut(&RuleContext<'_>, &PathEvent<'_>) -> Result<(), RuleError>>;

/// One subscription returned by `Rule::create`.
pub enum RuleListener {
    Node {
        selector: String,
        handler: NodeHandler,
    },
    Path {
        event: PathEventKind,
        handler: PathHandler,
    },
}

impl RuleListener {
    /// Subscribe to a selector (`"VariableDeclaration"`, `"Identifier:exit"`, …).
    pub fn node(
        selector: &str,
        handler: impl FnMut(&RuleContext<'_>, NodeId) -> Result<(), RuleError> + 'static,
    ) -> Self {
        Self::Node {
            selector: selector.to_string(),
            handler: Box::new(handler),
        }
    }

    /// Subscribe to one of the code-path events.
    pub fn path(
        event: PathEventKind,
        handler: impl FnMut(&RuleContext<'_>, &PathEvent<'_>) -> Result<(), RuleError> + 'static,
    ) -> Self {
        Self::Path {
            event,
            handler: Box::new(handler),
        }
    }
}

impl std::fmt::Debug for RuleListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node { selector, .. } => f.debug_struct("Node").field("selector", selector).finish(),
            Self::Path { event, .. } => f.debug_struct("Path").field("event", event).finish(),
        }
    }
}

/// A lint rule.
///
/// `create` is invoked exactly once per lint run with the rule's context; it
/// returns the listener subscriptions. Per-run rule state lives in the
/// listener closures (shared through `Rc<RefCell<…>>` when several listeners
/// need it).
pub trait Rule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    fn create(&self, ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_builder() {
        let meta = RuleMeta::new(RuleType::Suggestion)
            .description("disallow var")
            .recommended()
            .fixable(Fixable::Code)
            .message("unexpectedVar", "Unexpected var, use let or const instead.");
        assert_eq!(meta.docs.description, "disallow var");
        assert!(meta.docs.recommended);
        assert_eq!(meta.fixable, Some(Fixable::Code));
        assert!(meta.messages.contains_key("unexpectedVar"));
        assert!(!meta.has_suggestions);
    }

    #[test]
    fn test_deprecated_meta() {
        let meta = RuleMeta::new(RuleType::Problem).deprecated(&["no-var"]);
        assert!(meta.deprecated);
        assert_eq!(meta.replaced_by, vec!["no-var"]);
    }
}
