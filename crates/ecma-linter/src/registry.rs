//! Rule lookup: built-in rules, dynamically defined rules, and the
//! replacement table for removed rule ids.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::rule::Rule;
use crate::rules::builtin_rules;

static BUILTIN: LazyLock<HashMap<&'static str, Arc<dyn Rule>>> =
    LazyLock::new(|| builtin_rules().into_iter().collect());

/// Removed rule ids and their successors.
const REPLACEMENTS: &[(&str, &[&str])] = &[
    ("no-arrow-condition", &["no-confusing-arrow", "no-constant-condition"]),
    ("no-comma-dangle", &["comma-dangle"]),
    ("no-empty-class", &["no-empty-character-class"]),
    ("no-reserved-keys", &["quote-props"]),
    ("space-after-function-name", &["space-before-function-paren"]),
];

/// ID → rule lookup. Dynamically defined rules shadow built-ins.
#[derive(Default)]
pub struct RuleRegistry {
    dynamic: HashMap<String, Arc<dyn Rule>>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or replace) a rule at runtime.
    pub fn define(&mut self, id: &str, rule: Arc<dyn Rule>) {
        self.dynamic.insert(id.to_string(), rule);
    }

    /// Resolve a rule id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Rule>> {
        self.dynamic
            .get(id)
            .cloned()
            .or_else(|| BUILTIN.get(id).cloned())
    }

    #[must_use]
    pub fn is_known(&self, id: &str) -> bool {
        self.dynamic.contains_key(id) || BUILTIN.contains_key(id)
    }

    /// Successors of a removed rule id.
    #[must_use]
    pub fn replacements(id: &str) -> Option<&'static [&'static str]> {
        REPLACEMENTS
            .iter()
            .find(|(removed, _)| *removed == id)
            .map(|(_, replacements)| *replacements)
    }

    /// The message for a rule id that could not be resolved.
    #[must_use]
    pub fn unknown_rule_message(id: &str) -> String {
        match Self::replacements(id) {
            Some(replacements) => format!(
                "Rule \"{id}\" was removed and replaced by: {}",
                replacements.join(", ")
            ),
            None => format!("Definition for rule '{id}' was not found."),
        }
    }

    /// All built-in rule ids, sorted.
    #[must_use]
    pub fn builtin_ids() -> Vec<&'static str> {
        let mut ids: Vec<_> = BUILTIN.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RuleContext;
    use crate::error::RuleError;
    use crate::rule::{RuleListener, RuleMeta, RuleType};

    struct Noop {
        meta: RuleMeta,
    }

    impl Rule for Noop {
        fn meta(&self) -> &RuleMeta {
            &self.meta
        }
        fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_builtin_lookup() {
        let registry = RuleRegistry::new();
        assert!(registry.get("no-var").is_some());
        assert!(registry.get("does-not-exist").is_none());
    }

    #[test]
    fn test_builtin_ids_sorted_and_unique() {
        let ids = RuleRegistry::builtin_ids();
        assert!(ids.contains(&"no-var"));
        assert!(ids.contains(&"no-unreachable"));
        let mut dedup = ids.clone();
        dedup.dedup();
        assert_eq!(ids, dedup);
    }

    #[test]
    fn test_dynamic_rule_shadows_builtin() {
        let mut registry = RuleRegistry::new();
        let noop = Arc::new(Noop {
            meta: RuleMeta::new(RuleType::Problem),
        });
        registry.define("no-var", noop);
        let resolved = registry.get("no-var").unwrap();
        assert!(resolved.meta().messages.is_empty(), "shadowed by the no-op");
    }

    #[test]
    fn test_replacement_message() {
        let message = RuleRegistry::unknown_rule_message("no-comma-dangle");
        assert!(message.contains("was removed"));
        assert!(message.contains("comma-dangle"));

        let message = RuleRegistry::unknown_rule_message("totally-unknown");
        assert!(message.contains("was not found"));
    }
}
