//! The rule runner: installs every configured rule's listeners, traverses
//! the AST once, and collects reports.
//!
//! Dispatch per node event follows the contract: code-path events wrap the
//! node events (`path-start → segment-start → enter … leave → segment-end →
//! path-end`), selectors fire most-specific first, registration order breaks
//! ties, and a listener error aborts the run annotated with its rule id.

use std::cell::RefCell;
use std::sync::Arc;

use ecma_ast::NodeId;
use ecma_source::SourceCode;

use crate::code_path::analyzer::PathSink;
use crate::code_path::{CodePathAnalyzer, PathEvent};
use crate::config::{ConfigOverlay, LintConfig, Severity};
use crate::context::RuleContext;
use crate::diagnostics::LintMessage;
use crate::emitter::{EventEmitter, Handler};
use crate::error::LinterError;
use crate::node_events::NodeEventGenerator;
use crate::registry::RuleRegistry;
use crate::rule::{Rule, RuleListener};
use crate::traverser::{traverse, Visitor, WalkControl};

/// Run every enabled rule over `source`. Returns the raw problems in
/// emission order (the directive applier sorts them later).
pub(crate) fn run_rules(
    source: &SourceCode,
    config: &LintConfig,
    overlay: &ConfigOverlay,
    registry: &RuleRegistry,
    filename: &str,
) -> Result<Vec<LintMessage>, LinterError> {
    let sink = RefCell::new(Vec::new());

    // Select enabled rules; unknown ids become synthetic problems.
    struct Selected {
        id: String,
        rule: Arc<dyn Rule>,
        severity: Severity,
        options: Vec<serde_json::Value>,
    }
    let mut selected: Vec<Selected> = Vec::new();
    for id in overlay.rule_ids(config) {
        let Some(entry) = overlay.effective(config, id) else {
            continue;
        };
        if !entry.severity.is_enabled() {
            continue;
        }
        let Some(rule) = registry.get(id) else {
            sink.borrow_mut().push(LintMessage::core(
                Severity::Error,
                RuleRegistry::unknown_rule_message(id),
                1,
                1,
            ));
            continue;
        };
        // Options arity against the declared schema.
        if let Some(serde_json::Value::Array(schema)) = &rule.meta().schema {
            if entry.options.len() > schema.len() {
                sink.borrow_mut().push(LintMessage::core(
                    Severity::Error,
                    format!(
                        "Configuration for rule \"{id}\" is invalid: expected at most {} option(s), got {}.",
                        schema.len(),
                        entry.options.len()
                    ),
                    1,
                    1,
                ));
                continue;
            }
        }
        selected.push(Selected {
            id: id.to_string(),
            rule,
            severity: entry.severity,
            options: entry.options.clone(),
        });
    }

    let contexts: Vec<RuleContext<'_>> = selected
        .iter()
        .map(|s| RuleContext {
            id: &s.id,
            severity: s.severity,
            options: &s.options,
            settings: &config.settings,
            language_options: &config.language_options,
            filename,
            source,
            meta: s.rule.meta(),
            sink: &sink,
        })
        .collect();

    // `create` runs exactly once per rule; listeners go to the emitter.
    let mut emitter = EventEmitter::new();
    for (index, s) in selected.iter().enumerate() {
        let listeners = s.rule.create(&contexts[index]).map_err(|source_err| {
            LinterError::Rule {
                rule_id: s.id.clone(),
                line: 1,
                source: source_err,
            }
        })?;
        for listener in listeners {
            match listener {
                RuleListener::Node { selector, handler } => {
                    emitter.on(&selector, index, Handler::Node(handler));
                }
                RuleListener::Path { event, handler } => {
                    emitter.on(event.key(), index, Handler::Path(handler));
                }
            }
        }
    }

    let generator = NodeEventGenerator::new(&emitter).map_err(|(key, error)| {
        let rule_id = emitter
            .first_rule_for_key(&key)
            .and_then(|index| selected.get(index))
            .map_or_else(String::new, |s| s.id.clone());
        LinterError::Rule {
            rule_id,
            line: 1,
            source: error.into(),
        }
    })?;

    let mut visitor = RunVisitor {
        source,
        contexts: &contexts,
        emitter,
        generator,
        analyzer: CodePathAnalyzer::new(),
        stack: Vec::new(),
    };
    traverse(source.tree(), source.visitor_key_overrides(), &mut visitor)?;

    drop(visitor);
    drop(contexts);
    Ok(sink.into_inner())
}

struct RunVisitor<'a, 'ctx> {
    source: &'a SourceCode,
    contexts: &'a [RuleContext<'ctx>],
    emitter: EventEmitter,
    generator: NodeEventGenerator,
    analyzer: CodePathAnalyzer,
    /// Root-first path to the current node.
    stack: Vec<NodeId>,
}

impl RunVisitor<'_, '_> {
    fn ancestors(&self) -> Vec<NodeId> {
        self.stack.iter().rev().copied().collect()
    }
}

struct PathAdapter<'x, 'a, 'ctx> {
    emitter: &'x mut EventEmitter,
    contexts: &'x [RuleContext<'ctx>],
    source: &'a SourceCode,
}

impl PathSink for PathAdapter<'_, '_, '_> {
    fn emit(&mut self, event: &PathEvent<'_>) -> Result<(), LinterError> {
        self.emitter
            .emit_path(event.kind(), self.contexts, event, self.source)
    }
}

impl Visitor<LinterError> for RunVisitor<'_, '_> {
    fn enter(
        &mut self,
        _control: &mut WalkControl,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<(), LinterError> {
        {
            let mut adapter = PathAdapter {
                emitter: &mut self.emitter,
                contexts: self.contexts,
                source: self.source,
            };
            self.analyzer
                .enter_node(self.source.tree(), node, parent, &mut adapter)?;
        }
        let ancestors = self.ancestors();
        self.generator.enter_node(
            &mut self.emitter,
            self.contexts,
            self.source,
            node,
            &ancestors,
        )?;
        self.stack.push(node);
        Ok(())
    }

    fn leave(
        &mut self,
        _control: &mut WalkControl,
        node: NodeId,
        _parent: Option<NodeId>,
    ) -> Result<(), LinterError> {
        self.stack.pop();
        let ancestors = self.ancestors();
        self.generator.leave_node(
            &mut self.emitter,
            self.contexts,
            self.source,
            node,
            &ancestors,
        )?;
        let mut adapter = PathAdapter {
            emitter: &mut self.emitter,
            contexts: self.contexts,
            source: self.source,
        };
        self.analyzer
            .leave_node(self.source.tree(), node, &mut adapter)?;
        Ok(())
    }
}
