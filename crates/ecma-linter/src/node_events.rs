//! Node event generator: compiles the emitter's selector keys once and
//! translates enter/leave AST events into selector events.
//!
//! On each event the matching selectors fire most-specific first, with
//! specificity ties broken by subscription order.

use ecma_ast::NodeId;
use ecma_source::SourceCode;

use crate::code_path::PathEventKind;
use crate::context::RuleContext;
use crate::emitter::EventEmitter;
use crate::error::LinterError;
use crate::selector::{CompiledSelector, SelectorParseError};

struct SelectorEntry {
    key: String,
    selector: CompiledSelector,
    order: usize,
}

/// Compiled selectors grouped by enter/exit intent.
pub(crate) struct NodeEventGenerator {
    enter: Vec<SelectorEntry>,
    exit: Vec<SelectorEntry>,
}

impl NodeEventGenerator {
    /// Compile every non-reserved key of the emitter. A compile failure is
    /// returned with the offending key so the runner can attribute it to a
    /// rule.
    pub fn new(emitter: &EventEmitter) -> Result<Self, (String, SelectorParseError)> {
        let mut enter = Vec::new();
        let mut exit = Vec::new();
        for (key, order) in emitter.keys() {
            if PathEventKind::from_key(key).is_some() {
                continue;
            }
            let selector = CompiledSelector::compile(key)
                .map_err(|error| (key.to_string(), error))?;
            let entry = SelectorEntry {
                key: key.to_string(),
                selector,
                order,
            };
            if entry.selector.is_exit() {
                exit.push(entry);
            } else {
                enter.push(entry);
            }
        }
        // Most specific first; ties by subscription order.
        let by_specificity = |a: &SelectorEntry, b: &SelectorEntry| {
            b.selector
                .specificity()
                .cmp(&a.selector.specificity())
                .then(a.order.cmp(&b.order))
        };
        enter.sort_by(by_specificity);
        exit.sort_by(by_specificity);
        Ok(Self { enter, exit })
    }

    pub fn enter_node(
        &self,
        emitter: &mut EventEmitter,
        contexts: &[RuleContext<'_>],
        source: &SourceCode,
        node: NodeId,
        ancestors: &[NodeId],
    ) -> Result<(), LinterError> {
        Self::apply(&self.enter, emitter, contexts, source, node, ancestors)
    }

    pub fn leave_node(
        &self,
        emitter: &mut EventEmitter,
        contexts: &[RuleContext<'_>],
        source: &SourceCode,
        node: NodeId,
        ancestors: &[NodeId],
    ) -> Result<(), LinterError> {
        Self::apply(&self.exit, emitter, contexts, source, node, ancestors)
    }

    fn apply(
        entries: &[SelectorEntry],
        emitter: &mut EventEmitter,
        contexts: &[RuleContext<'_>],
        source: &SourceCode,
        node: NodeId,
        ancestors: &[NodeId],
    ) -> Result<(), LinterError> {
        for entry in entries {
            if entry.selector.matches(source.tree(), node, ancestors) {
                emitter.emit_node(&entry.key, contexts, node, source)?;
            }
        }
        Ok(())
    }
}
