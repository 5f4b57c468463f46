//! Event emitter: listener lists keyed by selector string (or a reserved
//! code-path key), preserving registration order.
//!
//! Errors thrown by listeners abort dispatch and propagate annotated with
//! the offending rule id and the current line, so diagnostics identify the
//! faulting rule.

use std::collections::HashMap;

use ecma_ast::NodeId;
use ecma_source::SourceCode;

use crate::code_path::{PathEvent, PathEventKind};
use crate::context::RuleContext;
use crate::error::LinterError;
use crate::rule::{NodeHandler, PathHandler};

pub(crate) enum Handler {
    Node(NodeHandler),
    Path(PathHandler),
}

pub(crate) struct Listener {
    pub rule_index: usize,
    pub handler: Handler,
}

struct EventEntry {
    key: String,
    /// Subscription order of this key's first listener; used by the node
    /// event generator to break specificity ties deterministically.
    first_order: usize,
    listeners: Vec<Listener>,
}

/// Listener registry. Keys are raw selector strings or reserved code-path
/// event names; listeners per key fire in registration order.
#[derive(Default)]
pub(crate) struct EventEmitter {
    entries: Vec<EventEntry>,
    index: HashMap<String, usize>,
    order_counter: usize,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a listener under a key.
    pub fn on(&mut self, key: &str, rule_index: usize, handler: Handler) {
        let order = self.order_counter;
        self.order_counter += 1;
        match self.index.get(key) {
            Some(&entry_index) => {
                self.entries[entry_index]
                    .listeners
                    .push(Listener { rule_index, handler });
            }
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push(EventEntry {
                    key: key.to_string(),
                    first_order: order,
                    listeners: vec![Listener { rule_index, handler }],
                });
            }
        }
    }

    /// All keys with their first-subscription order, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|e| (e.key.as_str(), e.first_order))
    }

    /// The rule that first subscribed under `key`.
    pub fn first_rule_for_key(&self, key: &str) -> Option<usize> {
        self.index
            .get(key)
            .and_then(|&i| self.entries[i].listeners.first())
            .map(|l| l.rule_index)
    }

    /// Fire the node listeners registered under `key`.
    pub fn emit_node(
        &mut self,
        key: &str,
        contexts: &[RuleContext<'_>],
        node: NodeId,
        source: &SourceCode,
    ) -> Result<(), LinterError> {
        let Some(&entry_index) = self.index.get(key) else {
            return Ok(());
        };
        for listener in &mut self.entries[entry_index].listeners {
            if let Handler::Node(handler) = &mut listener.handler {
                let ctx = &contexts[listener.rule_index];
                handler(ctx, node).map_err(|source_err| LinterError::Rule {
                    rule_id: ctx.id().to_string(),
                    line: source.position(source.tree().range(node).start).line,
                    source: source_err,
                })?;
            }
        }
        Ok(())
    }

    /// Fire the code-path listeners registered for `kind`.
    pub fn emit_path(
        &mut self,
        kind: PathEventKind,
        contexts: &[RuleContext<'_>],
        event: &PathEvent<'_>,
        source: &SourceCode,
    ) -> Result<(), LinterError> {
        let key = kind.key();
        let Some(&entry_index) = self.index.get(key) else {
            return Ok(());
        };
        let node = event_node(event);
        for listener in &mut self.entries[entry_index].listeners {
            if let Handler::Path(handler) = &mut listener.handler {
                let ctx = &contexts[listener.rule_index];
                handler(ctx, event).map_err(|source_err| LinterError::Rule {
                    rule_id: ctx.id().to_string(),
                    line: source.position(source.tree().range(node).start).line,
                    source: source_err,
                })?;
            }
        }
        Ok(())
    }
}

const fn event_node(event: &PathEvent<'_>) -> NodeId {
    match event {
        PathEvent::Start { node, .. }
        | PathEvent::End { node, .. }
        | PathEvent::SegmentStart { node, .. }
        | PathEvent::SegmentEnd { node, .. }
        | PathEvent::SegmentLoop { node, .. } => *node,
    }
}
