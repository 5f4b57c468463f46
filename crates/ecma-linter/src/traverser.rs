//! Depth-first AST traversal.
//!
//! Calls `enter` before descending into a node's children and `leave` after.
//! Children are visited in declared visitor-key order; kinds missing from
//! the key table (or overridden by the parser) fall back to enumerating the
//! node's own child slots. Absent children are silently skipped.
//!
//! The visitor controls descent through [`WalkControl`]: `skip()` suppresses
//! descent into the current node, `stop()` aborts the whole walk. Installing
//! parent back-links is the traverser's only mutation of the tree.

use ecma_ast::{visitor_keys, NodeId, SyntaxTree};
use ecma_source::VisitorKeyOverrides;

/// Handle the visitor uses to steer the walk.
#[derive(Debug, Default)]
pub struct WalkControl {
    skip: bool,
    stopped: bool,
}

impl WalkControl {
    /// Do not descend into the current node's children.
    pub fn skip(&mut self) {
        self.skip = true;
    }

    /// Abort the entire walk. No further `enter` or `leave` calls occur.
    pub fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Walk callbacks. Both receive the current node and its parent.
pub trait Visitor<E> {
    fn enter(
        &mut self,
        control: &mut WalkControl,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<(), E>;

    fn leave(
        &mut self,
        control: &mut WalkControl,
        node: NodeId,
        parent: Option<NodeId>,
    ) -> Result<(), E>;
}

/// Traverse `tree` depth-first from the root.
pub fn traverse<E>(
    tree: &SyntaxTree,
    overrides: Option<&VisitorKeyOverrides>,
    visitor: &mut dyn Visitor<E>,
) -> Result<(), E> {
    let mut control = WalkControl::default();
    walk(tree, overrides, tree.root(), None, visitor, &mut control)?;
    Ok(())
}

fn walk<E>(
    tree: &SyntaxTree,
    overrides: Option<&VisitorKeyOverrides>,
    node: NodeId,
    parent: Option<NodeId>,
    visitor: &mut dyn Visitor<E>,
    control: &mut WalkControl,
) -> Result<(), E> {
    if let Some(parent) = parent {
        tree.set_parent(node, parent);
    }

    control.skip = false;
    visitor.enter(control, node, parent)?;
    if control.stopped {
        return Ok(());
    }

    if !control.skip {
        for child in children_in_visit_order(tree, overrides, node) {
            walk(tree, overrides, child, Some(node), visitor, control)?;
            if control.stopped {
                return Ok(());
            }
        }
    }

    visitor.leave(control, node, parent)?;
    Ok(())
}

/// The children of `node` in visiting order: declared visitor keys when the
/// kind is known, otherwise the node's own child slots.
fn children_in_visit_order(
    tree: &SyntaxTree,
    overrides: Option<&VisitorKeyOverrides>,
    node: NodeId,
) -> Vec<NodeId> {
    let kind = tree.kind(node);

    if let Some(keys) = overrides.and_then(|map| map.get(kind.as_str())) {
        let mut out = Vec::new();
        for key in keys {
            collect_slot(tree, node, key, &mut out);
        }
        return out;
    }

    if let Some(keys) = visitor_keys(kind) {
        let mut out = Vec::new();
        for key in keys {
            collect_slot(tree, node, key, &mut out);
        }
        return out;
    }

    tree.child_ids(node).collect()
}

fn collect_slot(tree: &SyntaxTree, node: NodeId, key: &str, out: &mut Vec<NodeId>) {
    match tree.get(node).slot(key) {
        Some(ecma_ast::Child::Node(Some(child))) => out.push(*child),
        Some(ecma_ast::Child::List(children)) => out.extend(children.iter().flatten()),
        _ => {}
    }
}
