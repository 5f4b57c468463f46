//! Builds code paths alongside the AST walk and emits the synthetic events.
//!
//! The runner calls [`CodePathAnalyzer::enter_node`] before a node's enter
//! event and [`CodePathAnalyzer::leave_node`] after its leave event, which
//! yields the documented interleaving: path-start → segment-start →
//! node-enter … node-leave → segment-end → path-end.
//!
//! Forks happen when entering a branch child (an `if` consequent, a logical
//! right operand, a loop body, a switch case, a catch handler); joins happen
//! when leaving the owning construct. `return`/`throw` terminate the current
//! segment into the path's final segments; `break`/`continue` route through
//! the enclosing loop or switch context. A segment created with no reachable
//! predecessors is unreachable, which is what reachability rules consume.

use ecma_ast::{NodeId, NodeKind, SyntaxTree};

use crate::code_path::{CodePath, CodePathOrigin, PathEvent, SegmentId};
use crate::error::LinterError;

/// Receiver for synthetic code-path events.
pub(crate) trait PathSink {
    fn emit(&mut self, event: &PathEvent<'_>) -> Result<(), LinterError>;
}

/// Per-construct bookkeeping, pushed when the construct is entered.
#[derive(Debug)]
enum Context {
    Branch {
        /// Segments at the end of the test (fork origin).
        after_test: Vec<SegmentId>,
        /// Ends of branches already walked.
        branch_ends: Vec<SegmentId>,
    },
    Logical {
        /// Segments at the end of the left operand (the short-circuit path).
        after_left: Vec<SegmentId>,
    },
    Loop {
        /// The loop's join segment (continue target and back-edge target).
        entry: Vec<SegmentId>,
        /// Segments that exit the loop when the test fails.
        after_test: Vec<SegmentId>,
        /// Segments ended by `break`.
        broken: Vec<SegmentId>,
    },
    Switch {
        after_discriminant: Vec<SegmentId>,
        seen_case: bool,
        has_default: bool,
        broken: Vec<SegmentId>,
    },
    Try {
        /// Segments at the start of the `try` block (the handler fork
        /// origin: any point in the block may throw).
        block_start: Vec<SegmentId>,
        /// Normal completions waiting to be joined.
        exits: Vec<SegmentId>,
        has_finalizer: bool,
    },
}

#[derive(Debug)]
struct PathState {
    path: CodePath,
    current: Vec<SegmentId>,
    contexts: Vec<Context>,
}

/// The analyzer itself. One instance per lint run.
#[derive(Debug, Default)]
pub struct CodePathAnalyzer {
    stack: Vec<PathState>,
    finished: Vec<CodePath>,
    counter: usize,
}

impl CodePathAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Code paths that have already been closed, in completion order.
    #[must_use]
    pub fn finished_paths(&self) -> &[CodePath] {
        &self.finished
    }

    pub(crate) fn enter_node(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        parent: Option<NodeId>,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        if let Some(parent) = parent {
            self.preprocess(tree, node, parent, sink)?;
        }

        let kind = tree.kind(node);
        if kind == NodeKind::Program || kind.is_function() {
            self.start_path(tree, node, sink)?;
        } else if let Some(state) = self.stack.last_mut() {
            match kind {
                NodeKind::IfStatement | NodeKind::ConditionalExpression => {
                    state.contexts.push(Context::Branch {
                        after_test: Vec::new(),
                        branch_ends: Vec::new(),
                    });
                }
                NodeKind::LogicalExpression => {
                    state.contexts.push(Context::Logical {
                        after_left: Vec::new(),
                    });
                }
                NodeKind::WhileStatement
                | NodeKind::DoWhileStatement
                | NodeKind::ForStatement
                | NodeKind::ForInStatement
                | NodeKind::ForOfStatement => {
                    state.contexts.push(Context::Loop {
                        entry: Vec::new(),
                        after_test: Vec::new(),
                        broken: Vec::new(),
                    });
                }
                NodeKind::SwitchStatement => {
                    let has_default = tree
                        .list(node, "cases")
                        .iter()
                        .any(|case| tree.child(*case, "test").is_none());
                    state.contexts.push(Context::Switch {
                        after_discriminant: Vec::new(),
                        seen_case: false,
                        has_default,
                        broken: Vec::new(),
                    });
                }
                NodeKind::TryStatement => {
                    let block_start = state.current.clone();
                    let has_finalizer = tree.child(node, "finalizer").is_some();
                    state.contexts.push(Context::Try {
                        block_start,
                        exits: Vec::new(),
                        has_finalizer,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    pub(crate) fn leave_node(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let kind = tree.kind(node);
        if kind == NodeKind::Program || kind.is_function() {
            return self.end_path(node, sink);
        }

        let Some(state) = self.stack.last_mut() else {
            return Ok(());
        };

        match kind {
            NodeKind::IfStatement | NodeKind::ConditionalExpression => {
                if let Some(Context::Branch {
                    after_test,
                    mut branch_ends,
                }) = state.contexts.pop()
                {
                    branch_ends.extend(state.current.iter().copied());
                    // `if` without `else` can fall through the test.
                    if kind == NodeKind::IfStatement && tree.child(node, "alternate").is_none() {
                        branch_ends.extend(after_test);
                    }
                    Self::join(state, branch_ends, node, sink)?;
                }
            }
            NodeKind::LogicalExpression => {
                if let Some(Context::Logical { after_left }) = state.contexts.pop() {
                    let mut preds = after_left;
                    preds.extend(state.current.iter().copied());
                    Self::join(state, preds, node, sink)?;
                }
            }
            NodeKind::WhileStatement
            | NodeKind::DoWhileStatement
            | NodeKind::ForStatement
            | NodeKind::ForInStatement
            | NodeKind::ForOfStatement => {
                if let Some(Context::Loop {
                    entry,
                    mut after_test,
                    broken,
                }) = state.contexts.pop()
                {
                    // The back edge from the end of the loop to its entry.
                    if let Some(&to) = entry.first() {
                        for &from in &state.current {
                            sink.emit(&PathEvent::SegmentLoop {
                                path: &state.path,
                                from,
                                to,
                                node,
                            })?;
                        }
                    }
                    if kind == NodeKind::DoWhileStatement {
                        // `do … while (test)` exits from the end of the test.
                        after_test = state.current.clone();
                    }
                    let mut preds = after_test;
                    preds.extend(broken);
                    Self::join(state, preds, node, sink)?;
                }
            }
            NodeKind::SwitchStatement => {
                if let Some(Context::Switch {
                    after_discriminant,
                    seen_case,
                    has_default,
                    broken,
                }) = state.contexts.pop()
                {
                    let mut preds = state.current.clone();
                    if seen_case && !has_default {
                        // No matching case falls past the switch.
                        preds.extend(after_discriminant);
                    }
                    preds.extend(broken);
                    Self::join(state, preds, node, sink)?;
                }
            }
            NodeKind::TryStatement => {
                if let Some(Context::Try {
                    exits,
                    has_finalizer,
                    ..
                }) = state.contexts.pop()
                {
                    if !has_finalizer {
                        // Join the handler end with the block's normal exit.
                        let mut preds = state.current.clone();
                        preds.extend(exits);
                        Self::join(state, preds, node, sink)?;
                    }
                }
            }
            NodeKind::ReturnStatement => {
                let returned = state.current.clone();
                state.path.returned_segments.extend(returned);
                Self::cut_current(state, node, sink)?;
            }
            NodeKind::ThrowStatement => {
                let thrown = state.current.clone();
                state.path.thrown_segments.extend(thrown);
                Self::cut_current(state, node, sink)?;
            }
            NodeKind::BreakStatement => {
                let current = state.current.clone();
                for context in state.contexts.iter_mut().rev() {
                    match context {
                        Context::Loop { broken, .. } | Context::Switch { broken, .. } => {
                            broken.extend(current.iter().copied());
                            break;
                        }
                        _ => {}
                    }
                }
                Self::cut_current(state, node, sink)?;
            }
            NodeKind::ContinueStatement => {
                let mut target = None;
                for context in state.contexts.iter().rev() {
                    if let Context::Loop { entry, .. } = context {
                        target = entry.first().copied();
                        break;
                    }
                }
                if let Some(to) = target {
                    for &from in &state.current {
                        sink.emit(&PathEvent::SegmentLoop {
                            path: &state.path,
                            from,
                            to,
                            node,
                        })?;
                    }
                }
                Self::cut_current(state, node, sink)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Fork and join decisions taken when a branch child is entered,
    /// keyed by the parent construct and the child's slot.
    fn preprocess(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        parent: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let Some(state) = self.stack.last_mut() else {
            return Ok(());
        };
        let Some(slot) = slot_key(tree, parent, node) else {
            return Ok(());
        };

        match tree.kind(parent) {
            NodeKind::IfStatement | NodeKind::ConditionalExpression => match slot {
                "consequent" => {
                    let after_test = state.current.clone();
                    if let Some(Context::Branch {
                        after_test: saved, ..
                    }) = state.contexts.last_mut()
                    {
                        *saved = after_test.clone();
                    }
                    Self::fork(state, after_test, node, sink)?;
                }
                "alternate" => {
                    let mut origin = Vec::new();
                    if let Some(Context::Branch {
                        after_test,
                        branch_ends,
                    }) = state.contexts.last_mut()
                    {
                        branch_ends.extend(state.current.iter().copied());
                        origin = after_test.clone();
                    }
                    Self::fork(state, origin, node, sink)?;
                }
                _ => {}
            },
            NodeKind::LogicalExpression => {
                if slot == "right" {
                    let after_left = state.current.clone();
                    if let Some(Context::Logical { after_left: saved }) = state.contexts.last_mut()
                    {
                        *saved = after_left.clone();
                    }
                    Self::fork(state, after_left, node, sink)?;
                }
            }
            NodeKind::WhileStatement => match slot {
                "test" => Self::open_loop_entry(state, node, sink)?,
                "body" => {
                    Self::save_after_test(state);
                    let origin = state.current.clone();
                    Self::fork(state, origin, node, sink)?;
                }
                _ => {}
            },
            NodeKind::DoWhileStatement => match slot {
                "body" => Self::open_loop_entry(state, node, sink)?,
                "test" => {
                    let origin = state.current.clone();
                    Self::fork(state, origin, node, sink)?;
                }
                _ => {}
            },
            NodeKind::ForStatement => match slot {
                "test" => Self::open_loop_entry(state, node, sink)?,
                "update" => {
                    Self::ensure_loop_entry(state, node, sink)?;
                    Self::save_after_test(state);
                    let origin = state.current.clone();
                    Self::fork(state, origin, node, sink)?;
                }
                "body" => {
                    Self::ensure_loop_entry(state, node, sink)?;
                    Self::save_after_test(state);
                    let origin = state.current.clone();
                    Self::fork(state, origin, node, sink)?;
                }
                _ => {}
            },
            NodeKind::ForInStatement | NodeKind::ForOfStatement => {
                if slot == "body" {
                    Self::open_loop_entry(state, node, sink)?;
                    Self::save_after_test(state);
                    let origin = state.current.clone();
                    Self::fork(state, origin, node, sink)?;
                }
            }
            NodeKind::SwitchStatement => {
                if tree.kind(node) == NodeKind::SwitchCase {
                    let mut preds = Vec::new();
                    if let Some(Context::Switch {
                        after_discriminant,
                        seen_case,
                        ..
                    }) = state.contexts.last_mut()
                    {
                        if *seen_case {
                            // Fall-through from the previous case, plus a
                            // fresh match of this case's test.
                            preds.extend(state.current.iter().copied());
                            preds.extend(after_discriminant.iter().copied());
                        } else {
                            *after_discriminant = state.current.clone();
                            preds = state.current.clone();
                            *seen_case = true;
                        }
                    }
                    Self::join(state, preds, node, sink)?;
                }
            }
            NodeKind::TryStatement => match slot {
                "handler" => {
                    let mut origin = Vec::new();
                    if let Some(Context::Try {
                        block_start, exits, ..
                    }) = state.contexts.last_mut()
                    {
                        exits.extend(state.current.iter().copied());
                        origin = block_start.clone();
                    }
                    Self::fork(state, origin, node, sink)?;
                }
                "finalizer" => {
                    let mut preds = state.current.clone();
                    if let Some(Context::Try { exits, .. }) = state.contexts.last_mut() {
                        preds.extend(exits.iter().copied());
                    }
                    Self::join(state, preds, node, sink)?;
                }
                _ => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn start_path(
        &mut self,
        tree: &SyntaxTree,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        self.counter += 1;
        let origin = if tree.kind(node) == NodeKind::Program {
            CodePathOrigin::Program
        } else {
            CodePathOrigin::Function
        };
        let path = CodePath::new(format!("s{}", self.counter), origin, node);
        let initial = path.initial_segment;
        let state = PathState {
            path,
            current: vec![initial],
            contexts: Vec::new(),
        };
        self.stack.push(state);
        let state = self.stack.last().map(|s| &s.path);
        if let Some(path) = state {
            sink.emit(&PathEvent::Start { path, node })?;
            sink.emit(&PathEvent::SegmentStart {
                path,
                segment: initial,
                node,
            })?;
        }
        Ok(())
    }

    fn end_path(&mut self, node: NodeId, sink: &mut dyn PathSink) -> Result<(), LinterError> {
        let Some(mut state) = self.stack.pop() else {
            return Ok(());
        };
        let mut finals = state.current.clone();
        finals.extend(state.path.returned_segments.iter().copied());
        state.path.final_segments = finals;

        for &segment in &state.current {
            sink.emit(&PathEvent::SegmentEnd {
                path: &state.path,
                segment,
                node,
            })?;
        }
        sink.emit(&PathEvent::End {
            path: &state.path,
            node,
        })?;
        self.finished.push(state.path);
        Ok(())
    }

    /// Create a new segment from `preds` and make it the only current one.
    fn join(
        state: &mut PathState,
        preds: Vec<SegmentId>,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let segment = state.path.add_segment(false, &preds);
        Self::replace_current(state, vec![segment], node, sink)
    }

    /// Fork: same as join, but reads as "branch entry" at call sites.
    fn fork(
        state: &mut PathState,
        origin: Vec<SegmentId>,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        Self::join(state, origin, node, sink)
    }

    /// Terminate the current segments with no successor (after `return`,
    /// `throw`, `break`, `continue`). Whatever follows is unreachable.
    fn cut_current(
        state: &mut PathState,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let segment = state.path.add_segment(false, &[]);
        Self::replace_current(state, vec![segment], node, sink)
    }

    fn replace_current(
        state: &mut PathState,
        new: Vec<SegmentId>,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let old = std::mem::replace(&mut state.current, new);
        for segment in old {
            sink.emit(&PathEvent::SegmentEnd {
                path: &state.path,
                segment,
                node,
            })?;
        }
        for &segment in &state.current {
            sink.emit(&PathEvent::SegmentStart {
                path: &state.path,
                segment,
                node,
            })?;
        }
        Ok(())
    }

    /// Make the current position a loop entry (join target for back edges
    /// and `continue`).
    fn open_loop_entry(
        state: &mut PathState,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let preds = state.current.clone();
        Self::join(state, preds, node, sink)?;
        let entry = state.current.clone();
        if let Some(Context::Loop { entry: saved, .. }) = state.contexts.last_mut() {
            *saved = entry;
        }
        Ok(())
    }

    /// `for (;;)` has no test; open the entry lazily at the first body or
    /// update slot instead.
    fn ensure_loop_entry(
        state: &mut PathState,
        node: NodeId,
        sink: &mut dyn PathSink,
    ) -> Result<(), LinterError> {
        let needs_entry = matches!(
            state.contexts.last(),
            Some(Context::Loop { entry, .. }) if entry.is_empty()
        );
        if needs_entry {
            Self::open_loop_entry(state, node, sink)?;
        }
        Ok(())
    }

    /// Record the loop-exit segments the first time a loop leaves its test.
    fn save_after_test(state: &mut PathState) {
        let current = state.current.clone();
        if let Some(Context::Loop { after_test, .. }) = state.contexts.last_mut() {
            if after_test.is_empty() {
                *after_test = current;
            }
        }
    }
}

/// The slot of `parent` that holds `node`, if any.
fn slot_key(tree: &SyntaxTree, parent: NodeId, node: NodeId) -> Option<&'static str> {
    for slot in &tree.get(parent).children {
        let found = match &slot.child {
            ecma_ast::Child::Node(child) => *child == Some(node),
            ecma_ast::Child::List(children) => children.contains(&Some(node)),
        };
        if found {
            return Some(slot.key);
        }
    }
    None
}
