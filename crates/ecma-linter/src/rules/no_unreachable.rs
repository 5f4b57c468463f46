//! `no-unreachable`: disallow code after `return`, `throw`, `break`, and
//! `continue`.
//!
//! Driven entirely by the code-path analysis: a statement sitting in a
//! segment with no reachable predecessors is dead. Function declarations
//! are hoisted and never reported.

use std::cell::RefCell;
use std::rc::Rc;

use ecma_ast::NodeKind;

use crate::code_path::{PathEvent, PathEventKind};
use crate::context::{Report, RuleContext};
use crate::error::RuleError;
use crate::rule::{Rule, RuleListener, RuleMeta, RuleType};

const STATEMENTS: &str = "ExpressionStatement, VariableDeclaration, ReturnStatement, \
     ThrowStatement, BreakStatement, ContinueStatement, IfStatement, SwitchStatement, \
     WhileStatement, DoWhileStatement, ForStatement, ForInStatement, ForOfStatement, \
     BlockStatement, EmptyStatement, DebuggerStatement, TryStatement, LabeledStatement";

#[derive(Default)]
struct State {
    /// One reachability flag per open code path, innermost last.
    reachable: Vec<bool>,
    /// End offset of the statement reported last, to avoid re-reporting
    /// every nested statement of a dead block.
    covered_until: usize,
}

pub struct NoUnreachable {
    meta: RuleMeta,
}

impl NoUnreachable {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Problem)
                .description("disallow unreachable code after control-flow statements")
                .recommended()
                .message("unreachableCode", "Unreachable code."),
        }
    }
}

impl Default for NoUnreachable {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for NoUnreachable {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        let state = Rc::new(RefCell::new(State::default()));

        let on_start = {
            let state = Rc::clone(&state);
            move |_ctx: &RuleContext<'_>, _event: &PathEvent<'_>| {
                state.borrow_mut().reachable.push(true);
                Ok(())
            }
        };
        let on_end = {
            let state = Rc::clone(&state);
            move |_ctx: &RuleContext<'_>, _event: &PathEvent<'_>| {
                state.borrow_mut().reachable.pop();
                Ok(())
            }
        };
        let on_segment = {
            let state = Rc::clone(&state);
            move |_ctx: &RuleContext<'_>, event: &PathEvent<'_>| {
                if let PathEvent::SegmentStart { path, segment, .. } = event {
                    if let Some(current) = state.borrow_mut().reachable.last_mut() {
                        *current = path.segment(*segment).reachable;
                    }
                }
                Ok(())
            }
        };
        let on_statement = {
            let state = Rc::clone(&state);
            move |ctx: &RuleContext<'_>, node: ecma_ast::NodeId| {
                let mut state = state.borrow_mut();
                if state.reachable.last().copied().unwrap_or(true) {
                    return Ok(());
                }
                let range = ctx.tree().range(node);
                if range.end <= state.covered_until {
                    return Ok(());
                }
                // Hoisted declarations are live even in dead branches, and
                // `var` without an initializer only hoists.
                if ctx.tree().kind(node) == NodeKind::VariableDeclaration
                    && ctx.tree().prop(node, "kind").and_then(|p| p.as_str()) == Some("var")
                    && ctx
                        .tree()
                        .list(node, "declarations")
                        .iter()
                        .all(|d| ctx.tree().child(*d, "init").is_none())
                {
                    return Ok(());
                }
                state.covered_until = range.end;
                ctx.report(Report::on(node).message_id("unreachableCode"))
            }
        };

        Ok(vec![
            RuleListener::path(PathEventKind::Start, on_start),
            RuleListener::path(PathEventKind::End, on_end),
            RuleListener::path(PathEventKind::SegmentStart, on_segment),
            RuleListener::node(STATEMENTS, on_statement),
        ])
    }
}
