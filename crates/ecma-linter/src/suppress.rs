//! Applies disable directives to the raw problem list.
//!
//! Problems are stably sorted by position, then each is checked against the
//! directives in source order: a problem is suppressed when an active
//! region directive or a line-granular directive covers its rule at its
//! position. Suppressed problems are annotated and moved aside; directives
//! that suppressed nothing are reported as unused, optionally with a fix
//! that removes the directive comment (and nothing else on its line).

use ecma_ast::TextRange;
use ecma_source::SourceCode;

use crate::config::Severity;
use crate::diagnostics::{Fix, LintMessage, Suppression};
use crate::directives::{DirectiveKind, DisableDirective};

/// The `reportUnusedDisableDirectives` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnusedDirectivesMode {
    #[default]
    Off,
    Warn,
    Error,
}

impl UnusedDirectivesMode {
    const fn severity(self) -> Option<Severity> {
        match self {
            Self::Off => None,
            Self::Warn => Some(Severity::Warn),
            Self::Error => Some(Severity::Error),
        }
    }
}

/// Output of the applier.
#[derive(Debug)]
pub struct DirectiveApplyResult {
    /// Problems that survived, in `(line, column)` order.
    pub messages: Vec<LintMessage>,
    /// Problems suppressed by a directive, annotated with their
    /// suppressions.
    pub suppressed: Vec<LintMessage>,
}

/// Apply `directives` to `problems`.
pub fn apply_disable_directives(
    source: &SourceCode,
    problems: Vec<LintMessage>,
    directives: &[DisableDirective],
    mode: UnusedDirectivesMode,
    disable_fixes: bool,
    is_rule_enabled: &dyn Fn(&str) -> bool,
) -> DirectiveApplyResult {
    let mut problems = problems;
    problems.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));

    let mut used = vec![false; directives.len()];
    let mut messages = Vec::new();
    let mut suppressed = Vec::new();

    for mut problem in problems {
        match suppressor(directives, &problem) {
            Some(indices) => {
                for &index in &indices {
                    used[index] = true;
                }
                let justification = indices
                    .first()
                    .and_then(|&index| directives[index].justification.clone())
                    .unwrap_or_default();
                problem.suppressions.push(Suppression {
                    kind: "directive".to_string(),
                    justification,
                });
                problem.fatal = false;
                suppressed.push(problem);
            }
            None => messages.push(problem),
        }
    }

    if let Some(severity) = mode.severity() {
        for (index, directive) in directives.iter().enumerate() {
            if used[index] || !names_enabled_rule(directive, is_rule_enabled) {
                continue;
            }
            let mut message = LintMessage::core(
                severity,
                unused_message(directive),
                directive.line,
                directive.column,
            );
            if !disable_fixes {
                message.fix = Some(removal_fix(source, directive));
            }
            messages.push(message);
        }
        messages.sort_by(|a, b| (a.line, a.column).cmp(&(b.line, b.column)));
    }

    DirectiveApplyResult {
        messages,
        suppressed,
    }
}

/// The directives that suppress `problem`, if any. Region directives are
/// walked in source order maintaining per-rule enable state; line-granular
/// directives match on the problem's line.
fn suppressor(directives: &[DisableDirective], problem: &LintMessage) -> Option<Vec<usize>> {
    let rule_id = problem.rule_id.as_deref()?;

    let mut active: Option<usize> = None;
    for (index, directive) in directives.iter().enumerate() {
        match directive.kind {
            DirectiveKind::Disable | DirectiveKind::Enable => {
                if (directive.line, directive.column) > (problem.line, problem.column) {
                    continue;
                }
                if covers(directive, rule_id) {
                    active = match directive.kind {
                        DirectiveKind::Disable => Some(index),
                        _ => None,
                    };
                }
            }
            DirectiveKind::DisableLine | DirectiveKind::DisableNextLine => {}
        }
    }

    let mut result: Vec<usize> = active.into_iter().collect();
    for (index, directive) in directives.iter().enumerate() {
        if matches!(
            directive.kind,
            DirectiveKind::DisableLine | DirectiveKind::DisableNextLine
        ) && directive.target_line == problem.line
            && covers(directive, rule_id)
        {
            result.push(index);
        }
    }

    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

fn covers(directive: &DisableDirective, rule_id: &str) -> bool {
    directive.rules.is_empty() || directive.rules.iter().any(|r| r == rule_id)
}

/// Unused reporting applies unless every rule the directive names is off
/// anyway.
fn names_enabled_rule(directive: &DisableDirective, is_rule_enabled: &dyn Fn(&str) -> bool) -> bool {
    directive.rules.is_empty() || directive.rules.iter().any(|r| is_rule_enabled(r))
}

fn unused_message(directive: &DisableDirective) -> String {
    let kind = match directive.kind {
        DirectiveKind::Disable => "eslint-disable",
        DirectiveKind::Enable => "eslint-enable",
        DirectiveKind::DisableLine => "eslint-disable-line",
        DirectiveKind::DisableNextLine => "eslint-disable-next-line",
    };
    if directive.rules.is_empty() {
        format!("Unused {kind} directive (no problems were reported).")
    } else {
        format!(
            "Unused {kind} directive (no problems were reported from {}).",
            directive
                .rules
                .iter()
                .map(|r| format!("'{r}'"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// A fix removing the directive comment. When the comment has its lines to
/// itself the whole span of lines goes; otherwise the comment plus its
/// leading whitespace. A block-comment directive may span several lines, so
/// the trailing bound comes from the comment's end line.
fn removal_fix(source: &SourceCode, directive: &DisableDirective) -> Fix {
    let text = source.text();
    let index = source.line_index();
    let comment = directive.comment_range;

    let start_position = source.position(comment.start);
    let end_position = source.position(comment.end);
    let line_start = index.line_start(start_position.line).unwrap_or(0);
    let next_line_start = index
        .line_start(end_position.line + 1)
        .unwrap_or(text.len());

    let before = &text[line_start..comment.start.min(text.len())];
    let line_end = next_line_start.min(text.len());
    let after = &text[comment.end.min(text.len())..line_end];

    if before.trim().is_empty() && after.trim().is_empty() {
        return Fix::delete(TextRange::new(line_start, next_line_start));
    }

    // Eat the whitespace run before the comment so no double space is left.
    let mut start = comment.start;
    while start > line_start && text.as_bytes()[start - 1].is_ascii_whitespace() {
        start -= 1;
    }
    Fix::delete(TextRange::new(start, comment.end))
}
