//! In-source directive comments.
//!
//! Reads every non-shebang comment and extracts directives:
//! `eslint-disable`, `eslint-enable`, `eslint-disable-line`,
//! `eslint-disable-next-line`, `eslint` (inline rule configuration),
//! `global`/`globals`, `exported`, and `eslint-env`. The scanner is a
//! hand-written state machine over the comment text; inline rule
//! configuration is rewritten to JSON and parsed with `serde_json`.
//!
//! Directive misuse never aborts the lint: it surfaces as non-fatal
//! problems located at the offending comment.

use ecma_ast::{TextRange, Token, TokenKind};
use ecma_source::SourceCode;
use serde_json::Value;

use crate::config::{GlobalValue, Severity};
use crate::diagnostics::LintMessage;

/// Kind of a suppression directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Disable,
    Enable,
    DisableLine,
    DisableNextLine,
}

/// One parsed suppression directive.
#[derive(Debug, Clone)]
pub struct DisableDirective {
    pub kind: DirectiveKind,
    /// Rule ids this directive names; empty means "all rules".
    pub rules: Vec<String>,
    pub justification: Option<String>,
    /// Position the directive takes effect from (1-based line, 1-based
    /// column), for the region kinds.
    pub line: u32,
    pub column: u32,
    /// The single suppressed line, for the line-granular kinds.
    pub target_line: u32,
    /// The whole comment, for unused-directive removal fixes.
    pub comment_range: TextRange,
}

/// An inline rule-configuration override (`/* eslint no-var: 2 */`), not
/// yet validated against the registry.
#[derive(Debug, Clone)]
pub struct RuleOverride {
    pub rule_id: String,
    pub value: Value,
    pub line: u32,
    pub column: u32,
}

/// Everything extracted from one file's comments.
#[derive(Debug, Default)]
pub struct InlineDirectives {
    pub disables: Vec<DisableDirective>,
    pub globals: Vec<(String, GlobalValue)>,
    pub exported: Vec<String>,
    pub envs: Vec<String>,
    pub rule_overrides: Vec<RuleOverride>,
    /// Directive misuse and inline-config parse failures.
    pub problems: Vec<LintMessage>,
}

/// Scan all comments of `source`.
#[must_use]
pub fn parse_directives(source: &SourceCode) -> InlineDirectives {
    let mut out = InlineDirectives::default();
    for comment in source.token_store().comments() {
        if comment.kind == TokenKind::Shebang {
            continue;
        }
        scan_comment(source, comment, &mut out);
    }
    out
}

fn scan_comment(source: &SourceCode, comment: &Token, out: &mut InlineDirectives) {
    let text = comment.value.trim();
    let keyword: String = text
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    let rest = text[keyword.len()..].trim();

    let start = source.position(comment.range.start);
    let end = source.position(comment.range.end);
    let line = start.line;
    let column = start.column + 1;

    let (value, justification) = split_justification(rest);

    match keyword.as_str() {
        "eslint-disable" | "eslint-enable" | "eslint-disable-line" | "eslint-disable-next-line" => {
            let kind = match keyword.as_str() {
                "eslint-disable" => DirectiveKind::Disable,
                "eslint-enable" => DirectiveKind::Enable,
                "eslint-disable-line" => DirectiveKind::DisableLine,
                _ => DirectiveKind::DisableNextLine,
            };
            // Region directives only work in block comments.
            if comment.kind == TokenKind::LineComment
                && matches!(kind, DirectiveKind::Disable | DirectiveKind::Enable)
            {
                return;
            }
            if kind == DirectiveKind::DisableLine && start.line != end.line {
                out.problems.push(LintMessage::core(
                    Severity::Error,
                    "eslint-disable-line comment should not span multiple lines.",
                    line,
                    column,
                ));
                return;
            }
            let target_line = match kind {
                DirectiveKind::DisableLine => start.line,
                DirectiveKind::DisableNextLine => end.line + 1,
                _ => start.line,
            };
            // `eslint-disable-next-line` anchors to the comment's end line;
            // every other kind anchors to its start.
            let (anchor_line, anchor_column) = match kind {
                DirectiveKind::DisableNextLine => (end.line, end.column + 1),
                _ => (line, column),
            };
            out.disables.push(DisableDirective {
                kind,
                rules: split_list(value),
                justification,
                line: anchor_line,
                column: anchor_column,
                target_line,
                comment_range: comment.range,
            });
        }
        "eslint" => {
            if comment.kind != TokenKind::BlockComment {
                return;
            }
            match parse_inline_config(value) {
                Ok(entries) => {
                    for (rule_id, config_value) in entries {
                        out.rule_overrides.push(RuleOverride {
                            rule_id,
                            value: config_value,
                            line,
                            column,
                        });
                    }
                }
                Err(reason) => out.problems.push(LintMessage::core(
                    Severity::Error,
                    format!("Failed to parse JSON from '{value}': {reason}"),
                    line,
                    column,
                )),
            }
        }
        "global" | "globals" => {
            if comment.kind != TokenKind::BlockComment {
                return;
            }
            for entry in split_list(value) {
                let (name, mode) = match entry.split_once(':') {
                    Some((name, mode)) => (name.trim().to_string(), Some(mode.trim().to_string())),
                    None => (entry, None),
                };
                let global_value = match mode.as_deref() {
                    None => GlobalValue::Readonly,
                    Some(mode_text) => match GlobalValue::parse(mode_text) {
                        Some(v) => v,
                        None => {
                            out.problems.push(LintMessage::core(
                                Severity::Error,
                                format!(
                                    "'{mode_text}' is not a valid configuration for a global (use 'readonly', 'writable', or 'off')"
                                ),
                                line,
                                column,
                            ));
                            continue;
                        }
                    },
                };
                out.globals.push((name, global_value));
            }
        }
        "exported" => {
            if comment.kind != TokenKind::BlockComment {
                return;
            }
            out.exported.extend(split_list(value));
        }
        "eslint-env" => {
            if comment.kind != TokenKind::BlockComment {
                return;
            }
            out.envs.extend(split_list(value));
        }
        _ => {}
    }
}

/// Split the directive value from its `-- justification` tail (first
/// whitespace-dash-dash-whitespace occurrence).
fn split_justification(text: &str) -> (&str, Option<String>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i + 3 < bytes.len() {
        if bytes[i].is_ascii_whitespace()
            && bytes[i + 1] == b'-'
            && bytes[i + 2] == b'-'
            && bytes[i + 3].is_ascii_whitespace()
        {
            let value = text[..i].trim();
            let justification = text[i + 4..].trim();
            return (value, Some(justification.to_string()));
        }
        i += 1;
    }
    (text.trim(), None)
}

/// Comma-separated list, entries trimmed, empties dropped.
fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse the value of an `eslint` configuration comment into rule entries.
///
/// The comment body is JSON-ish (`no-var: 2, semi: ["error", "always"]`);
/// keys are quoted and bare severity words are tolerated before handing the
/// result to `serde_json`.
fn parse_inline_config(text: &str) -> Result<Vec<(String, Value)>, String> {
    let mut entries = Vec::new();
    for chunk in split_top_level(text) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }
        let (key, value_text) = chunk
            .split_once(':')
            .ok_or_else(|| format!("missing ':' in '{chunk}'"))?;
        let key = key.trim().trim_matches('"').trim_matches('\'');
        if key.is_empty() {
            return Err("empty rule name".to_string());
        }
        let value_text = value_text.trim();
        let value = serde_json::from_str::<Value>(value_text).or_else(|err| {
            // Bare keywords: error, warn, off.
            if value_text.chars().all(|c| c.is_ascii_alphabetic()) && !value_text.is_empty() {
                Ok(Value::String(value_text.to_string()))
            } else {
                Err(err.to_string())
            }
        })?;
        entries.push((key.to_string(), value));
    }
    Ok(entries)
}

/// Split on commas that are not nested inside brackets or strings.
fn split_top_level(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut current = String::new();
    for c in text.chars() {
        match in_string {
            Some(quote) => {
                current.push(c);
                if c == quote {
                    in_string = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    in_string = Some(c);
                    current.push(c);
                }
                '[' | '{' => {
                    depth += 1;
                    current.push(c);
                }
                ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => {
                    out.push(std::mem::take(&mut current));
                }
                _ => current.push(c),
            },
        }
    }
    if !current.trim().is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecma_ast::{NodeData, NodeKind, ScopeManager, ScopeKind, SyntaxTree};

    fn source_with_comments(text: &str, comments: Vec<Token>) -> SourceCode {
        let mut b = SyntaxTree::builder();
        let program = b.add(NodeData::new(NodeKind::Program, TextRange::new(0, text.len())));
        let tree = b.finish(program);
        let mut scopes = ScopeManager::new();
        scopes.add_scope(ScopeKind::Global, program, None);
        SourceCode::new(text, tree, scopes, Vec::new(), comments)
    }

    fn line_comment(text: &str, value: &str, offset: usize) -> Token {
        Token::new(
            TokenKind::LineComment,
            value,
            TextRange::new(offset, offset + value.len() + 2),
        )
    }

    #[test]
    fn test_disable_next_line() {
        let text = "// eslint-disable-next-line no-var\nvar x = 1;\n";
        let comment = line_comment(text, " eslint-disable-next-line no-var", 0);
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);

        assert_eq!(directives.disables.len(), 1);
        let d = &directives.disables[0];
        assert_eq!(d.kind, DirectiveKind::DisableNextLine);
        assert_eq!(d.rules, vec!["no-var"]);
        assert_eq!(d.target_line, 2);
        assert!(d.justification.is_none());
    }

    #[test]
    fn test_multiline_disable_next_line_anchors_to_end_line() {
        let text = "/* eslint-disable-next-line\n   no-var */\nvar x = 1;\n";
        let comment = Token::new(
            TokenKind::BlockComment,
            " eslint-disable-next-line\n   no-var ",
            TextRange::new(0, 40),
        );
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);

        assert_eq!(directives.disables.len(), 1);
        let d = &directives.disables[0];
        assert_eq!(d.kind, DirectiveKind::DisableNextLine);
        assert_eq!(d.rules, vec!["no-var"]);
        assert_eq!(d.target_line, 3, "suppresses the line after the comment ends");
        assert_eq!((d.line, d.column), (2, 13), "anchored to the comment's end line");
    }

    #[test]
    fn test_justification_split() {
        let (value, justification) = split_justification("no-var, semi -- migration pending");
        assert_eq!(value, "no-var, semi");
        assert_eq!(justification.as_deref(), Some("migration pending"));

        let (value, none) = split_justification("no-var");
        assert_eq!(value, "no-var");
        assert!(none.is_none());
    }

    #[test]
    fn test_empty_rule_list_means_all() {
        let text = "/* eslint-disable */\nvar x;\n";
        let comment = Token::new(TokenKind::BlockComment, " eslint-disable ", TextRange::new(0, 20));
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert_eq!(directives.disables.len(), 1);
        assert!(directives.disables[0].rules.is_empty());
        assert_eq!(directives.disables[0].kind, DirectiveKind::Disable);
    }

    #[test]
    fn test_line_comment_cannot_carry_region_directive() {
        let text = "// eslint-disable no-var\nvar x;\n";
        let comment = line_comment(text, " eslint-disable no-var", 0);
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert!(directives.disables.is_empty());
        assert!(directives.problems.is_empty());
    }

    #[test]
    fn test_multiline_disable_line_is_a_problem() {
        let text = "/* eslint-disable-line\nno-var */ var x;\n";
        let comment = Token::new(
            TokenKind::BlockComment,
            " eslint-disable-line\nno-var ",
            TextRange::new(0, 32),
        );
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert!(directives.disables.is_empty());
        assert_eq!(directives.problems.len(), 1);
        assert!(directives.problems[0]
            .message
            .contains("should not span multiple lines"));
    }

    #[test]
    fn test_globals_with_modes() {
        let text = "/* globals window: readonly, myVar: writable, legacy */\n";
        let comment = Token::new(
            TokenKind::BlockComment,
            " globals window: readonly, myVar: writable, legacy ",
            TextRange::new(0, 56),
        );
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert_eq!(
            directives.globals,
            vec![
                ("window".to_string(), GlobalValue::Readonly),
                ("myVar".to_string(), GlobalValue::Writable),
                ("legacy".to_string(), GlobalValue::Readonly),
            ]
        );
    }

    #[test]
    fn test_invalid_global_mode_is_a_problem() {
        let text = "/* globals thing: sometimes */\n";
        let comment = Token::new(
            TokenKind::BlockComment,
            " globals thing: sometimes ",
            TextRange::new(0, 30),
        );
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert!(directives.globals.is_empty());
        assert_eq!(directives.problems.len(), 1);
    }

    #[test]
    fn test_inline_config() {
        let text = "/* eslint no-var: 2, semi: [\"error\", \"always\"], no-empty: off */\n";
        let comment = Token::new(
            TokenKind::BlockComment,
            " eslint no-var: 2, semi: [\"error\", \"always\"], no-empty: off ",
            TextRange::new(0, 64),
        );
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert_eq!(directives.rule_overrides.len(), 3);
        assert_eq!(directives.rule_overrides[0].rule_id, "no-var");
        assert_eq!(directives.rule_overrides[0].value, serde_json::json!(2));
        assert_eq!(
            directives.rule_overrides[1].value,
            serde_json::json!(["error", "always"])
        );
        assert_eq!(directives.rule_overrides[2].value, serde_json::json!("off"));
    }

    #[test]
    fn test_invalid_inline_config_is_a_problem() {
        let text = "/* eslint no-var: [2, */\n";
        let comment = Token::new(
            TokenKind::BlockComment,
            " eslint no-var: [2, ",
            TextRange::new(0, 24),
        );
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert!(directives.rule_overrides.is_empty());
        assert_eq!(directives.problems.len(), 1);
        assert!(directives.problems[0].message.contains("Failed to parse"));
    }

    #[test]
    fn test_env_and_exported() {
        let text = "/* eslint-env browser, node */ /* exported setup, teardown */\n";
        let comments = vec![
            Token::new(
                TokenKind::BlockComment,
                " eslint-env browser, node ",
                TextRange::new(0, 30),
            ),
            Token::new(
                TokenKind::BlockComment,
                " exported setup, teardown ",
                TextRange::new(31, 61),
            ),
        ];
        let source = source_with_comments(text, comments);
        let directives = parse_directives(&source);
        assert_eq!(directives.envs, vec!["browser", "node"]);
        assert_eq!(directives.exported, vec!["setup", "teardown"]);
    }

    #[test]
    fn test_plain_comment_ignored() {
        let text = "// just a note about eslint-disable semantics\n";
        let comment = line_comment(text, " just a note about eslint-disable semantics", 0);
        let source = source_with_comments(text, vec![comment]);
        let directives = parse_directives(&source);
        assert!(directives.disables.is_empty());
        assert!(directives.problems.is_empty());
    }
}
