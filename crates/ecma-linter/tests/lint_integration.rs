//! End-to-end scenarios: parse with the reference parser, lint, fix.

use std::sync::Arc;

use ecma_linter::{
    FixSelect, LintConfig, Linter, Report, Rule, RuleError, RuleListener, RuleMeta, RuleType,
    Severity, SourceInput, UnusedDirectivesMode, VerifyOptions,
};
use ecma_parser::EcmaParser;
use serde_json::json;

fn config(rules: serde_json::Value) -> LintConfig {
    let mut config: LintConfig = serde_json::from_value(json!({ "rules": rules })).unwrap();
    config.language_options.parser = Some(Arc::new(EcmaParser::new()));
    config
}

fn verify(text: &str, config: &LintConfig) -> Vec<ecma_linter::LintMessage> {
    Linter::new()
        .verify(SourceInput::Text(text), config, &VerifyOptions::default())
        .unwrap()
}

#[test]
fn test_plain_lint_reports_position() {
    // S1
    let messages = verify("var x = 1;\n", &config(json!({ "no-var": 2 })));
    assert_eq!(messages.len(), 1);
    let m = &messages[0];
    assert_eq!(m.rule_id.as_deref(), Some("no-var"));
    assert_eq!(m.severity, Severity::Error);
    assert_eq!((m.line, m.column), (1, 1));
    assert_eq!((m.end_line, m.end_column), (Some(1), Some(11)));
    assert_eq!(m.node_type.as_deref(), Some("VariableDeclaration"));
    assert_eq!(m.message, "Unexpected var, use let or const instead.");
}

#[test]
fn test_fix_rewrites_all_declarations() {
    // S2
    let report = Linter::new()
        .verify_and_fix(
            "var x=1;\nvar y=2;\n",
            &config(json!({ "no-var": 2 })),
            &VerifyOptions::default(),
        )
        .unwrap();
    assert!(report.fixed);
    assert_eq!(report.output, "let x=1;\nlet y=2;\n");
    assert!(report.messages.is_empty());
}

#[test]
fn test_disable_next_line_suppresses() {
    // S3
    let messages = verify(
        "// eslint-disable-next-line no-var\nvar x=1;\n",
        &config(json!({ "no-var": 2 })),
    );
    assert!(messages.is_empty());
}

#[test]
fn test_unused_directive_reported_and_fix_is_idempotent() {
    // S4 plus testable property 7.
    let text = "// eslint-disable-next-line no-var\nlet x=1;\n";
    let cfg = config(json!({ "no-var": 2 }));
    let options = VerifyOptions {
        report_unused_disable_directives: UnusedDirectivesMode::Error,
        ..VerifyOptions::default()
    };
    let messages = Linter::new()
        .verify(SourceInput::Text(text), &cfg, &options)
        .unwrap();
    assert_eq!(messages.len(), 1);
    let unused = &messages[0];
    assert!(unused.message.contains("Unused eslint-disable-next-line"));
    let fix = unused.fix.as_ref().expect("unused directive carries a fix");
    // The comment is alone on its line: the fix removes the whole line.
    let mut fixed = text.to_string();
    fixed.replace_range(fix.range.start..fix.range.end, &fix.text);
    assert_eq!(fixed, "let x=1;\n");

    // Re-linting the fixed text reports nothing.
    let again = Linter::new()
        .verify(SourceInput::Text(&fixed), &cfg, &options)
        .unwrap();
    assert!(again.is_empty());
}

struct RewriteRule {
    meta: RuleMeta,
    replacement: &'static str,
}

impl RewriteRule {
    fn new(replacement: &'static str) -> Self {
        Self {
            meta: RuleMeta::new(RuleType::Suggestion)
                .fixable(ecma_linter::Fixable::Code)
                .message("rewrite", "Rewrite this identifier."),
            replacement,
        }
    }
}

impl Rule for RewriteRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn create(&self, _ctx: &ecma_linter::RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        let replacement = self.replacement;
        Ok(vec![RuleListener::node(
            "Identifier[name=aaaaa]",
            move |ctx, node| {
                let range = ctx.tree().range(node);
                ctx.report(
                    Report::on(node)
                        .message_id("rewrite")
                        .fix(move |fixer| Some(fixer.replace_range(range, replacement))),
                )
            },
        )])
    }
}

#[test]
fn test_conflicting_fixes_apply_one_per_pass() {
    // S5: two rules rewrite the same [0, 5) range; only one fix lands.
    let mut linter = Linter::new();
    linter.define_rule("rewrite-a", Arc::new(RewriteRule::new("bbbbb")));
    linter.define_rule("rewrite-b", Arc::new(RewriteRule::new("ccccc")));
    let cfg = config(json!({ "rewrite-a": 2, "rewrite-b": 2 }));

    let single = linter
        .verify(
            SourceInput::Text("aaaaa;\n"),
            &cfg,
            &VerifyOptions::default(),
        )
        .unwrap();
    assert_eq!(single.len(), 2, "both rules report before fixing");

    let report = linter
        .verify_and_fix("aaaaa;\n", &cfg, &VerifyOptions::default())
        .unwrap();
    assert!(report.fixed);
    assert_eq!(report.output, "bbbbb;\n", "first-registered rule wins");
    assert!(report.messages.is_empty());
}

#[test]
fn test_parse_failure_is_single_fatal_problem() {
    // S6
    let messages = verify("var x =", &config(json!({ "no-var": 2 })));
    assert_eq!(messages.len(), 1);
    let fatal = &messages[0];
    assert!(fatal.fatal);
    assert_eq!(fatal.severity, Severity::Error);
    assert_eq!(fatal.rule_id, None);
    assert_eq!(fatal.message, "Unexpected end of input");
}

#[test]
fn test_fix_convergence_is_bounded() {
    // Testable property 5: termination plus fixed ⇔ output changed.
    let cfg = config(json!({ "no-var": 2, "semi": ["error", "always"] }));
    let report = Linter::new()
        .verify_and_fix("var x = 1\nvar y = x\n", &cfg, &VerifyOptions::default())
        .unwrap();
    assert!(report.fixed);
    assert_eq!(report.output, "let x = 1;\nlet y = x;\n");
    assert!(report.messages.is_empty());

    let clean = Linter::new()
        .verify_and_fix("let z = 3;\n", &cfg, &VerifyOptions::default())
        .unwrap();
    assert!(!clean.fixed);
    assert_eq!(clean.output, "let z = 3;\n");
}

#[test]
fn test_disable_enable_region() {
    let text = "/* eslint-disable no-var */\nvar a = 1;\n/* eslint-enable no-var */\nvar b = 2;\n";
    let messages = verify(text, &config(json!({ "no-var": 2 })));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].line, 4);
}

#[test]
fn test_disable_line_directive() {
    let text = "var a = 1; // eslint-disable-line no-var\nvar b = 2;\n";
    let messages = verify(text, &config(json!({ "no-var": 2 })));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].line, 2);
}

#[test]
fn test_inline_config_overrides_base() {
    let text = "/* eslint no-var: 0 */\nvar x = 1;\n";
    let messages = verify(text, &config(json!({ "no-var": 2 })));
    assert!(messages.is_empty());

    let text = "/* eslint semi: [\"error\", \"always\"] */\nvar x = 1\n";
    let messages = verify(text, &config(json!({})));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].rule_id.as_deref(), Some("semi"));
}

#[test]
fn test_allow_inline_config_false_ignores_directives() {
    let text = "// eslint-disable-next-line no-var\nvar x=1;\n";
    let options = VerifyOptions {
        allow_inline_config: false,
        ..VerifyOptions::default()
    };
    let messages = Linter::new()
        .verify(SourceInput::Text(text), &config(json!({ "no-var": 2 })), &options)
        .unwrap();
    assert_eq!(messages.len(), 1, "directive ignored");
}

#[test]
fn test_global_directive_feeds_no_undef() {
    let cfg = config(json!({ "no-undef": 2 }));
    let messages = verify("undeclared(1);\n", &cfg);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].message.contains("'undeclared' is not defined"));

    let messages = verify("/* global undeclared */\nundeclared(1);\n", &cfg);
    assert!(messages.is_empty());
}

#[test]
fn test_eslint_env_resolves_globals() {
    let cfg = config(json!({ "no-undef": 2 }));
    let messages = verify("window.alert(1);\n", &cfg);
    assert_eq!(messages.len(), 1);

    let messages = verify("/* eslint-env browser */\nwindow.alert(1);\n", &cfg);
    assert!(messages.is_empty());
}

#[test]
fn test_exported_marks_variables_used() {
    let cfg = config(json!({ "no-unused-vars": 2 }));
    let messages = verify("var helper = 1;\n", &cfg);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].message.contains("'helper' is defined but never used"));

    let messages = verify("/* exported helper */\nvar helper = 1;\n", &cfg);
    assert!(messages.is_empty());
}

#[test]
fn test_unreachable_code_after_return() {
    let cfg = config(json!({ "no-unreachable": 2 }));
    let messages = verify(
        "function f() {\n  return 1;\n  g();\n}\nf();\nfunction g() {}\n",
        &cfg,
    );
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].line, 3);
    assert_eq!(messages[0].message, "Unreachable code.");
}

#[test]
fn test_code_after_conditional_return_is_reachable() {
    let cfg = config(json!({ "no-unreachable": 2 }));
    let messages = verify(
        "function f(a) {\n  if (a) {\n    return 1;\n  }\n  return 2;\n}\nf(1);\n",
        &cfg,
    );
    assert!(messages.is_empty());
}

#[test]
fn test_code_after_exhaustive_if_else_is_unreachable() {
    let cfg = config(json!({ "no-unreachable": 2 }));
    let messages = verify(
        "function f(a) {\n  if (a) {\n    return 1;\n  } else {\n    return 2;\n  }\n  a();\n}\nf(1);\n",
        &cfg,
    );
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].line, 7);
}

#[test]
fn test_code_after_break_is_unreachable_inside_loop() {
    let cfg = config(json!({ "no-unreachable": 2 }));
    let messages = verify(
        "while (cond()) {\n  break;\n  after();\n}\ndone();\nfunction cond() {}\nfunction after() {}\nfunction done() {}\n",
        &cfg,
    );
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].line, 3);
}

#[test]
fn test_no_empty_respects_comments_and_options() {
    let cfg = config(json!({ "no-empty": 2 }));
    let messages = verify("if (x) {}\nvar x;\n", &cfg);
    assert_eq!(messages.len(), 1);

    let messages = verify("if (x) { /* intentional */ }\nvar x;\n", &cfg);
    assert!(messages.is_empty());

    let cfg = config(json!({ "no-empty": ["error", { "allowEmptyCatch": true }] }));
    let messages = verify("try { f(); } catch (e) {}\nfunction f() {}\n", &cfg);
    assert!(messages.is_empty());
}

#[test]
fn test_unknown_rule_produces_synthetic_problem() {
    let messages = verify("var x = 1;\n", &config(json!({ "imaginary-rule": 2 })));
    assert_eq!(messages.len(), 1);
    assert_eq!((messages[0].line, messages[0].column), (1, 1));
    assert!(messages[0]
        .message
        .contains("Definition for rule 'imaginary-rule' was not found"));

    let messages = verify("var x = 1;\n", &config(json!({ "no-comma-dangle": 2 })));
    assert!(messages[0].message.contains("was removed and replaced by"));
}

struct ExplodingRule {
    meta: RuleMeta,
}

impl Rule for ExplodingRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }
    fn create(&self, _ctx: &ecma_linter::RuleContext<'_>) -> Result<Vec<RuleListener>, RuleError> {
        Ok(vec![RuleListener::node("Identifier", |_ctx, _node| {
            Err(RuleError::Other("listener blew up".to_string()))
        })])
    }
}

#[test]
fn test_rule_runtime_error_propagates_with_rule_id() {
    let mut linter = Linter::new();
    linter.define_rule(
        "exploding",
        Arc::new(ExplodingRule {
            meta: RuleMeta::new(RuleType::Problem),
        }),
    );
    let error = linter
        .verify(
            SourceInput::Text("var x = 1;\n"),
            &config(json!({ "exploding": 2 })),
            &VerifyOptions::default(),
        )
        .unwrap_err();
    let text = error.to_string();
    assert!(text.contains("exploding"), "error names the rule: {text}");
    assert!(text.contains("listener blew up"));
}

#[test]
fn test_fix_predicate_limits_applied_fixes() {
    let cfg = config(json!({ "no-var": 1, "semi": ["error", "always"] }));
    let options = VerifyOptions {
        fix: FixSelect::Predicate(Arc::new(|m| m.severity == Severity::Error)),
        ..VerifyOptions::default()
    };
    let report = Linter::new()
        .verify_and_fix("var x = 1\n", &cfg, &options)
        .unwrap();
    assert!(report.fixed);
    assert_eq!(report.output, "var x = 1;\n", "only the error-level fix ran");
    // The warning survives with its fix unapplied.
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].rule_id.as_deref(), Some("no-var"));
}

#[test]
fn test_suggestions_are_never_auto_applied() {
    let cfg = config(json!({ "prefer-const": 1 }));
    let messages = verify("let x = 1; use(x);\nfunction use(a) { return a; }\n", &cfg);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].suggestions.len(), 1);
    assert_eq!(messages[0].suggestions[0].desc, "Change 'let' to 'const'.");

    let report = Linter::new()
        .verify_and_fix("let x = 1; use(x);\nfunction use(a) { return a; }\n", &cfg, &VerifyOptions::default())
        .unwrap();
    assert!(!report.fixed, "suggestions are advisory only");
}

#[test]
fn test_semi_never_mode() {
    let cfg = config(json!({ "semi": ["error", "never"] }));
    let report = Linter::new()
        .verify_and_fix("var x = 1;\n", &cfg, &VerifyOptions::default())
        .unwrap();
    assert!(report.fixed);
    assert_eq!(report.output, "var x = 1\n");
}

#[test]
fn test_no_debugger_fix() {
    let cfg = config(json!({ "no-debugger": 2 }));
    let report = Linter::new()
        .verify_and_fix("debugger;\nvar x = 1;\n", &cfg, &VerifyOptions::default())
        .unwrap();
    assert!(report.fixed);
    assert!(!report.output.contains("debugger"));
}

#[test]
fn test_selector_specificity_orders_reports() {
    struct TagRule {
        meta: RuleMeta,
        selector: &'static str,
        tag: &'static str,
    }
    impl Rule for TagRule {
        fn meta(&self) -> &RuleMeta {
            &self.meta
        }
        fn create(
            &self,
            _ctx: &ecma_linter::RuleContext<'_>,
        ) -> Result<Vec<RuleListener>, RuleError> {
            let tag = self.tag;
            Ok(vec![RuleListener::node(self.selector, move |ctx, node| {
                ctx.report(Report::on(node).message(tag))
            })])
        }
    }

    let mut linter = Linter::new();
    // Registered first but less specific: must fire second.
    linter.define_rule(
        "a-generic",
        Arc::new(TagRule {
            meta: RuleMeta::new(RuleType::Problem),
            selector: "VariableDeclaration",
            tag: "generic",
        }),
    );
    linter.define_rule(
        "b-specific",
        Arc::new(TagRule {
            meta: RuleMeta::new(RuleType::Problem),
            selector: "VariableDeclaration[kind=var]",
            tag: "specific",
        }),
    );
    let messages = linter
        .verify(
            SourceInput::Text("var x = 1;\n"),
            &config(json!({ "a-generic": 2, "b-specific": 2 })),
            &VerifyOptions::default(),
        )
        .unwrap();
    assert_eq!(messages.len(), 2);
    // Same position; the stable applier preserves emission order.
    assert_eq!(messages[0].message, "specific");
    assert_eq!(messages[1].message, "generic");
}

#[test]
fn test_justification_recorded_on_suppression() {
    // Suppressed problems leave `verify`'s output; check via the directive
    // being counted as used (no unused-directive report).
    let text = "// eslint-disable-next-line no-var -- legacy interop\nvar x=1;\n";
    let options = VerifyOptions {
        report_unused_disable_directives: UnusedDirectivesMode::Error,
        ..VerifyOptions::default()
    };
    let messages = Linter::new()
        .verify(SourceInput::Text(text), &config(json!({ "no-var": 2 })), &options)
        .unwrap();
    assert!(messages.is_empty());
}

#[test]
fn test_multiline_block_comment_disable_next_line() {
    let cfg = config(json!({ "no-var": 2 }));

    // Suppresses the line after the comment's end line.
    let used = "/* eslint-disable-next-line\n   no-var */\nvar x = 1;\n";
    assert!(verify(used, &cfg).is_empty());

    // Unused: reported at the comment's end line, and the removal fix
    // takes out every line the comment occupies.
    let unused = "/* eslint-disable-next-line\n   no-var */\nlet x = 1;\n";
    let options = VerifyOptions {
        report_unused_disable_directives: UnusedDirectivesMode::Error,
        ..VerifyOptions::default()
    };
    let messages = Linter::new()
        .verify(SourceInput::Text(unused), &cfg, &options)
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].message.contains("Unused eslint-disable-next-line"));
    assert_eq!(messages[0].line, 2);
    let fix = messages[0].fix.as_ref().expect("removal fix present");
    let mut fixed = unused.to_string();
    fixed.replace_range(fix.range.start..fix.range.end, &fix.text);
    assert_eq!(fixed, "let x = 1;\n");
}

#[test]
fn test_shebang_is_not_a_directive_or_problem() {
    let messages = verify("#!/usr/bin/env node\nvar x = 1;\n", &config(json!({ "no-var": 2 })));
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].line, 2);
}

#[test]
fn test_processor_blocks_are_linted_and_merged() {
    use ecma_linter::{CodeBlock, Processor};

    // A toy processor: blocks are separated by a `---` line.
    let preprocess = Arc::new(|text: &str, filename: &str| {
        text.split("---\n")
            .enumerate()
            .map(|(i, chunk)| CodeBlock {
                filename: format!("{filename}/{i}.js"),
                text: chunk.to_string(),
            })
            .collect::<Vec<_>>()
    });
    let postprocess = Arc::new(|blocks: Vec<Vec<ecma_linter::LintMessage>>, _filename: &str| {
        blocks.into_iter().flatten().collect::<Vec<_>>()
    });
    let options = VerifyOptions {
        processor: Some(Processor {
            preprocess,
            postprocess,
            filter_code_block: Some(Arc::new(|block: &CodeBlock| {
                !block.filename.ends_with("/1.js")
            })),
        }),
        ..VerifyOptions::default()
    };

    let text = "var a = 1;\n---\nvar b = 2;\n---\nvar c = 3;\n";
    let messages = Linter::new()
        .verify(SourceInput::Text(text), &config(json!({ "no-var": 2 })), &options)
        .unwrap();
    // Block 1 was filtered out; blocks 0 and 2 each report once.
    assert_eq!(messages.len(), 2);
}
