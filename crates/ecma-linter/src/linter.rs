//! The linter facade: `verify` and `verify_and_fix`.
//!
//! `verify` lints one file: parse (or accept a pre-parsed source-code
//! object), apply inline directives, run the rules, filter through the
//! disable-directive applier. `verify_and_fix` wraps it in the bounded
//! parse → lint → fix loop.

use std::sync::Arc;

use ecma_ast::{ScopeManager, SyntaxTree, Token};
use ecma_source::{ParserServices, SourceCode, VisitorKeyOverrides};

use crate::config::{
    environment_globals, ConfigOverlay, EcmaVersion, GlobalValue, LintConfig, RuleEntry, Severity,
    SourceType,
};
use crate::diagnostics::LintMessage;
use crate::directives::{parse_directives, InlineDirectives};
use crate::error::LinterError;
use crate::fixer::apply_fixes;
use crate::registry::RuleRegistry;
use crate::rule::Rule;
use crate::runner::run_rules;
use crate::suppress::{apply_disable_directives, UnusedDirectivesMode};

/// Upper bound on parse → lint → fix iterations.
const MAX_FIX_PASSES: usize = 10;

/// Options forwarded to the parser collaborator.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    pub ecma_version: EcmaVersion,
    pub source_type: SourceType,
}

/// A successful parse: everything the source-code object needs.
#[derive(Debug)]
pub struct ParseResult {
    pub tree: SyntaxTree,
    pub tokens: Vec<Token>,
    pub comments: Vec<Token>,
    pub scopes: ScopeManager,
    pub services: ParserServices,
    pub visitor_keys: Option<VisitorKeyOverrides>,
}

/// A parse failure; becomes the run's single fatal problem.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// The parser collaborator contract.
pub trait Parser: Send + Sync {
    fn parse(&self, text: &str, options: &ParserOptions) -> Result<ParseResult, ParseFailure>;
}

/// Input to `verify`: raw text (requires a configured parser) or an
/// already-parsed source-code object.
pub enum SourceInput<'i> {
    Text(&'i str),
    Parsed(Box<SourceCode>),
}

/// Which fixes `verify_and_fix` may apply.
#[derive(Clone, Default)]
pub enum FixSelect {
    /// Apply every fix.
    #[default]
    All,
    /// Collect fixes but never apply them.
    None,
    /// Apply only fixes whose problem passes the predicate.
    Predicate(Arc<dyn Fn(&LintMessage) -> bool + Send + Sync>),
}

impl FixSelect {
    fn accepts(&self, message: &LintMessage) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Predicate(predicate) => predicate(message),
        }
    }
}

impl std::fmt::Debug for FixSelect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::None => f.write_str("None"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A code block extracted by a processor.
#[derive(Debug, Clone)]
pub struct CodeBlock {
    pub filename: String,
    pub text: String,
}

/// Processor hooks for linting code embedded in other formats.
#[derive(Clone)]
pub struct Processor {
    /// Split the file into lintable blocks.
    pub preprocess: Arc<dyn Fn(&str, &str) -> Vec<CodeBlock> + Send + Sync>,
    /// Merge the per-block message lists back into one.
    pub postprocess: Arc<dyn Fn(Vec<Vec<LintMessage>>, &str) -> Vec<LintMessage> + Send + Sync>,
    /// Decide which blocks to lint. All blocks when absent.
    pub filter_code_block: Option<Arc<dyn Fn(&CodeBlock) -> bool + Send + Sync>>,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Processor { .. }")
    }
}

/// Options accepted by `verify` and `verify_and_fix`.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    pub filename: String,
    pub allow_inline_config: bool,
    pub report_unused_disable_directives: UnusedDirectivesMode,
    pub disable_fixes: bool,
    pub fix: FixSelect,
    pub processor: Option<Processor>,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            filename: "<input>".to_string(),
            allow_inline_config: true,
            report_unused_disable_directives: UnusedDirectivesMode::Off,
            disable_fixes: false,
            fix: FixSelect::All,
            processor: None,
        }
    }
}

/// Result of `verify_and_fix`.
#[derive(Debug)]
pub struct FixReport {
    /// Whether at least one fix was applied across all passes.
    pub fixed: bool,
    /// The final text.
    pub output: String,
    /// Problems remaining in the final text.
    pub messages: Vec<LintMessage>,
}

/// The linting core's facade.
#[derive(Default)]
pub struct Linter {
    registry: RuleRegistry,
}

impl Linter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or shadow) a rule for this linter instance.
    pub fn define_rule(&mut self, id: &str, rule: Arc<dyn Rule>) {
        self.registry.define(id, rule);
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Lint one input. Problems come back ordered by `(line, column)`;
    /// a fatal parse error short-circuits to a single problem.
    pub fn verify(
        &self,
        input: SourceInput<'_>,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        match (&options.processor, &input) {
            (Some(processor), SourceInput::Text(text)) => {
                self.verify_with_processor(text, processor.clone(), config, options)
            }
            _ => self.verify_one(input, config, options),
        }
    }

    fn verify_with_processor(
        &self,
        text: &str,
        processor: Processor,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        let blocks = (processor.preprocess)(text, &options.filename);
        let mut per_block = Vec::new();
        for block in blocks {
            if let Some(filter) = &processor.filter_code_block {
                if !filter(&block) {
                    per_block.push(Vec::new());
                    continue;
                }
            }
            let block_options = VerifyOptions {
                filename: block.filename.clone(),
                processor: None,
                ..options.clone()
            };
            per_block.push(self.verify_one(
                SourceInput::Text(&block.text),
                config,
                &block_options,
            )?);
        }
        Ok((processor.postprocess)(per_block, &options.filename))
    }

    fn verify_one(
        &self,
        input: SourceInput<'_>,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<Vec<LintMessage>, LinterError> {
        let mut source = match input {
            SourceInput::Parsed(source) => {
                validate_source(&source)?;
                *source
            }
            SourceInput::Text(text) => {
                let Some(parser) = config.language_options.parser.clone() else {
                    return Err(LinterError::MissingParser);
                };
                let stripped = text.strip_prefix('\u{feff}').unwrap_or(text);
                let parser_options = ParserOptions {
                    ecma_version: config.language_options.ecma_version,
                    source_type: config.language_options.source_type,
                };
                match parser.parse(stripped, &parser_options) {
                    Ok(result) => {
                        let mut source = SourceCode::new(
                            text,
                            result.tree,
                            result.scopes,
                            result.tokens,
                            result.comments,
                        )
                        .with_parser_services(result.services);
                        if let Some(keys) = result.visitor_keys {
                            source = source.with_visitor_keys(keys);
                        }
                        source
                    }
                    Err(failure) => {
                        return Ok(vec![LintMessage::fatal(
                            failure.message,
                            failure.line.unwrap_or(1),
                            failure.column.unwrap_or(1),
                        )]);
                    }
                }
            }
        };

        let directives = if options.allow_inline_config {
            parse_directives(&source)
        } else {
            InlineDirectives::default()
        };

        let mut problems = directives.problems.clone();

        // Merge configured and directive-declared globals into the global
        // scope, then re-resolve references against them.
        {
            let env_globals: Vec<(String, bool)> = directives
                .envs
                .iter()
                .filter_map(|name| environment_globals(name))
                .flat_map(|globals| {
                    globals
                        .iter()
                        .map(|(name, writable)| ((*name).to_string(), *writable))
                })
                .collect();
            let scopes = source.scopes_mut();
            for (name, writable) in config.resolved_globals() {
                scopes.add_global(&name, writable);
            }
            for (name, writable) in env_globals {
                scopes.add_global(&name, writable);
            }
            for (name, value) in &directives.globals {
                if *value != GlobalValue::Off {
                    scopes.add_global(name, *value == GlobalValue::Writable);
                }
            }
            scopes.resolve();
        }
        for name in &directives.exported {
            let scopes = source.scopes();
            if let Some(variable) = scopes.lookup(scopes.global_scope(), name) {
                scopes.variable(variable).mark_exported();
            }
        }

        let overlay = self.build_overlay(&directives, &mut problems);

        tracing::debug!(
            filename = %options.filename,
            rules = overlay.rule_ids(config).len(),
            directives = directives.disables.len(),
            "starting lint pass"
        );

        problems.extend(run_rules(
            &source,
            config,
            &overlay,
            &self.registry,
            &options.filename,
        )?);

        let is_enabled = |rule_id: &str| {
            overlay
                .effective(config, rule_id)
                .is_none_or(|entry| entry.severity.is_enabled())
        };
        let result = apply_disable_directives(
            &source,
            problems,
            &directives.disables,
            options.report_unused_disable_directives,
            options.disable_fixes,
            &is_enabled,
        );
        Ok(result.messages)
    }

    /// Validate the parsed overlay entries against the registry and build
    /// the per-file configuration overlay.
    fn build_overlay(
        &self,
        directives: &InlineDirectives,
        problems: &mut Vec<LintMessage>,
    ) -> ConfigOverlay {
        let mut overlay = ConfigOverlay::new();
        for over in &directives.rule_overrides {
            if !self.registry.is_known(&over.rule_id) {
                problems.push(LintMessage::core(
                    Severity::Error,
                    RuleRegistry::unknown_rule_message(&over.rule_id),
                    over.line,
                    over.column,
                ));
                continue;
            }
            match RuleEntry::from_value(&over.value) {
                Some(entry) => overlay.set(&over.rule_id, entry),
                None => problems.push(LintMessage::core(
                    Severity::Error,
                    format!(
                        "Inline configuration for rule \"{}\" is invalid: {}",
                        over.rule_id, over.value
                    ),
                    over.line,
                    over.column,
                )),
            }
        }
        overlay
    }

    /// Lint, apply non-conflicting fixes, and repeat until the text settles
    /// or the pass bound is hit. A fatal parse problem aborts the loop.
    pub fn verify_and_fix(
        &self,
        text: &str,
        config: &LintConfig,
        options: &VerifyOptions,
    ) -> Result<FixReport, LinterError> {
        let mut current = text.to_string();
        let mut fixed_any = false;

        for pass in 0..MAX_FIX_PASSES {
            let messages = self.verify(SourceInput::Text(&current), config, options)?;
            if messages.iter().any(|m| m.fatal) {
                tracing::debug!(pass, "fix loop stopped by fatal parse problem");
                return Ok(FixReport {
                    fixed: fixed_any,
                    output: current,
                    messages,
                });
            }

            // Strip fixes the selector rejects; arbitration sees the rest.
            let candidates: Vec<LintMessage> = messages
                .iter()
                .cloned()
                .map(|mut m| {
                    if m.fix.is_some() && !options.fix.accepts(&m) {
                        m.fix = None;
                    }
                    m
                })
                .collect();

            let applied = apply_fixes(&current, candidates);
            if !applied.fixed {
                return Ok(FixReport {
                    fixed: fixed_any,
                    output: current,
                    messages,
                });
            }
            tracing::debug!(pass, "applied fixes, re-entering from parse");
            fixed_any = true;
            current = applied.output;
        }

        // Pass bound reached with fixes still applying: one final verify so
        // the messages describe the final text.
        let messages = self.verify(SourceInput::Text(&current), config, options)?;
        Ok(FixReport {
            fixed: fixed_any,
            output: current,
            messages,
        })
    }
}

/// Reject source-code objects whose token streams violate the contract.
fn validate_source(source: &SourceCode) -> Result<(), LinterError> {
    let len = source.text().len();
    let mut last_start = 0;
    for token in source.token_store().merged() {
        if token.range.end > len || token.range.start > token.range.end {
            return Err(LinterError::InvalidSource(format!(
                "token range [{}, {}) exceeds text length {len}",
                token.range.start, token.range.end
            )));
        }
        if token.range.start < last_start {
            return Err(LinterError::InvalidSource(
                "token stream is not sorted by range start".to_string(),
            ));
        }
        last_start = token.range.start;
    }
    Ok(())
}
