//! Rule configuration: severities, per-rule options, globals, environments,
//! and language options.
//!
//! A configuration is sealed when a lint run starts; inline directives
//! produce a [`ConfigOverlay`] that shadows the base for that file only.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::linter::Parser;

/// Severity level for a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Off,
    Warn,
    Error,
}

impl Severity {
    /// Numeric form used in the stable output shape.
    #[must_use]
    pub const fn as_number(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Warn => 1,
            Self::Error => 2,
        }
    }

    /// Parse from a JSON severity value (`0|1|2` or `"off"|"warn"|"error"`).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match n.as_u64()? {
                0 => Some(Self::Off),
                1 => Some(Self::Warn),
                2 => Some(Self::Error),
                _ => None,
            },
            Value::String(s) => match s.as_str() {
                "off" => Some(Self::Off),
                "warn" => Some(Self::Warn),
                "error" => Some(Self::Error),
                _ => None,
            },
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_number())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeverityVisitor;

        impl Visitor<'_> for SeverityVisitor {
            type Value = Severity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("0, 1, 2, \"off\", \"warn\", or \"error\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Severity, E> {
                match v {
                    0 => Ok(Severity::Off),
                    1 => Ok(Severity::Warn),
                    2 => Ok(Severity::Error),
                    _ => Err(E::custom(format!("invalid severity number: {v}"))),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Severity, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("invalid severity number: {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Severity, E> {
                match v {
                    "off" => Ok(Severity::Off),
                    "warn" => Ok(Severity::Warn),
                    "error" => Ok(Severity::Error),
                    _ => Err(E::custom(format!("invalid severity string: {v:?}"))),
                }
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}

/// Configuration of a single rule: severity plus rule-specific options.
///
/// Deserializes from a bare severity (`"error"`, `2`) or a
/// `[severity, ...options]` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleEntry {
    pub severity: Severity,
    pub options: Vec<Value>,
}

impl RuleEntry {
    #[must_use]
    pub fn new(severity: Severity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<Value>) -> Self {
        self.options = options;
        self
    }

    /// Normalize a JSON rule-config value. Returns `None` for malformed
    /// entries (bad severity, empty array).
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => {
                let severity = Severity::from_value(items.first()?)?;
                Some(Self {
                    severity,
                    options: items[1..].to_vec(),
                })
            }
            other => Severity::from_value(other).map(Self::new),
        }
    }
}

impl<'de> Deserialize<'de> for RuleEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| de::Error::custom(format!("invalid rule entry: {value}")))
    }
}

/// Declared writability of a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalValue {
    Readonly,
    Writable,
    Off,
}

impl GlobalValue {
    /// Parse the directive-comment spellings, including the legacy aliases.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "readonly" | "readable" | "false" => Some(Self::Readonly),
            "writable" | "writeable" | "true" => Some(Self::Writable),
            "off" => Some(Self::Off),
            _ => None,
        }
    }
}

/// `sourceType` language option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
    Commonjs,
}

/// `ecmaVersion` language option: a year, or "newest the parser supports".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcmaVersion {
    Latest,
    Year(u16),
}

impl Default for EcmaVersion {
    fn default() -> Self {
        Self::Latest
    }
}

impl Serialize for EcmaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Latest => serializer.serialize_str("latest"),
            Self::Year(year) => serializer.serialize_u16(*year),
        }
    }
}

impl<'de> Deserialize<'de> for EcmaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::String(s) if s == "latest" => Ok(Self::Latest),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .map(Self::Year)
                .ok_or_else(|| de::Error::custom(format!("invalid ecmaVersion: {value}"))),
            _ => Err(de::Error::custom(format!("invalid ecmaVersion: {value}"))),
        }
    }
}

/// Language options forwarded to the parser and exposed to rules.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageOptions {
    #[serde(default)]
    pub ecma_version: EcmaVersion,
    #[serde(default)]
    pub source_type: SourceType,
    /// The parser collaborator. Not serializable; installed in code.
    #[serde(skip)]
    pub parser: Option<Arc<dyn Parser>>,
}

impl fmt::Debug for LanguageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageOptions")
            .field("ecma_version", &self.ecma_version)
            .field("source_type", &self.source_type)
            .field("parser", &self.parser.as_ref().map(|_| "<parser>"))
            .finish()
    }
}

/// The sealed per-run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LintConfig {
    pub rules: HashMap<String, RuleEntry>,
    pub globals: HashMap<String, GlobalValue>,
    pub env: Vec<String>,
    pub language_options: LanguageOptions,
    pub settings: serde_json::Map<String, Value>,
}

impl LintConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable a rule at a severity (test and embedding convenience).
    #[must_use]
    pub fn with_rule(mut self, rule_id: &str, entry: RuleEntry) -> Self {
        self.rules.insert(rule_id.to_string(), entry);
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn Parser>) -> Self {
        self.language_options.parser = Some(parser);
        self
    }

    /// All globals implied by the configuration: explicit `globals` plus
    /// the resolved `env` sets. Returns `(name, writable)` pairs; globals
    /// turned `off` are omitted.
    #[must_use]
    pub fn resolved_globals(&self) -> Vec<(String, bool)> {
        let mut merged: HashMap<&str, GlobalValue> = HashMap::new();
        for env in &self.env {
            if let Some(globals) = environment_globals(env) {
                for (name, writable) in globals {
                    merged.insert(
                        name,
                        if *writable {
                            GlobalValue::Writable
                        } else {
                            GlobalValue::Readonly
                        },
                    );
                }
            }
        }
        for (name, value) in &self.globals {
            merged.insert(name, *value);
        }
        let mut out: Vec<(String, bool)> = merged
            .into_iter()
            .filter(|(_, value)| *value != GlobalValue::Off)
            .map(|(name, value)| (name.to_string(), value == GlobalValue::Writable))
            .collect();
        out.sort();
        out
    }
}

/// Per-file overlay produced by inline `eslint` configuration comments.
/// Shadows the base configuration for the rules it names.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverlay {
    rules: HashMap<String, RuleEntry>,
}

impl ConfigOverlay {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, rule_id: &str, entry: RuleEntry) {
        self.rules.insert(rule_id.to_string(), entry);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The effective entry for a rule: overlay first, then base.
    #[must_use]
    pub fn effective<'c>(&'c self, base: &'c LintConfig, rule_id: &str) -> Option<&'c RuleEntry> {
        self.rules.get(rule_id).or_else(|| base.rules.get(rule_id))
    }

    /// Rule ids configured in either layer.
    #[must_use]
    pub fn rule_ids<'c>(&'c self, base: &'c LintConfig) -> Vec<&'c str> {
        let mut ids: Vec<&str> = base
            .rules
            .keys()
            .chain(self.rules.keys())
            .map(String::as_str)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Globals contributed by a named environment, as `(name, writable)` pairs.
#[must_use]
pub fn environment_globals(name: &str) -> Option<&'static [(&'static str, bool)]> {
    const BUILTIN: &[(&str, bool)] = &[
        ("Array", false),
        ("Boolean", false),
        ("Date", false),
        ("Error", false),
        ("Function", false),
        ("Infinity", false),
        ("JSON", false),
        ("Math", false),
        ("NaN", false),
        ("Number", false),
        ("Object", false),
        ("RangeError", false),
        ("ReferenceError", false),
        ("RegExp", false),
        ("String", false),
        ("SyntaxError", false),
        ("TypeError", false),
        ("decodeURI", false),
        ("decodeURIComponent", false),
        ("encodeURI", false),
        ("encodeURIComponent", false),
        ("isFinite", false),
        ("isNaN", false),
        ("parseFloat", false),
        ("parseInt", false),
        ("undefined", false),
    ];
    const ES2015: &[(&str, bool)] = &[
        ("Map", false),
        ("Promise", false),
        ("Proxy", false),
        ("Reflect", false),
        ("Set", false),
        ("Symbol", false),
        ("WeakMap", false),
        ("WeakSet", false),
    ];
    const ES2020: &[(&str, bool)] = &[("BigInt", false), ("globalThis", false)];
    const ES2021: &[(&str, bool)] = &[("FinalizationRegistry", false), ("WeakRef", false)];
    const BROWSER: &[(&str, bool)] = &[
        ("alert", false),
        ("clearInterval", false),
        ("clearTimeout", false),
        ("console", false),
        ("document", false),
        ("fetch", false),
        ("history", false),
        ("localStorage", false),
        ("location", false),
        ("navigator", false),
        ("sessionStorage", false),
        ("setInterval", false),
        ("setTimeout", false),
        ("window", false),
    ];
    const NODE: &[(&str, bool)] = &[
        ("Buffer", false),
        ("__dirname", false),
        ("__filename", false),
        ("clearInterval", false),
        ("clearTimeout", false),
        ("console", false),
        ("exports", true),
        ("global", false),
        ("module", false),
        ("process", false),
        ("require", false),
        ("setInterval", false),
        ("setTimeout", false),
    ];
    match name {
        "builtin" => Some(BUILTIN),
        "es6" | "es2015" | "es2016" | "es2017" | "es2018" | "es2019" => Some(ES2015),
        "es2020" => Some(ES2020),
        "es2021" | "es2022" | "es2023" | "es2024" => Some(ES2021),
        "browser" => Some(BROWSER),
        "node" => Some(NODE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_from_number_and_string() {
        let config: LintConfig = serde_json::from_str(
            r#"{ "rules": { "no-var": 2, "semi": "warn", "no-empty": ["error", { "allowEmptyCatch": true }] } }"#,
        )
        .unwrap();
        assert_eq!(config.rules["no-var"].severity, Severity::Error);
        assert_eq!(config.rules["semi"].severity, Severity::Warn);
        assert_eq!(config.rules["no-empty"].severity, Severity::Error);
        assert_eq!(config.rules["no-empty"].options.len(), 1);
    }

    #[test]
    fn test_invalid_severity_rejected() {
        let result: Result<LintConfig, _> =
            serde_json::from_str(r#"{ "rules": { "no-var": "loud" } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_globals_deserialize() {
        let config: LintConfig = serde_json::from_str(
            r#"{ "globals": { "window": "readonly", "custom": "writable" } }"#,
        )
        .unwrap();
        assert_eq!(config.globals["window"], GlobalValue::Readonly);
        assert_eq!(config.globals["custom"], GlobalValue::Writable);
    }

    #[test]
    fn test_env_resolution_merges_globals() {
        let config: LintConfig = serde_json::from_str(
            r#"{ "env": ["browser"], "globals": { "window": "off", "myGlobal": "writable" } }"#,
        )
        .unwrap();
        let globals = config.resolved_globals();
        assert!(globals.iter().any(|(n, w)| n == "myGlobal" && *w));
        assert!(globals.iter().any(|(n, _)| n == "document"));
        assert!(
            !globals.iter().any(|(n, _)| n == "window"),
            "off globals are omitted"
        );
    }

    #[test]
    fn test_ecma_version() {
        let options: LanguageOptions =
            serde_json::from_str(r#"{ "ecmaVersion": 2022, "sourceType": "module" }"#).unwrap();
        assert_eq!(options.ecma_version, EcmaVersion::Year(2022));
        assert_eq!(options.source_type, SourceType::Module);

        let options: LanguageOptions = serde_json::from_str(r#"{ "ecmaVersion": "latest" }"#).unwrap();
        assert_eq!(options.ecma_version, EcmaVersion::Latest);
    }

    #[test]
    fn test_overlay_shadows_base() {
        let base = LintConfig::new().with_rule("no-var", RuleEntry::new(Severity::Error));
        let mut overlay = ConfigOverlay::new();
        assert_eq!(
            overlay.effective(&base, "no-var").unwrap().severity,
            Severity::Error
        );
        overlay.set("no-var", RuleEntry::new(Severity::Off));
        assert_eq!(
            overlay.effective(&base, "no-var").unwrap().severity,
            Severity::Off
        );
    }
}
