//! Severity policy for resolution outcomes and consistency errors.
//!
//! The resolver itself is policy-free: it reports structured results, and callers map each
//! [`DiagnosticKind`] to a [`Severity`] through an [`OverloadConfig`], typically loaded from the
//! `[overload]`-style TOML table of a project config.

use std::path::Path;
use std::sync::OnceLock;

use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

/// Every outcome the resolver or the consistency checker can report.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    NotApplicable,
    Ambiguous,
    NameClash,
    DuplicateMethod,
    IncompatibleInheritedReturnTypes,
    DuplicateInheritedDefault,
    IncompatibleReturnType,
    UncheckedConversion,
    UncheckedVarargs,
}

impl DiagnosticKind {
    pub const ALL: [DiagnosticKind; 9] = [
        DiagnosticKind::NotApplicable,
        DiagnosticKind::Ambiguous,
        DiagnosticKind::NameClash,
        DiagnosticKind::DuplicateMethod,
        DiagnosticKind::IncompatibleInheritedReturnTypes,
        DiagnosticKind::DuplicateInheritedDefault,
        DiagnosticKind::IncompatibleReturnType,
        DiagnosticKind::UncheckedConversion,
        DiagnosticKind::UncheckedVarargs,
    ];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Ignore,
}

/// Explicit per-kind severities; unset kinds fall back to the language-level defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_applicable: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambiguous: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_clash: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_method: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incompatible_inherited_return_types: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_inherited_default: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incompatible_return_type: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unchecked_conversion: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unchecked_varargs: Option<Severity>,
}

impl SeverityOverrides {
    pub fn get(&self, kind: DiagnosticKind) -> Option<Severity> {
        *self.slot(kind)
    }

    pub fn set(&mut self, kind: DiagnosticKind, severity: Option<Severity>) {
        *self.slot_mut(kind) = severity;
    }

    fn slot(&self, kind: DiagnosticKind) -> &Option<Severity> {
        match kind {
            DiagnosticKind::NotApplicable => &self.not_applicable,
            DiagnosticKind::Ambiguous => &self.ambiguous,
            DiagnosticKind::NameClash => &self.name_clash,
            DiagnosticKind::DuplicateMethod => &self.duplicate_method,
            DiagnosticKind::IncompatibleInheritedReturnTypes => {
                &self.incompatible_inherited_return_types
            }
            DiagnosticKind::DuplicateInheritedDefault => &self.duplicate_inherited_default,
            DiagnosticKind::IncompatibleReturnType => &self.incompatible_return_type,
            DiagnosticKind::UncheckedConversion => &self.unchecked_conversion,
            DiagnosticKind::UncheckedVarargs => &self.unchecked_varargs,
        }
    }

    fn slot_mut(&mut self, kind: DiagnosticKind) -> &mut Option<Severity> {
        match kind {
            DiagnosticKind::NotApplicable => &mut self.not_applicable,
            DiagnosticKind::Ambiguous => &mut self.ambiguous,
            DiagnosticKind::NameClash => &mut self.name_clash,
            DiagnosticKind::DuplicateMethod => &mut self.duplicate_method,
            DiagnosticKind::IncompatibleInheritedReturnTypes => {
                &mut self.incompatible_inherited_return_types
            }
            DiagnosticKind::DuplicateInheritedDefault => &mut self.duplicate_inherited_default,
            DiagnosticKind::IncompatibleReturnType => &mut self.incompatible_return_type,
            DiagnosticKind::UncheckedConversion => &mut self.unchecked_conversion,
            DiagnosticKind::UncheckedVarargs => &mut self.unchecked_varargs,
        }
    }
}

fn default_language_level() -> u16 {
    8
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct OverloadConfig {
    /// Java feature release the sources are checked against (`6`, `8`, `17`, ...).
    #[serde(default = "default_language_level")]
    #[schemars(range(min = 1))]
    pub language_level: u16,
    #[serde(default)]
    pub severity: SeverityOverrides,
}

impl Default for OverloadConfig {
    fn default() -> Self {
        Self {
            language_level: default_language_level(),
            severity: SeverityOverrides::default(),
        }
    }
}

impl OverloadConfig {
    pub fn severity_of(&self, kind: DiagnosticKind) -> Severity {
        if let Some(severity) = self.severity.get(kind) {
            return severity;
        }
        match kind {
            DiagnosticKind::UncheckedConversion | DiagnosticKind::UncheckedVarargs => {
                Severity::Warning
            }
            // javac 6 only warned about erasure clashes.
            DiagnosticKind::NameClash if self.language_level <= 6 => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_error(&self, kind: DiagnosticKind) -> bool {
        self.severity_of(kind) == Severity::Error
    }

    pub fn load_from_str(text: &str) -> Result<Self, ConfigError> {
        let config: OverloadConfig = toml::from_str(text)?;
        tracing::debug!(
            target: "nova.overload",
            language_level = config.language_level,
            "loaded overload config"
        );
        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::load_from_str(&text)
    }
}

/// JSON schema for the overload config table.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(OverloadConfig)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` form carries a source snippet; keep only the message.
        ConfigError::Toml(sanitize_toml_error_message(err.message()))
    }
}

/// Redact user-provided values from a serde/toml error message, keeping schema names.
fn sanitize_toml_error_message(message: &str) -> String {
    static QUOTED: OnceLock<Option<regex::Regex>> = OnceLock::new();
    static BACKTICKED_VALUE: OnceLock<Option<regex::Regex>> = OnceLock::new();

    let mut out = message.to_string();
    if let Some(re) = QUOTED.get_or_init(|| regex::Regex::new(r#""(?:\\.|[^"\\])*""#).ok()) {
        out = re.replace_all(&out, r#""<redacted>""#).into_owned();
    }
    // `unknown field `x``, `unknown variant `x``, `invalid type: integer `3``.
    if let Some(re) = BACKTICKED_VALUE.get_or_init(|| {
        regex::Regex::new(r"(unknown field|unknown variant|invalid type: [a-z ]+|invalid value: [a-z ]+) `[^`]*`").ok()
    }) {
        out = re.replace_all(&out, "$1 `<redacted>`").into_owned();
    }
    out
}
