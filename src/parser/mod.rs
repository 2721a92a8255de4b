//! YAML parser capability
//!
//! Architecture: Anti-Corruption Layer - The YAML grammar is a black box behind a trait
//! - Parsers either return a structured value or a diagnostic
//! - Diagnostic positions are relative to the parsed text, not the document

use serde_yaml::Value;
use std::fmt;

/// Why a YAML text could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDiagnostic {
    /// Human-readable parser message
    pub message: String,
    /// 1-based line within the parsed text
    pub line: Option<usize>,
    /// 1-based column within the parsed text
    pub column: Option<usize>,
}

impl ParseDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    pub fn with_location(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseDiagnostic {}

/// A YAML grammar implementation
pub trait YamlParser: Send + Sync {
    /// Parse `text` into a structured value
    fn parse(&self, text: &str) -> Result<Value, ParseDiagnostic>;
}

/// Default parser backed by `serde_yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeYamlParser;

impl YamlParser for SerdeYamlParser {
    fn parse(&self, text: &str) -> Result<Value, ParseDiagnostic> {
        serde_yaml::from_str::<Value>(text).map_err(|e| {
            let diagnostic = ParseDiagnostic::new(e.to_string());
            match e.location() {
                Some(location) => diagnostic.with_location(location.line(), location.column()),
                None => diagnostic,
            }
        })
    }
}

/// Whether a parsed value carries nothing usable.
///
/// Null, `false`, zero and the empty string count as unusable.
pub fn is_unusable(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Sequence(_) | Value::Mapping(_) => false,
        Value::Tagged(tagged) => is_unusable(&tagged.value),
    }
}
