//! Validation outcomes, failure reports and the error taxonomy
//!
//! Architecture: Rich Domain Models - Failures carry their document and position
//! - ValidationReport is the aggregate root of one validation run
//! - Failure order always mirrors document iteration order

use crate::domain::documents::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a per-document failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The document could not be read
    Io,
    /// The frontmatter is not valid YAML
    YamlParse,
    /// The frontmatter parsed to an empty or unusable value
    EmptyYaml,
}

impl FailureKind {
    /// Convert to string for display
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Io => "io",
            Self::YamlParse => "yaml_parse",
            Self::EmptyYaml => "empty_yaml",
        }
    }
}

/// Why a single document failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// The document that failed
    pub document: Document,
    /// Category of the failure
    pub kind: FailureKind,
    /// Human-readable diagnostic
    pub message: String,
    /// Line number (1-indexed) in the document, when known
    pub line_number: Option<u32>,
    /// Column number (1-indexed) in the document, when known
    pub column_number: Option<u32>,
}

impl Failure {
    /// Create a new failure
    pub fn new(document: Document, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            document,
            kind,
            message: message.into(),
            line_number: None,
            column_number: None,
        }
    }

    /// Set line and column position
    pub fn with_position(mut self, line: u32, column: u32) -> Self {
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }

    /// Format failure for display
    pub fn format_display(&self) -> String {
        let location = match (self.line_number, self.column_number) {
            (Some(line), Some(col)) => format!(":{line}:{col}"),
            (Some(line), None) => format!(":{line}"),
            _ => String::new(),
        };

        format!(
            "{}{} [{}] {}",
            self.document,
            location,
            self.kind.as_str(),
            self.message
        )
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Invalid(Failure),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The failure, if the document was invalid
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Valid => None,
            Self::Invalid(failure) => Some(failure),
        }
    }
}

/// Signal handed to a report sink alongside the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySignal {
    /// Every document passed
    AllValid,
    /// This many documents failed
    FoundErrors(usize),
}

/// Count of failures by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureCounts {
    pub io: usize,
    pub yaml_parse: usize,
    pub empty_yaml: usize,
}

impl FailureCounts {
    /// Total number of failures across all kinds
    pub fn total(&self) -> usize {
        self.io + self.yaml_parse + self.empty_yaml
    }

    /// Add a failure to the counts
    pub fn add(&mut self, kind: FailureKind) {
        match kind {
            FailureKind::Io => self.io += 1,
            FailureKind::YamlParse => self.yaml_parse += 1,
            FailureKind::EmptyYaml => self.empty_yaml += 1,
        }
    }
}

/// Summary statistics for a validation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Total number of documents processed
    pub total_documents: usize,
    /// Documents with a complete frontmatter block
    pub with_frontmatter: usize,
    /// Documents without any frontmatter block
    pub without_frontmatter: usize,
    /// Documents whose opening delimiter is never closed
    pub unterminated: usize,
    /// Number of failures by kind
    pub failures_by_kind: FailureCounts,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
    /// Timestamp when validation was performed
    pub validated_at: DateTime<Utc>,
}

/// Every failure of one run, in document iteration order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Failing documents with their diagnostics
    pub failures: Vec<Failure>,
    /// Summary statistics
    pub summary: ValidationSummary,
    /// Configuration used for this validation
    pub config_fingerprint: Option<String>,
}

impl ValidationReport {
    /// Create a new empty validation report
    pub fn new() -> Self {
        Self {
            failures: Vec::new(),
            summary: ValidationSummary {
                validated_at: Utc::now(),
                ..Default::default()
            },
            config_fingerprint: None,
        }
    }

    /// Append a failure to the report
    pub fn add_failure(&mut self, failure: Failure) {
        self.summary.failures_by_kind.add(failure.kind);
        self.failures.push(failure);
    }

    /// Whether any document failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of failing documents
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Summary signal for the report sink
    pub fn signal(&self) -> SummarySignal {
        if self.failures.is_empty() {
            SummarySignal::AllValid
        } else {
            SummarySignal::FoundErrors(self.failures.len())
        }
    }

    /// Failures of a specific kind
    pub fn failures_of_kind(&self, kind: FailureKind) -> impl Iterator<Item = &Failure> {
        self.failures.iter().filter(move |f| f.kind == kind)
    }

    /// Whether the given document is in the report
    pub fn contains(&self, document: &Document) -> bool {
        self.failures.iter().any(|f| &f.document == document)
    }

    /// Set the number of documents processed
    pub fn set_documents_processed(&mut self, count: usize) {
        self.summary.total_documents = count;
    }

    /// Set the execution time
    pub fn set_execution_time(&mut self, duration_ms: u64) {
        self.summary.execution_time_ms = duration_ms;
    }

    /// Set the configuration fingerprint
    pub fn set_config_fingerprint(&mut self, fingerprint: impl Into<String>) {
        self.config_fingerprint = Some(fingerprint.into());
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Error types for operations outside the per-document loop
#[derive(Debug, thiserror::Error)]
pub enum CheckerError {
    /// Configuration file could not be loaded, parsed or validated
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// File could not be read or written
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// Path pattern compilation failed
    #[error("Pattern error: {message}")]
    Pattern { message: String },

    /// Document store could not list its documents
    #[error("Document store error: {message}")]
    Store { message: String },

    /// Report could not be rendered or delivered
    #[error("Report error: {message}")]
    Report { message: String },
}

impl CheckerError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a pattern error
    pub fn pattern(message: impl Into<String>) -> Self {
        Self::Pattern {
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a report error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report {
            message: message.into(),
        }
    }
}

/// Result type for YAML Checker operations
pub type CheckerResult<T> = Result<T, CheckerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_creation() {
        let failure = Failure::new(
            Document::new("notes/a.md"),
            FailureKind::YamlParse,
            "did not find expected node content",
        )
        .with_position(3, 7);

        assert_eq!(failure.kind, FailureKind::YamlParse);
        assert_eq!(failure.line_number, Some(3));
        assert_eq!(
            failure.format_display(),
            "notes/a.md:3:7 [yaml_parse] did not find expected node content"
        );
    }

    #[test]
    fn test_report_counts_and_signal() {
        let mut report = ValidationReport::new();
        assert_eq!(report.signal(), SummarySignal::AllValid);

        report.add_failure(Failure::new(
            Document::new("a.md"),
            FailureKind::YamlParse,
            "bad",
        ));
        report.add_failure(Failure::new(
            Document::new("b.md"),
            FailureKind::EmptyYaml,
            "empty",
        ));

        assert!(report.has_failures());
        assert_eq!(report.signal(), SummarySignal::FoundErrors(2));
        assert_eq!(report.summary.failures_by_kind.total(), 2);
        assert_eq!(report.summary.failures_by_kind.empty_yaml, 1);
        assert!(report.contains(&Document::new("a.md")));
        assert!(!report.contains(&Document::new("c.md")));
        assert_eq!(report.failures_of_kind(FailureKind::YamlParse).count(), 1);
    }

    #[test]
    fn test_outcome_accessors() {
        assert!(ValidationOutcome::Valid.is_valid());
        let outcome = ValidationOutcome::Invalid(Failure::new(
            Document::new("x.md"),
            FailureKind::Io,
            "missing",
        ));
        assert!(!outcome.is_valid());
        assert_eq!(outcome.failure().map(|f| f.kind), Some(FailureKind::Io));
    }
}
