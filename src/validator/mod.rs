//! Batch validation of document frontmatter
//!
//! Architecture: Domain Services - BatchValidator orchestrates a validation run
//! - Each document is read, located, parsed and judged on its own
//! - A failing document never stops the run
//! - Parallel runs collect outcomes in input order before the report is built

use crate::config::CheckerConfig;
use crate::domain::documents::{Document, FrontmatterScan};
use crate::domain::outcomes::{Failure, FailureKind, ValidationOutcome, ValidationReport};
use crate::frontmatter;
use crate::parser::{is_unusable, ParseDiagnostic, SerdeYamlParser, YamlParser};
use crate::store::DocumentStore;
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;

/// Validates the frontmatter of document collections
pub struct BatchValidator {
    /// Configuration for this validator
    config: CheckerConfig,
    /// YAML grammar used for frontmatter content
    parser: Arc<dyn YamlParser>,
}

/// Per-document result together with what the scan saw
#[derive(Debug, Clone)]
struct DocumentResult {
    scan: Option<FrontmatterScan>,
    outcome: ValidationOutcome,
}

impl BatchValidator {
    /// Create a validator using the `serde_yaml` parser
    pub fn new(config: CheckerConfig) -> Self {
        Self::with_parser(config, Arc::new(SerdeYamlParser))
    }

    /// Create a validator with a custom YAML parser
    pub fn with_parser(config: CheckerConfig, parser: Arc<dyn YamlParser>) -> Self {
        Self { config, parser }
    }

    /// Create a validator with default configuration
    pub fn with_defaults() -> Self {
        Self::new(CheckerConfig::default())
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Validate every listed document and build the report
    pub fn validate_all(
        &self,
        documents: &[Document],
        store: &dyn DocumentStore,
    ) -> ValidationReport {
        let start_time = Instant::now();

        let results: Vec<DocumentResult> = if self.config.validation.parallel && documents.len() > 1
        {
            documents
                .par_iter()
                .map(|document| self.check_document(document, store))
                .collect()
        } else {
            documents
                .iter()
                .map(|document| self.check_document(document, store))
                .collect()
        };

        let mut report = ValidationReport::new();

        for result in results {
            match result.scan {
                Some(FrontmatterScan::Present(_)) => report.summary.with_frontmatter += 1,
                Some(FrontmatterScan::Absent) => report.summary.without_frontmatter += 1,
                Some(FrontmatterScan::Unterminated) => {
                    report.summary.without_frontmatter += 1;
                    report.summary.unterminated += 1;
                }
                None => {}
            }

            if let ValidationOutcome::Invalid(failure) = result.outcome {
                report.add_failure(failure);
            }
        }

        report.set_documents_processed(documents.len());
        report.set_execution_time(start_time.elapsed().as_millis() as u64);
        report.set_config_fingerprint(self.config.fingerprint());

        tracing::info!(
            "Validated {} documents, {} failed",
            report.summary.total_documents,
            report.failure_count()
        );

        report
    }

    /// Read one document from the store and validate it
    pub fn validate_document(
        &self,
        document: &Document,
        store: &dyn DocumentStore,
    ) -> ValidationOutcome {
        self.check_document(document, store).outcome
    }

    /// Validate already-loaded document text
    pub fn validate_text(&self, document: &Document, text: &str) -> ValidationOutcome {
        self.check_text(document, text).outcome
    }

    fn check_document(&self, document: &Document, store: &dyn DocumentStore) -> DocumentResult {
        match store.read_text(document) {
            Ok(text) => self.check_text(document, &text),
            Err(e) => {
                tracing::debug!("{}: unreadable: {}", document, e);
                DocumentResult {
                    scan: None,
                    outcome: ValidationOutcome::Invalid(Failure::new(
                        document.clone(),
                        FailureKind::Io,
                        format!("Failed to read document: {e}"),
                    )),
                }
            }
        }
    }

    fn check_text(&self, document: &Document, text: &str) -> DocumentResult {
        let scan = frontmatter::scan(text);

        let span = match scan {
            FrontmatterScan::Present(span) => span,
            FrontmatterScan::Absent => {
                tracing::debug!("{}: no frontmatter", document);
                return DocumentResult {
                    scan: Some(scan),
                    outcome: ValidationOutcome::Valid,
                };
            }
            FrontmatterScan::Unterminated => {
                tracing::debug!("{}: opening delimiter is never closed", document);
                return DocumentResult {
                    scan: Some(scan),
                    outcome: ValidationOutcome::Valid,
                };
            }
        };

        let candidate = span.slice(text);
        if candidate.is_empty() {
            return DocumentResult {
                scan: Some(scan),
                outcome: ValidationOutcome::Valid,
            };
        }

        let outcome = match self.parser.parse(candidate) {
            Ok(value) if self.config.validation.reject_unusable_values && is_unusable(&value) => {
                ValidationOutcome::Invalid(Failure::new(
                    document.clone(),
                    FailureKind::EmptyYaml,
                    format!("Invalid YAML format in file {document}: frontmatter has no usable value"),
                ))
            }
            Ok(_) => ValidationOutcome::Valid,
            Err(diagnostic) => ValidationOutcome::Invalid(parse_failure(
                document,
                diagnostic,
                span.first_line(text),
            )),
        };

        if let ValidationOutcome::Invalid(failure) = &outcome {
            tracing::debug!("{}", failure.format_display());
        }

        DocumentResult {
            scan: Some(scan),
            outcome,
        }
    }
}

/// Translate a parser diagnostic into a failure positioned in the document
fn parse_failure(document: &Document, diagnostic: ParseDiagnostic, first_line: usize) -> Failure {
    let offset = first_line.saturating_sub(1);
    let message = shift_line_numbers(&diagnostic.message, offset);
    let failure = Failure::new(document.clone(), FailureKind::YamlParse, message);

    match (diagnostic.line, diagnostic.column) {
        (Some(line), Some(column)) => failure.with_position(
            u32::try_from(line + offset).unwrap_or(u32::MAX),
            u32::try_from(column).unwrap_or(u32::MAX),
        ),
        _ => failure,
    }
}

/// Add `offset` to every "line N" the parser wrote into its message
fn shift_line_numbers(message: &str, offset: usize) -> String {
    const MARKER: &str = "line ";

    if offset == 0 {
        return message.to_string();
    }

    let mut shifted = String::with_capacity(message.len());
    let mut rest = message;

    while let Some(index) = rest.find(MARKER) {
        let (head, tail) = rest.split_at(index + MARKER.len());
        shifted.push_str(head);

        let digits = tail.bytes().take_while(u8::is_ascii_digit).count();
        let (number, after) = tail.split_at(digits);
        match number.parse::<usize>() {
            Ok(line) => shifted.push_str(&(line + offset).to_string()),
            Err(_) => shifted.push_str(number),
        }
        rest = after;
    }

    shifted.push_str(rest);
    shifted
}
