//! YAML Checker - Frontmatter validation for markdown document collections
//!
//! Architecture: Clean Architecture - Library interface serves as the application layer
//! - Pure locator and validation logic separated from storage and presentation
//! - Document stores, YAML parsers, report sinks and config stores are traits
//! - The async facade keeps blocking work off the caller's runtime

pub mod config;
pub mod domain;
pub mod frontmatter;
pub mod parser;
pub mod report;
pub mod store;
pub mod validator;

// Re-export main types for convenient access
pub use domain::documents::{Document, FrontmatterScan, FrontmatterSpan};
pub use domain::outcomes::{
    CheckerError, CheckerResult, Failure, FailureCounts, FailureKind, SummarySignal,
    ValidationOutcome, ValidationReport, ValidationSummary,
};

pub use config::{CheckerConfig, ConfigBuilder, ConfigStore, FileConfigStore, LinkStyle};

pub use frontmatter::{extract, locate, scan};

pub use parser::{ParseDiagnostic, SerdeYamlParser, YamlParser};

pub use report::{
    CollectingSink, OutputFormat, ReportFormatter, ReportOptions, ReportSink, WriterSink,
};

pub use store::{DocumentStore, FsDocumentStore, MemoryDocumentStore, PathFilter};

pub use validator::BatchValidator;

use std::path::Path;
use std::sync::Arc;

/// Runs the "check all YAML format" action against a document store
pub struct YamlChecker {
    validator: Arc<BatchValidator>,
}

impl YamlChecker {
    /// Create a checker with the given configuration
    pub fn new_with_config(config: CheckerConfig) -> CheckerResult<Self> {
        config.validate()?;
        Ok(Self {
            validator: Arc::new(BatchValidator::new(config)),
        })
    }

    /// Create a checker with default configuration
    pub fn new() -> CheckerResult<Self> {
        Self::new_with_config(CheckerConfig::default())
    }

    /// Create a checker loading configuration from file
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> CheckerResult<Self> {
        let config = CheckerConfig::load_from_file(path)?;
        Self::new_with_config(config)
    }

    /// Create a checker from a custom validator
    pub fn with_validator(validator: BatchValidator) -> Self {
        Self {
            validator: Arc::new(validator),
        }
    }

    pub fn config(&self) -> &CheckerConfig {
        self.validator.config()
    }

    /// Filesystem store for `root` using this checker's document settings
    pub fn open_store<P: AsRef<Path>>(&self, root: P) -> CheckerResult<FsDocumentStore> {
        FsDocumentStore::new(root, self.config())
    }

    /// Validate every document of `store` on a blocking worker thread
    pub async fn check_all(&self, store: Arc<dyn DocumentStore>) -> CheckerResult<ValidationReport> {
        let validator = Arc::clone(&self.validator);

        tokio::task::spawn_blocking(move || -> CheckerResult<ValidationReport> {
            let documents = store.list_documents()?;
            Ok(validator.validate_all(&documents, store.as_ref()))
        })
        .await
        .map_err(|e| CheckerError::store(format!("Validation task failed: {e}")))?
    }

    /// Validate every document of `store` on the current thread
    pub fn check_all_blocking(&self, store: &dyn DocumentStore) -> CheckerResult<ValidationReport> {
        let documents = store.list_documents()?;
        Ok(self.validator.validate_all(&documents, store))
    }

    /// Validate one document of `store`
    pub fn check_document(&self, document: &Document, store: &dyn DocumentStore) -> ValidationOutcome {
        self.validator.validate_document(document, store)
    }

    /// Hand a finished report to a sink along with its summary signal
    pub fn deliver(&self, report: &ValidationReport, sink: &mut dyn ReportSink) -> CheckerResult<()> {
        sink.accept(report, report.signal())
    }

    /// Validate `store` and deliver the report to `sink`
    pub async fn run(
        &self,
        store: Arc<dyn DocumentStore>,
        sink: &mut dyn ReportSink,
    ) -> CheckerResult<ValidationReport> {
        let report = self.check_all(store).await?;
        self.deliver(&report, sink)?;
        Ok(report)
    }
}

/// Convenience function to validate a directory with default settings
pub fn check_directory<P: AsRef<Path>>(root: P) -> CheckerResult<ValidationReport> {
    let checker = YamlChecker::new()?;
    let store = checker.open_store(root)?;
    checker.check_all_blocking(&store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vault() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("notes")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("notes/A.md"), "no frontmatter here").unwrap();
        fs::write(root.join("notes/B.md"), "---\nkey: value\n---\nbody").unwrap();
        fs::write(root.join("notes/C.md"), "---\nkey: [unterminated\n---").unwrap();
        fs::write(root.join(".obsidian/broken.md"), "---\na: [\n---").unwrap();

        temp_dir
    }

    #[tokio::test]
    async fn test_check_all_directory() {
        let temp_dir = vault();
        let checker = YamlChecker::new().unwrap();
        let store: Arc<dyn DocumentStore> = Arc::new(checker.open_store(temp_dir.path()).unwrap());

        let report = checker.check_all(store).await.unwrap();

        assert_eq!(report.summary.total_documents, 3);
        assert_eq!(report.failure_count(), 1);
        assert!(report.failures[0].document.path.ends_with("C.md"));
    }

    #[tokio::test]
    async fn test_run_delivers_signal() {
        let checker = YamlChecker::new().unwrap();
        let mut sink = CollectingSink::new();

        let clean: Arc<dyn DocumentStore> =
            Arc::new(MemoryDocumentStore::new().with_document("ok.md", "---\na: 1\n---"));
        checker.run(clean, &mut sink).await.unwrap();
        assert_eq!(sink.last_signal(), Some(SummarySignal::AllValid));

        let broken: Arc<dyn DocumentStore> = Arc::new(
            MemoryDocumentStore::new()
                .with_document("x.md", "---\na: [\n---")
                .with_document("y.md", "---\nb: {\n---"),
        );
        checker.run(broken, &mut sink).await.unwrap();
        assert_eq!(sink.last_signal(), Some(SummarySignal::FoundErrors(2)));
        assert_eq!(sink.deliveries().len(), 2);
    }

    #[test]
    fn test_every_document_is_checked_without_focus() {
        // No document is ever "open"; each one is judged on its own text
        let store = MemoryDocumentStore::new()
            .with_document("good.md", "---\ntitle: fine\n---")
            .with_document("bad.md", "---\ntitle: [\n---");

        let checker = YamlChecker::new().unwrap();
        let report = checker.check_all_blocking(&store).unwrap();

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures[0].document, Document::new("bad.md"));
        assert!(checker
            .check_document(&Document::new("good.md"), &store)
            .is_valid());
    }

    #[test]
    fn test_check_directory_is_idempotent() {
        let temp_dir = vault();

        let first = check_directory(temp_dir.path()).unwrap();
        let second = check_directory(temp_dir.path()).unwrap();

        assert_eq!(first.failures, second.failures);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = CheckerConfig::default();
        config.documents.extensions.clear();
        assert!(YamlChecker::new_with_config(config).is_err());
    }
}
