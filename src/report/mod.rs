//! Report sinks and output formats
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate reports to external formats
//! - ValidationReport (domain) is converted to text for terminals, CI systems and tools
//! - Sinks decide where rendered reports go; the validator never renders anything
//! - Every failing document is shown with an actionable reference and its diagnostic

use crate::config::{LinkStyle, ReportConfig};
use crate::domain::documents::Document;
use crate::domain::outcomes::{
    CheckerError, CheckerResult, Failure, FailureKind, SummarySignal, ValidationReport,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value as JsonValue;
use std::fmt::Write as _;
use std::io::Write;

/// Characters left untouched by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Supported output formats for validation reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable format with colors
    Human,
    /// JSON format for programmatic consumption
    Json,
    /// JUnit XML format for CI/CD integration
    Junit,
    /// SARIF format for code scanning tools
    Sarif,
    /// GitHub Actions workflow annotations
    GitHub,
}

impl OutputFormat {
    /// Parse format from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "human" => Some(Self::Human),
            "json" => Some(Self::Json),
            "junit" => Some(Self::Junit),
            "sarif" => Some(Self::Sarif),
            "github" => Some(Self::GitHub),
            _ => None,
        }
    }

    /// Get all available format names
    pub fn all_formats() -> &'static [&'static str] {
        &["human", "json", "junit", "sarif", "github"]
    }
}

/// Options for customizing report output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Maximum number of failures to list
    pub max_failures: Option<usize>,
    /// How failing documents are referenced
    pub link_style: LinkStyle,
    /// Vault name used by `obsidian` links
    pub vault_name: Option<String>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            use_colors: true,
            max_failures: None,
            link_style: LinkStyle::Path,
            vault_name: None,
        }
    }
}

impl ReportOptions {
    /// Options carrying the link settings of a report configuration
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            link_style: config.link_style,
            vault_name: config.vault_name.clone(),
            ..Default::default()
        }
    }
}

/// Renders reports in any of the supported formats
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new report formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    /// Format a validation report in the specified format
    pub fn format_report(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
    ) -> CheckerResult<String> {
        let failures = self.limit_failures(&report.failures);

        match format {
            OutputFormat::Human => Ok(self.format_human(report, failures)),
            OutputFormat::Json => self.format_json(report, failures),
            OutputFormat::Junit => Ok(self.format_junit(report, failures)),
            OutputFormat::Sarif => self.format_sarif(failures),
            OutputFormat::GitHub => Ok(self.format_github(failures)),
        }
    }

    /// Write a formatted report to a writer
    pub fn write_report<W: Write>(
        &self,
        report: &ValidationReport,
        format: OutputFormat,
        mut writer: W,
    ) -> CheckerResult<()> {
        let formatted = self.format_report(report, format)?;
        writer.write_all(formatted.as_bytes())?;
        Ok(())
    }

    /// Actionable reference for a document: its path or an `obsidian://` URI
    pub fn document_reference(&self, document: &Document) -> String {
        match (self.options.link_style, self.options.vault_name.as_deref()) {
            (LinkStyle::Obsidian, Some(vault)) => obsidian_uri(vault, document),
            _ => document.display_path(),
        }
    }

    fn limit_failures<'a>(&self, failures: &'a [Failure]) -> &'a [Failure] {
        match self.options.max_failures {
            Some(max) if max < failures.len() => &failures[..max],
            _ => failures,
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.options.use_colors {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    /// Format report in human-readable format
    fn format_human(&self, report: &ValidationReport, failures: &[Failure]) -> String {
        let mut output = String::new();

        match report.signal() {
            SummarySignal::AllValid => {
                let _ = writeln!(
                    output,
                    "✅ {}",
                    self.paint("32", "All markdown files have valid YAML format")
                );
            }
            SummarySignal::FoundErrors(count) => {
                let _ = writeln!(
                    output,
                    "❌ {}\n",
                    self.paint("31", &format!("Invalid YAML format ({count} files)"))
                );

                for failure in failures {
                    let position = match (failure.line_number, failure.column_number) {
                        (Some(line), Some(col)) => format!(":{line}:{col}"),
                        (Some(line), None) => format!(":{line}"),
                        _ => String::new(),
                    };

                    let _ = writeln!(
                        output,
                        "📁 {}{}",
                        self.document_reference(&failure.document),
                        self.paint("2", &position)
                    );
                    let _ = writeln!(
                        output,
                        "  [{}] {}\n",
                        self.paint("31", failure.kind.as_str()),
                        failure.message
                    );
                }

                let hidden = report.failures.len() - failures.len();
                if hidden > 0 {
                    let _ = writeln!(output, "… and {hidden} more\n");
                }
            }
        }

        output.push_str(&self.format_summary(report));
        output
    }

    /// Format report in JSON format
    fn format_json(&self, report: &ValidationReport, failures: &[Failure]) -> CheckerResult<String> {
        let json_failures: Vec<JsonValue> = failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "document": f.document.display_path(),
                    "reference": self.document_reference(&f.document),
                    "kind": f.kind.as_str(),
                    "message": f.message,
                    "line_number": f.line_number,
                    "column_number": f.column_number,
                })
            })
            .collect();

        let counts = &report.summary.failures_by_kind;
        let json_report = serde_json::json!({
            "failures": json_failures,
            "summary": {
                "total_documents": report.summary.total_documents,
                "with_frontmatter": report.summary.with_frontmatter,
                "without_frontmatter": report.summary.without_frontmatter,
                "unterminated": report.summary.unterminated,
                "failures_by_kind": {
                    "io": counts.io,
                    "yaml_parse": counts.yaml_parse,
                    "empty_yaml": counts.empty_yaml
                },
                "execution_time_ms": report.summary.execution_time_ms,
                "validated_at": report.summary.validated_at.to_rfc3339()
            },
            "config_fingerprint": report.config_fingerprint
        });

        serde_json::to_string_pretty(&json_report)
            .map_err(|e| CheckerError::report(format!("JSON serialization failed: {e}")))
    }

    /// Format report in JUnit XML format, one test case per failing document
    fn format_junit(&self, report: &ValidationReport, failures: &[Failure]) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;

        let _ = writeln!(
            xml,
            "<testsuite name=\"yaml-checker\" tests=\"{}\" failures=\"{}\" errors=\"0\" time=\"{:.3}\">",
            report.summary.total_documents,
            failures.len(),
            execution_time
        );

        for failure in failures {
            let _ = writeln!(
                xml,
                "  <testcase classname=\"{}\" name=\"{}\">",
                failure.kind.as_str(),
                escape_xml(&failure.document.display_path())
            );
            let _ = writeln!(
                xml,
                "    <failure message=\"{}\">",
                escape_xml(&failure.message)
            );
            let _ = writeln!(
                xml,
                "      File: {}:{}:{}",
                escape_xml(&failure.document.display_path()),
                failure.line_number.unwrap_or(0),
                failure.column_number.unwrap_or(0)
            );
            xml.push_str("    </failure>\n");
            xml.push_str("  </testcase>\n");
        }

        xml.push_str("</testsuite>\n");
        xml
    }

    /// Format report in SARIF format
    fn format_sarif(&self, failures: &[Failure]) -> CheckerResult<String> {
        let sarif_results: Vec<JsonValue> = failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "ruleId": f.kind.as_str(),
                    "level": "error",
                    "message": {
                        "text": f.message
                    },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": f.document.display_path()
                            },
                            "region": {
                                "startLine": f.line_number.unwrap_or(1),
                                "startColumn": f.column_number.unwrap_or(1)
                            }
                        }
                    }]
                })
            })
            .collect();

        let rules: Vec<JsonValue> = [FailureKind::Io, FailureKind::YamlParse, FailureKind::EmptyYaml]
            .iter()
            .map(|kind| serde_json::json!({ "id": kind.as_str() }))
            .collect();

        let sarif_report = serde_json::json!({
            "version": "2.1.0",
            "$schema": "https://json.schemastore.org/sarif-2.1.0.json",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "yaml-checker",
                        "version": env!("CARGO_PKG_VERSION"),
                        "rules": rules
                    }
                },
                "results": sarif_results
            }]
        });

        serde_json::to_string_pretty(&sarif_report)
            .map_err(|e| CheckerError::report(format!("SARIF serialization failed: {e}")))
    }

    /// Format report for GitHub Actions
    fn format_github(&self, failures: &[Failure]) -> String {
        let mut output = String::new();

        for failure in failures {
            let position = match (failure.line_number, failure.column_number) {
                (Some(line), Some(col)) => format!(",line={line},col={col}"),
                (Some(line), None) => format!(",line={line}"),
                _ => String::new(),
            };

            let _ = writeln!(
                output,
                "::error file={},title={}{}::{}",
                failure.document.display_path(),
                failure.kind.as_str(),
                position,
                escape_github(&failure.message)
            );
        }

        output
    }

    /// Format the summary line
    fn format_summary(&self, report: &ValidationReport) -> String {
        let execution_time = (report.summary.execution_time_ms as f64) / 1000.0;
        let headline = match report.signal() {
            SummarySignal::AllValid => self.paint("32", "0 invalid"),
            SummarySignal::FoundErrors(count) => self.paint(
                "31",
                &format!("Found {count} markdown files with invalid YAML format"),
            ),
        };

        format!(
            "📊 {} {} in {} documents, {} without frontmatter ({:.1}s)\n",
            self.paint("1", "Summary:"),
            headline,
            report.summary.total_documents,
            report.summary.without_frontmatter,
            execution_time
        )
    }
}

/// `obsidian://open` URI for a document of `vault`
pub fn obsidian_uri(vault: &str, document: &Document) -> String {
    format!(
        "obsidian://open?vault={}&file={}",
        utf8_percent_encode(vault, URI_COMPONENT),
        utf8_percent_encode(&document.display_path(), URI_COMPONENT)
    )
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape workflow command data (newlines would end the annotation)
fn escape_github(s: &str) -> String {
    s.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A")
}

/// Presentation layer that receives finished reports
pub trait ReportSink {
    /// Receive a report and its summary signal
    fn accept(&mut self, report: &ValidationReport, signal: SummarySignal) -> CheckerResult<()>;
}

/// Renders reports into a writer
pub struct WriterSink<W: Write> {
    writer: W,
    formatter: ReportFormatter,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, formatter: ReportFormatter, format: OutputFormat) -> Self {
        Self {
            writer,
            formatter,
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn accept(&mut self, report: &ValidationReport, signal: SummarySignal) -> CheckerResult<()> {
        match signal {
            SummarySignal::AllValid => tracing::info!("All documents have valid YAML frontmatter"),
            SummarySignal::FoundErrors(count) => {
                tracing::info!("Found {} documents with invalid YAML frontmatter", count)
            }
        }

        self.formatter
            .write_report(report, self.format, &mut self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every delivery in memory
#[derive(Debug, Default)]
pub struct CollectingSink {
    deliveries: Vec<(ValidationReport, SummarySignal)>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All deliveries in the order they were received
    pub fn deliveries(&self) -> &[(ValidationReport, SummarySignal)] {
        &self.deliveries
    }

    /// The signal of the most recent delivery
    pub fn last_signal(&self) -> Option<SummarySignal> {
        self.deliveries.last().map(|(_, signal)| *signal)
    }
}

impl ReportSink for CollectingSink {
    fn accept(&mut self, report: &ValidationReport, signal: SummarySignal) -> CheckerResult<()> {
        self.deliveries.push((report.clone(), signal));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_report() -> ValidationReport {
        let mut report = ValidationReport::new();

        report.add_failure(
            Failure::new(
                Document::new("daily notes/2024 <01>.md"),
                FailureKind::YamlParse,
                "did not find expected ',' or ']'",
            )
            .with_position(3, 15),
        );
        report.add_failure(Failure::new(
            Document::new("empty.md"),
            FailureKind::EmptyYaml,
            "Invalid YAML format in file empty.md: frontmatter has no usable value",
        ));

        report.set_documents_processed(10);
        report.set_execution_time(1200);

        report
    }

    fn plain() -> ReportFormatter {
        ReportFormatter::new(ReportOptions {
            use_colors: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_human_format() {
        let output = plain()
            .format_report(&create_test_report(), OutputFormat::Human)
            .unwrap();

        assert!(output.contains("Invalid YAML format (2 files)"));
        assert!(output.contains("📁 daily notes/2024 <01>.md:3:15"));
        assert!(output.contains("[yaml_parse] did not find expected ',' or ']'"));
        assert!(output.contains("Found 2 markdown files with invalid YAML format"));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_empty_report() {
        let output = plain()
            .format_report(&ValidationReport::new(), OutputFormat::Human)
            .unwrap();
        assert!(output.contains("All markdown files have valid YAML format"));
    }

    #[test]
    fn test_obsidian_links() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            link_style: LinkStyle::Obsidian,
            vault_name: Some("My Vault".to_string()),
            ..Default::default()
        });

        let reference = formatter.document_reference(&Document::new("daily notes/a&b.md"));
        assert_eq!(
            reference,
            "obsidian://open?vault=My%20Vault&file=daily%20notes%2Fa%26b.md"
        );

        let output = formatter
            .format_report(&create_test_report(), OutputFormat::Human)
            .unwrap();
        assert!(output.contains("obsidian://open?vault=My%20Vault&file=empty.md"));
    }

    #[test]
    fn test_json_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Json)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        assert_eq!(json["failures"].as_array().unwrap().len(), 2);
        assert_eq!(json["failures"][0]["kind"], "yaml_parse");
        assert_eq!(json["failures"][0]["line_number"], 3);
        assert_eq!(json["failures"][1]["document"], "empty.md");
        assert_eq!(json["summary"]["total_documents"], 10);
        assert_eq!(json["summary"]["failures_by_kind"]["empty_yaml"], 1);
    }

    #[test]
    fn test_junit_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Junit)
            .unwrap();

        assert!(output.contains("<?xml version=\"1.0\""));
        assert!(output.contains("tests=\"10\" failures=\"2\""));
        assert!(output.contains("name=\"daily notes/2024 &lt;01&gt;.md\""));
        assert!(output.contains("<failure"));
    }

    #[test]
    fn test_sarif_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::Sarif)
            .unwrap();

        let json: JsonValue = serde_json::from_str(&output).unwrap();
        let results = json["runs"][0]["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["ruleId"], "yaml_parse");
        assert_eq!(results[1]["locations"][0]["physicalLocation"]["region"]["startLine"], 1);
    }

    #[test]
    fn test_github_format() {
        let output = ReportFormatter::default()
            .format_report(&create_test_report(), OutputFormat::GitHub)
            .unwrap();

        assert!(output.contains("::error file=daily notes/2024 <01>.md,title=yaml_parse,line=3,col=15::"));
        assert!(output.contains("::error file=empty.md,title=empty_yaml::"));
    }

    #[test]
    fn test_max_failures() {
        let formatter = ReportFormatter::new(ReportOptions {
            use_colors: false,
            max_failures: Some(1),
            ..Default::default()
        });

        let report = create_test_report();
        let output = formatter.format_report(&report, OutputFormat::Human).unwrap();
        assert!(output.contains("… and 1 more"));
        assert!(!output.contains("📁 empty.md"));

        let json = formatter.format_report(&report, OutputFormat::Json).unwrap();
        let json: JsonValue = serde_json::from_str(&json).unwrap();
        assert_eq!(json["failures"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_writer_sink() {
        let mut sink = WriterSink::new(Vec::new(), plain(), OutputFormat::Human);
        let report = create_test_report();
        sink.accept(&report, report.signal()).unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert!(written.contains("Found 2 markdown files with invalid YAML format"));
    }

    #[test]
    fn test_output_format_names() {
        for name in OutputFormat::all_formats() {
            assert!(OutputFormat::parse(name).is_some());
        }
        assert_eq!(OutputFormat::parse("GitHub"), Some(OutputFormat::GitHub));
        assert_eq!(OutputFormat::parse("xml"), None);
    }
}
