//! Configuration loading and management for YAML Checker
//!
//! Architecture: Anti-Corruption Layer - Configuration translates external YAML files
//! - Raw YAML structures are converted to a validated CheckerConfig
//! - The validator receives its configuration at construction, never from ambient state
//! - Persistence goes through the ConfigStore trait

use crate::domain::outcomes::{CheckerError, CheckerResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file names looked up in the working directory, in order
pub const DEFAULT_CONFIG_FILES: &[&str] =
    &["yaml_checker.yaml", "yaml_checker.yml", ".yaml_checker.yaml"];

/// Main configuration structure for YAML Checker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// Configuration format version
    pub version: String,
    /// Which documents are collected from a directory
    #[serde(default)]
    pub documents: DocumentConfig,
    /// How frontmatter is judged
    #[serde(default)]
    pub validation: ValidationConfig,
    /// How failing documents are referenced in reports
    #[serde(default)]
    pub report: ReportConfig,
}

/// Document discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// File extensions treated as documents (without the dot)
    pub extensions: Vec<String>,
    /// Exclude patterns (gitignore-style, `!` re-includes)
    pub patterns: Vec<String>,
    /// Optional per-directory ignore file name
    pub ignore_file: Option<String>,
}

/// Validation behavior configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Read and parse documents on the rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Treat null, false, zero and empty-string frontmatter as a failure
    #[serde(default = "default_true")]
    pub reject_unusable_values: bool,
}

/// Report rendering configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// How failing documents are referenced
    #[serde(default)]
    pub link_style: LinkStyle,
    /// Vault name used by `obsidian` links
    pub vault_name: Option<String>,
}

/// Style of document references in reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStyle {
    /// Plain store-relative path
    #[default]
    Path,
    /// `obsidian://open` URI that opens the note in its vault
    Obsidian,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string()],
            patterns: vec![
                "**/.obsidian/**".to_string(),
                "**/.trash/**".to_string(),
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
            ],
            ignore_file: Some(".yamlcheckignore".to_string()),
        }
    }
}

impl DocumentConfig {
    /// Whether `path` has one of the configured document extensions
    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(false, |ext| {
                self.extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
            })
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            reject_unusable_values: true,
        }
    }
}

impl CheckerConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> CheckerResult<Self> {
        let contents = fs::read_to_string(&path).map_err(|e| {
            CheckerError::config(format!(
                "Failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&contents).map_err(|e| {
            CheckerError::config(format!(
                "Failed to parse config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from string content
    pub fn load_from_str(content: &str) -> CheckerResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| CheckerError::config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Load the first default config file found in `dir`, or the defaults
    pub fn discover<P: AsRef<Path>>(dir: P) -> CheckerResult<Self> {
        for name in DEFAULT_CONFIG_FILES {
            let candidate = dir.as_ref().join(name);
            if candidate.is_file() {
                tracing::debug!("Loading configuration from {}", candidate.display());
                return Self::load_from_file(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Get default configuration
    pub fn with_defaults() -> Self {
        Self {
            version: "1.0".to_string(),
            documents: DocumentConfig::default(),
            validation: ValidationConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> CheckerResult<()> {
        if !["1.0"].contains(&self.version.as_str()) {
            return Err(CheckerError::config(format!(
                "Unsupported configuration version: {}. Supported versions: 1.0",
                self.version
            )));
        }

        if self.documents.extensions.is_empty() {
            return Err(CheckerError::config(
                "At least one document extension must be configured",
            ));
        }

        if let Some(ext) = self.documents.extensions.iter().find(|e| e.trim().is_empty()) {
            return Err(CheckerError::config(format!(
                "Invalid document extension '{ext}'"
            )));
        }

        for pattern in &self.documents.patterns {
            let raw = pattern.strip_prefix('!').unwrap_or(pattern);
            glob::Pattern::new(raw).map_err(|e| {
                CheckerError::config(format!("Invalid document pattern '{pattern}': {e}"))
            })?;
        }

        if self.report.link_style == LinkStyle::Obsidian
            && self.report.vault_name.as_deref().map_or(true, str::is_empty)
        {
            return Err(CheckerError::config(
                "Link style 'obsidian' requires report.vault_name",
            ));
        }

        Ok(())
    }

    /// Convert to YAML for persistence
    pub fn to_yaml(&self) -> CheckerResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| CheckerError::config(format!("Failed to serialize config: {e}")))
    }

    /// Create a fingerprint of the configuration, recorded in reports
    pub fn fingerprint(&self) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();

        self.version.hash(&mut hasher);

        let mut extensions: Vec<String> =
            self.documents.extensions.iter().map(|e| e.to_lowercase()).collect();
        extensions.sort();
        extensions.hash(&mut hasher);

        // Pattern order matters: later patterns override earlier ones
        self.documents.patterns.hash(&mut hasher);
        self.documents.ignore_file.hash(&mut hasher);

        self.validation.parallel.hash(&mut hasher);
        self.validation.reject_unusable_values.hash(&mut hasher);

        self.report.link_style.hash(&mut hasher);
        self.report.vault_name.hash(&mut hasher);

        format!("{:x}", hasher.finish())
    }
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn default_true() -> bool {
    true
}

/// Load/save capability for settings
pub trait ConfigStore {
    /// Load settings, falling back to defaults when nothing is stored
    fn load(&self) -> CheckerResult<CheckerConfig>;

    /// Persist settings
    fn save(&self, config: &CheckerConfig) -> CheckerResult<()>;
}

/// Settings persisted as a YAML file
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> CheckerResult<CheckerConfig> {
        if !self.path.exists() {
            tracing::debug!("No config at {}, using defaults", self.path.display());
            return Ok(CheckerConfig::default());
        }
        CheckerConfig::load_from_file(&self.path)
    }

    fn save(&self, config: &CheckerConfig) -> CheckerResult<()> {
        config.validate()?;
        let yaml = config.to_yaml()?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    CheckerError::config(format!(
                        "Failed to create config directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        fs::write(&self.path, yaml).map_err(|e| {
            CheckerError::config(format!(
                "Failed to write config file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: CheckerConfig,
}

impl ConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CheckerConfig::default(),
        }
    }

    /// Add a document extension
    pub fn add_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.documents.extensions.push(extension.into());
        self
    }

    /// Add a path pattern
    pub fn add_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.documents.patterns.push(pattern.into());
        self
    }

    /// Set the ignore file name
    pub fn ignore_file(mut self, filename: impl Into<String>) -> Self {
        self.config.documents.ignore_file = Some(filename.into());
        self
    }

    /// Toggle parallel processing
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.validation.parallel = parallel;
        self
    }

    /// Toggle the unusable-value check
    pub fn reject_unusable_values(mut self, reject: bool) -> Self {
        self.config.validation.reject_unusable_values = reject;
        self
    }

    /// Reference failing documents through `obsidian://` links into `vault`
    pub fn obsidian_vault(mut self, vault: impl Into<String>) -> Self {
        self.config.report.link_style = LinkStyle::Obsidian;
        self.config.report.vault_name = Some(vault.into());
        self
    }

    /// Build the final configuration
    pub fn build(self) -> CheckerResult<CheckerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
