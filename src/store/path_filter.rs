//! Path filtering using .gitignore-style patterns
//!
//! Architectural Principle: Service Layer - PathFilter decides which files are documents
//! - Patterns are evaluated in order, the last matching pattern wins
//! - A leading `!` re-includes paths excluded by earlier patterns
//! - Ignore files are read from each directory between the store root and the file

use crate::domain::outcomes::{CheckerError, CheckerResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Manages path filtering using .gitignore-style patterns
#[derive(Debug, Clone)]
pub struct PathFilter {
    /// Include/exclude patterns
    patterns: Vec<FilterPattern>,
    /// Name of per-directory ignore files, if they are honored
    ignore_filename: Option<String>,
}

/// A single path filter pattern
#[derive(Debug, Clone)]
struct FilterPattern {
    /// The compiled glob pattern
    pattern: glob::Pattern,
    /// Whether this is an include pattern (starts with !)
    is_include: bool,
    /// Whether the pattern contains a slash and matches the whole relative path
    anchored: bool,
}

impl FilterPattern {
    fn parse(raw: &str) -> Result<Self, glob::PatternError> {
        let (is_include, raw) = match raw.strip_prefix('!') {
            Some(stripped) => (true, stripped),
            None => (false, raw),
        };

        // `dir/` excludes everything below `dir`
        let expanded = match raw.strip_suffix('/') {
            Some(dir) => format!("{dir}/**"),
            None => raw.to_string(),
        };
        let expanded = expanded.strip_prefix('/').unwrap_or(&expanded).to_string();

        Ok(Self {
            pattern: glob::Pattern::new(&expanded)?,
            is_include,
            anchored: expanded.contains('/'),
        })
    }

    /// Check the pattern against a path relative to the pattern's base directory
    fn matches(&self, relative: &Path) -> bool {
        if self.anchored {
            let path_str = to_slash(relative);
            return self.pattern.matches(&path_str);
        }

        relative
            .file_name()
            .map_or(false, |name| self.pattern.matches(&name.to_string_lossy()))
    }
}

impl PathFilter {
    /// Create a new path filter with the given patterns
    pub fn new(patterns: Vec<String>, ignore_filename: Option<String>) -> CheckerResult<Self> {
        let mut filter = Self {
            patterns: Vec::new(),
            ignore_filename: ignore_filename.filter(|name| !name.is_empty()),
        };

        for pattern in patterns {
            filter.add_pattern(pattern)?;
        }

        Ok(filter)
    }

    /// Add a pattern to the filter
    pub fn add_pattern(&mut self, pattern: String) -> CheckerResult<()> {
        let compiled = FilterPattern::parse(&pattern)
            .map_err(|e| CheckerError::pattern(format!("Invalid pattern '{pattern}': {e}")))?;
        self.patterns.push(compiled);
        Ok(())
    }

    /// Whether the file at `relative` (inside `root`) should be treated as a document
    pub fn should_include(&self, root: &Path, relative: &Path) -> CheckerResult<bool> {
        self.should_include_cached(root, relative, &mut IgnoreCache::default())
    }

    /// Like `should_include`, reusing ignore files already parsed into `cache`.
    ///
    /// Configured patterns come first, then the ignore files from the root down to
    /// the file's directory; the last matching pattern wins across all of them.
    pub fn should_include_cached(
        &self,
        root: &Path,
        relative: &Path,
        cache: &mut IgnoreCache,
    ) -> CheckerResult<bool> {
        let mut include = true;

        for pattern in &self.patterns {
            if pattern.matches(relative) {
                include = pattern.is_include;
            }
        }

        let Some(ignore_filename) = &self.ignore_filename else {
            return Ok(include);
        };

        let mut dirs: Vec<&Path> = relative.ancestors().skip(1).collect();
        dirs.reverse();

        for dir in dirs {
            let Ok(local) = relative.strip_prefix(dir) else {
                continue;
            };

            for pattern in cache.patterns_for(root, dir, ignore_filename)? {
                if pattern.matches(local) {
                    include = pattern.is_include;
                }
            }
        }

        Ok(include)
    }
}

/// Parsed ignore files keyed by the directory holding them
#[derive(Debug, Default)]
pub struct IgnoreCache {
    dirs: HashMap<PathBuf, Vec<FilterPattern>>,
}

impl IgnoreCache {
    /// Number of directories already looked up
    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    fn patterns_for(
        &mut self,
        root: &Path,
        dir: &Path,
        ignore_filename: &str,
    ) -> CheckerResult<&[FilterPattern]> {
        if !self.dirs.contains_key(dir) {
            let ignore_file = root.join(dir).join(ignore_filename);
            let patterns = if ignore_file.is_file() {
                load_ignore_file(&ignore_file)?
            } else {
                Vec::new()
            };
            self.dirs.insert(dir.to_path_buf(), patterns);
        }

        Ok(self.dirs.get(dir).map(Vec::as_slice).unwrap_or(&[]))
    }
}

/// Load patterns from an ignore file, skipping invalid ones
fn load_ignore_file(path: &Path) -> CheckerResult<Vec<FilterPattern>> {
    let content = fs::read_to_string(path).map_err(|e| {
        CheckerError::config(format!(
            "Failed to read ignore file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut patterns = Vec::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match FilterPattern::parse(line) {
            Ok(pattern) => patterns.push(pattern),
            Err(e) => {
                tracing::warn!("Invalid pattern '{}' in {}: {}", line, path.display(), e);
            }
        }
    }

    Ok(patterns)
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
