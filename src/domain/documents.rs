//! Documents and the frontmatter spans located inside them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A document owned by a document store, identified by its store-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier of the document inside its store
    pub path: PathBuf,
}

impl Document {
    /// Create a document reference from a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of this document inside its store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path rendered with forward slashes, suitable for links and annotations
    pub fn display_path(&self) -> String {
        self.path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_path())
    }
}

/// Byte range of the YAML content between the two `---` delimiter lines.
///
/// The range is half-open and never includes a delimiter line or the newline
/// that precedes the closing delimiter. `start == end` is an empty but present
/// frontmatter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontmatterSpan {
    start: usize,
    end: usize,
}

impl FrontmatterSpan {
    /// Create a span, clamping `end` so that `start <= end` always holds
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// First byte of the frontmatter content
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last byte of the frontmatter content
    pub fn end(&self) -> usize {
        self.end
    }

    /// Length of the content in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the block is present but has no content
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The span as a range usable for slicing
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Slice the span out of the text it was located in
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.as_range()).unwrap_or("")
    }

    /// 1-based line of `text` on which the frontmatter content starts
    pub fn first_line(&self, text: &str) -> usize {
        let prefix = text.get(..self.start).unwrap_or(text);
        prefix.bytes().filter(|b| *b == b'\n').count() + 1
    }
}

/// Result of scanning a document for a frontmatter block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterScan {
    /// The document does not start with a `---` line
    Absent,
    /// An opening `---` line exists but no closing one follows
    Unterminated,
    /// A complete block was found
    Present(FrontmatterSpan),
}

impl FrontmatterScan {
    /// The located span, if the block is complete
    pub fn span(self) -> Option<FrontmatterSpan> {
        match self {
            Self::Present(span) => Some(span),
            Self::Absent | Self::Unterminated => None,
        }
    }
}
