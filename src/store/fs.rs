//! Filesystem document store rooted at a directory (a vault)

use crate::config::{CheckerConfig, DocumentConfig};
use crate::domain::documents::Document;
use crate::domain::outcomes::{CheckerError, CheckerResult};
use crate::store::path_filter::{IgnoreCache, PathFilter};
use crate::store::DocumentStore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Documents are the files below `root` with a configured extension
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    root: PathBuf,
    documents: DocumentConfig,
    filter: PathFilter,
}

impl FsDocumentStore {
    /// Create a store for `root` using the document settings of `config`
    pub fn new<P: AsRef<Path>>(root: P, config: &CheckerConfig) -> CheckerResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(CheckerError::store(format!(
                "Document root '{}' is not a directory",
                root.display()
            )));
        }

        let filter = PathFilter::new(
            config.documents.patterns.clone(),
            config.documents.ignore_file.clone(),
        )?;

        Ok(Self {
            root,
            documents: config.documents.clone(),
            filter,
        })
    }

    /// Add an exclude pattern on top of the configured ones
    pub fn exclude(mut self, pattern: impl Into<String>) -> CheckerResult<Self> {
        self.filter.add_pattern(pattern.into())?;
        Ok(self)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a document
    pub fn resolve(&self, document: &Document) -> PathBuf {
        self.root.join(&document.path)
    }
}

impl DocumentStore for FsDocumentStore {
    fn list_documents(&self) -> CheckerResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut ignores = IgnoreCache::default();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.documents.matches_extension(entry.path()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            if self
                .filter
                .should_include_cached(&self.root, relative, &mut ignores)?
            {
                documents.push(Document::new(relative));
            }
        }

        // Directory walk order is platform dependent
        documents.sort();

        tracing::debug!(
            "Found {} documents under {}",
            documents.len(),
            self.root.display()
        );

        Ok(documents)
    }

    fn read_text(&self, document: &Document) -> io::Result<String> {
        fs::read_to_string(self.resolve(document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_lists_markdown_documents_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("notes")).unwrap();
        fs::create_dir_all(root.join(".obsidian")).unwrap();
        fs::write(root.join("notes/b.md"), "b").unwrap();
        fs::write(root.join("a.md"), "a").unwrap();
        fs::write(root.join("image.png"), "png").unwrap();
        fs::write(root.join(".obsidian/workspace.md"), "settings").unwrap();

        let store = FsDocumentStore::new(root, &CheckerConfig::default()).unwrap();
        let documents = store.list_documents().unwrap();

        assert_eq!(
            documents,
            vec![Document::new("a.md"), Document::new(Path::new("notes").join("b.md"))]
        );
        assert_eq!(store.read_text(&documents[0]).unwrap(), "a");
    }

    #[test]
    fn test_extra_extensions_and_excludes() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("templates")).unwrap();
        fs::write(root.join("a.markdown"), "").unwrap();
        fs::write(root.join("b.md"), "").unwrap();
        fs::write(root.join("templates/t.md"), "").unwrap();

        let config = ConfigBuilder::new().add_extension("markdown").build().unwrap();
        let store = FsDocumentStore::new(root, &config)
            .unwrap()
            .exclude("templates/")
            .unwrap();

        let documents = store.list_documents().unwrap();
        assert_eq!(documents, vec![Document::new("a.markdown"), Document::new("b.md")]);
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.md");
        fs::write(&file, "").unwrap();

        assert!(FsDocumentStore::new(&file, &CheckerConfig::default()).is_err());
    }
}
