//! Document store capability
//!
//! Architecture: Repository - Stores own documents, the validator only reads them
//! - `list_documents` fixes the iteration order of a run
//! - `read_text` failures are per-document and never abort a run

pub mod fs;
pub mod path_filter;

pub use fs::FsDocumentStore;
pub use path_filter::{IgnoreCache, PathFilter};

use crate::domain::documents::Document;
use crate::domain::outcomes::CheckerResult;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

/// Source of the documents to validate
pub trait DocumentStore: Send + Sync {
    /// Every document in the store, in iteration order
    fn list_documents(&self) -> CheckerResult<Vec<Document>>;

    /// Read the full text of a document
    fn read_text(&self, document: &Document) -> io::Result<String>;
}

/// In-memory store, keeps documents in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    order: Vec<Document>,
    contents: HashMap<PathBuf, String>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document
    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Document {
        let document = Document::new(path);
        if self
            .contents
            .insert(document.path.clone(), text.into())
            .is_none()
        {
            self.order.push(document.clone());
        }
        document
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with_document(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn list_documents(&self) -> CheckerResult<Vec<Document>> {
        Ok(self.order.clone())
    }

    fn read_text(&self, document: &Document) -> io::Result<String> {
        self.contents.get(&document.path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("Document '{document}' does not exist"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_keeps_insertion_order() {
        let mut store = MemoryDocumentStore::new()
            .with_document("b.md", "b")
            .with_document("a.md", "a");
        store.insert("b.md", "b2");

        let docs = store.list_documents().unwrap();
        assert_eq!(docs, vec![Document::new("b.md"), Document::new("a.md")]);
        assert_eq!(store.read_text(&Document::new("b.md")).unwrap(), "b2");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_memory_store_missing_document() {
        let store = MemoryDocumentStore::new();
        let err = store.read_text(&Document::new("missing.md")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(store.is_empty());
    }
}
