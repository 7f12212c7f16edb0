//! In-process document store for tests and embedding callers.

use super::{DocumentKind, DocumentStore, StoreResult};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: HashMap<DocumentKind, String>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one document, replacing any previous body.
    pub fn with_document(mut self, kind: DocumentKind, body: impl Into<String>) -> Self {
        self.documents.insert(kind, body.into());
        self
    }

    pub fn document(&self, kind: DocumentKind) -> Option<&str> {
        self.documents.get(&kind).map(String::as_str)
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, kind: DocumentKind) -> StoreResult<Option<String>> {
        Ok(self.documents.get(&kind).cloned())
    }

    fn save(&mut self, kind: DocumentKind, body: &str) -> StoreResult<()> {
        self.documents.insert(kind, body.to_string());
        Ok(())
    }
}
