use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::DocumentStoreError;

use super::{DocumentId, DocumentStore};

#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, Vec<u8>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn put(&self, bytes: &[u8]) -> Result<DocumentId, DocumentStoreError> {
        let id = DocumentId::generate();
        self.documents
            .write()
            .map_err(|_| DocumentStoreError::LockPoisoned)?
            .insert(id.clone(), bytes.to_vec());
        Ok(id)
    }

    fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, DocumentStoreError> {
        let documents = self.documents.read().unwrap_or_else(|poisoned| {
            log::warn!("Document store lock poisoned, recovering");
            poisoned.into_inner()
        });
        documents
            .get(id)
            .cloned()
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))
    }
}
