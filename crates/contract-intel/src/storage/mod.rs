//! Raw document bytes, addressed by an opaque [`DocumentId`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DocumentStoreError;

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemDocumentStore;
pub use memory::MemoryDocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Write-once blob storage for submitted documents.
pub trait DocumentStore: Send + Sync {
    fn put(&self, bytes: &[u8]) -> Result<DocumentId, DocumentStoreError>;

    /// Returns [`DocumentStoreError::NotFound`] when nothing is stored
    /// under `id`.
    fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, DocumentStoreError>;
}
