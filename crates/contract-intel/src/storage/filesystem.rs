use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::DocumentStoreError;

use super::{DocumentId, DocumentStore};

const EXTENSION: &str = "pdf";

/// One file per document under a root directory.
///
/// Files are created with `create_new`, so an id is never written twice.
#[derive(Debug, Clone)]
pub struct FilesystemDocumentStore {
    root: PathBuf,
}

impl FilesystemDocumentStore {
    /// Creates the root directory if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, DocumentStoreError> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| DocumentStoreError::Io {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `None` for ids that could escape the root directory.
    fn path_for(&self, id: &DocumentId) -> Option<PathBuf> {
        let raw = id.as_str();
        let safe = !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        safe.then(|| self.root.join(format!("{}.{}", raw, EXTENSION)))
    }
}

impl DocumentStore for FilesystemDocumentStore {
    fn put(&self, bytes: &[u8]) -> Result<DocumentId, DocumentStoreError> {
        loop {
            let id = DocumentId::generate();
            let Some(path) = self.path_for(&id) else {
                continue;
            };

            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .and_then(|_| file.sync_all())
                        .map_err(|e| DocumentStoreError::Io {
                            path: path.clone(),
                            source: e,
                        })?;
                    log::debug!("Stored document {} ({} bytes)", id, bytes.len());
                    return Ok(id);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(DocumentStoreError::Io { path, source: e }),
            }
        }
    }

    fn fetch(&self, id: &DocumentId) -> Result<Vec<u8>, DocumentStoreError> {
        let path = self
            .path_for(id)
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))?;

        std::fs::read(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                DocumentStoreError::NotFound(id.to_string())
            } else {
                DocumentStoreError::Io { path, source: e }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_writes_file_under_root() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDocumentStore::new(dir.path().join("docs")).unwrap();

        let id = store.put(b"%PDF-1.4 data").unwrap();

        let path = store.root().join(format!("{}.pdf", id));
        assert!(path.exists());
        assert_eq!(store.fetch(&id).unwrap(), b"%PDF-1.4 data");
    }

    #[test]
    fn test_fetch_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDocumentStore::new(dir.path()).unwrap();

        let result = store.fetch(&DocumentId::from("0000-missing"));
        assert!(matches!(result, Err(DocumentStoreError::NotFound(_))));
    }

    #[test]
    fn test_traversal_ids_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDocumentStore::new(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("secret.pdf"), b"x").unwrap();

        let result = store.fetch(&DocumentId::from("../secret"));
        assert!(matches!(result, Err(DocumentStoreError::NotFound(_))));
    }

    #[test]
    fn test_documents_survive_new_handle() {
        let dir = TempDir::new().unwrap();
        let id = FilesystemDocumentStore::new(dir.path())
            .unwrap()
            .put(b"persisted")
            .unwrap();

        let reopened = FilesystemDocumentStore::new(dir.path()).unwrap();
        assert_eq!(reopened.fetch(&id).unwrap(), b"persisted");
    }
}
