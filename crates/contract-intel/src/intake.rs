//! Synchronous admission checks run before a job is created.

use std::path::Path;

use mime_guess::mime::{self, Mime};
use tracing::debug;

use crate::error::IntakeError;

/// 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// A document offered for assessment.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentIntake {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub filename: Option<String>,
}

impl std::fmt::Debug for DocumentIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIntake")
            .field("bytes", &self.bytes.len())
            .field("media_type", &self.media_type)
            .field("filename", &self.filename)
            .finish()
    }
}

impl DocumentIntake {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, filename: Option<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            filename,
        }
    }

    pub fn pdf(bytes: Vec<u8>, filename: Option<String>) -> Self {
        Self::new(bytes, mime::APPLICATION_PDF.as_ref(), filename)
    }

    /// Reads a file and guesses its media type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, IntakeError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| IntakeError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());

        Ok(Self::new(bytes, media_type, filename))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Rejects anything that is not `application/pdf` or exceeds `max_size`.
    /// Parameters such as `; charset=binary` are ignored.
    pub fn validate(&self, max_size: u64) -> Result<(), IntakeError> {
        let parsed: Mime = self
            .media_type
            .trim()
            .parse()
            .map_err(|_| IntakeError::InvalidMediaType(self.media_type.clone()))?;

        if parsed.essence_str() != mime::APPLICATION_PDF.essence_str() {
            return Err(IntakeError::UnsupportedMediaType(
                parsed.essence_str().to_string(),
            ));
        }

        if self.size() > max_size {
            return Err(IntakeError::TooLarge {
                size: self.size(),
                limit: max_size,
            });
        }

        debug!(size = self.size(), filename = ?self.filename, "Document accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_accepts_pdf_with_parameters() {
        let intake = DocumentIntake::new(b"%PDF-1.5".to_vec(), "Application/PDF; charset=binary", None);
        assert!(intake.validate(DEFAULT_MAX_FILE_SIZE).is_ok());
    }

    #[test]
    fn test_rejects_other_media_types() {
        let intake = DocumentIntake::new(b"hello".to_vec(), "text/plain", None);
        assert!(matches!(
            intake.validate(DEFAULT_MAX_FILE_SIZE),
            Err(IntakeError::UnsupportedMediaType(t)) if t == "text/plain"
        ));
    }

    #[test]
    fn test_rejects_garbage_media_type() {
        let intake = DocumentIntake::new(Vec::new(), "not a mime", None);
        assert!(matches!(
            intake.validate(DEFAULT_MAX_FILE_SIZE),
            Err(IntakeError::InvalidMediaType(_))
        ));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let intake = DocumentIntake::pdf(vec![0u8; 10], None);
        assert!(intake.validate(10).is_ok());
        assert!(matches!(
            intake.validate(9),
            Err(IntakeError::TooLarge { size: 10, limit: 9 })
        ));
    }

    #[test]
    fn test_from_path_guesses_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let pdf_path = dir.path().join("msa.pdf");
        std::fs::File::create(&pdf_path)
            .unwrap()
            .write_all(b"%PDF-1.5")
            .unwrap();
        let txt_path = dir.path().join("notes.txt");
        std::fs::write(&txt_path, "notes").unwrap();

        let pdf = DocumentIntake::from_path(&pdf_path).unwrap();
        assert_eq!(pdf.media_type, "application/pdf");
        assert_eq!(pdf.filename.as_deref(), Some("msa.pdf"));
        assert!(pdf.validate(DEFAULT_MAX_FILE_SIZE).is_ok());

        let txt = DocumentIntake::from_path(&txt_path).unwrap();
        assert!(txt.validate(DEFAULT_MAX_FILE_SIZE).is_err());

        assert!(matches!(
            DocumentIntake::from_path(dir.path().join("missing.pdf")),
            Err(IntakeError::ReadFile { .. })
        ));
    }
}
