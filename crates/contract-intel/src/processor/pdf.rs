use tracing::{debug, info_span, warn};

use crate::error::ExtractionError;
use crate::processor::normalize::normalize_page_text;
use crate::processor::{PlainText, TextExtractor};

/// Marker lopdf emits for CID fonts it cannot decode.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// How far into the byte stream the `%PDF-` header may appear.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Extracts embedded text from PDF documents with lopdf.
///
/// Image-only documents are reported as [`ExtractionError::EmptyContent`];
/// there is no OCR fallback.
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<PlainText, ExtractionError> {
        let _span = info_span!("processor.pdf", bytes = bytes.len()).entered();

        if !has_pdf_header(bytes) {
            return Err(ExtractionError::UnreadableDocument(
                "missing %PDF header".to_string(),
            ));
        }

        let doc = lopdf::Document::load_mem(bytes).map_err(|e| {
            ExtractionError::UnreadableDocument(format!("Failed to load PDF: {}", e))
        })?;

        let pages = doc.get_pages();
        let page_count = pages.len();
        let mut page_texts = Vec::with_capacity(page_count);

        for (page_num, _) in pages {
            let text = match doc.extract_text(&[page_num]) {
                Ok(raw) => normalize_page_text(&raw.replace(IDENTITY_H_PATTERN, "")),
                Err(e) => {
                    warn!(page = page_num, "Failed to extract page text: {}", e);
                    String::new()
                }
            };
            page_texts.push((page_num, text));
        }

        let plain = PlainText::from_pages(page_texts);
        if plain.text.trim().is_empty() {
            return Err(ExtractionError::EmptyContent { pages: page_count });
        }

        debug!(
            pages = page_count,
            chars = plain.text.len(),
            "Extracted PDF text"
        );
        Ok(plain)
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::pdf_with_pages;

    #[test]
    fn test_extracts_embedded_text() {
        let bytes = pdf_with_pages(&[&["Services Agreement", "Acme Corporation"]]);

        let plain = PdfTextExtractor::new().extract(&bytes).unwrap();

        assert!(plain.text.contains("Services Agreement"));
        assert!(plain.text.contains("Acme Corporation"));
        assert_eq!(plain.page_count(), 1);
    }

    #[test]
    fn test_records_page_boundaries() {
        let bytes = pdf_with_pages(&[&["Page one text"], &["Page two text"]]);

        let plain = PdfTextExtractor::new().extract(&bytes).unwrap();

        assert_eq!(plain.page_count(), 2);
        assert!(plain.page_text(1).unwrap().contains("Page one"));
        assert!(plain.page_text(2).unwrap().contains("Page two"));
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let bytes = pdf_with_pages(&[&["Net 30", "Credit Card"]]);
        let extractor = PdfTextExtractor::new();

        assert_eq!(
            extractor.extract(&bytes).unwrap(),
            extractor.extract(&bytes).unwrap()
        );
    }

    #[test]
    fn test_corrupted_pdf_is_unreadable() {
        let result = PdfTextExtractor::new().extract(b"not a valid pdf content");
        match result {
            Err(ExtractionError::UnreadableDocument(msg)) => {
                assert!(msg.contains("PDF"), "unexpected message: {}", msg);
            }
            other => panic!("Expected UnreadableDocument, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_pdf_is_unreadable() {
        let result = PdfTextExtractor::new().extract(b"%PDF-1.5\n1 0 obj\n<<");
        assert!(matches!(
            result,
            Err(ExtractionError::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_empty_bytes_are_unreadable() {
        let result = PdfTextExtractor::new().extract(&[]);
        assert!(matches!(
            result,
            Err(ExtractionError::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_page_without_text_is_empty_content() {
        let bytes = pdf_with_pages(&[&[]]);

        let result = PdfTextExtractor::new().extract(&bytes);

        assert_eq!(result, Err(ExtractionError::EmptyContent { pages: 1 }));
    }

    #[test]
    fn test_header_search_allows_leading_bytes() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"%PDF-1.7");
        assert!(has_pdf_header(&bytes));
        assert!(!has_pdf_header(b"PK\x03\x04"));
    }
}
