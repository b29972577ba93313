pub mod normalize;
pub mod pdf;

use serde::Serialize;

use crate::error::ExtractionError;

pub use pdf::PdfTextExtractor;

/// Byte range of one page inside [`PlainText::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpan {
    pub number: u32,
    pub start: usize,
    pub end: usize,
}

/// Plain-text rendition of a document with per-page boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PlainText {
    pub text: String,
    pub pages: Vec<PageSpan>,
}

impl PlainText {
    /// Joins normalized page texts with a newline, recording each page's span.
    /// Empty pages keep a zero-length span so page numbering is preserved.
    pub fn from_pages<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = (u32, String)>,
    {
        let mut text = String::new();
        let mut spans = Vec::new();

        for (number, page_text) in pages {
            if !page_text.is_empty() && !text.is_empty() {
                text.push('\n');
            }
            let start = text.len();
            text.push_str(&page_text);
            spans.push(PageSpan {
                number,
                start,
                end: text.len(),
            });
        }

        Self { text, pages: spans }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_text(&self, number: u32) -> Option<&str> {
        self.pages
            .iter()
            .find(|p| p.number == number)
            .and_then(|p| self.text.get(p.start..p.end))
    }

    /// Page number containing the given byte offset.
    pub fn page_at(&self, offset: usize) -> Option<u32> {
        self.pages
            .iter()
            .find(|p| p.start <= offset && offset < p.end)
            .map(|p| p.number)
    }
}

/// Converts raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<PlainText, ExtractionError>;
}
