//! Page-text extraction from uploaded files

use crate::error::{Error, Result};
use crate::types::FileType;

/// Form feed, the page break marker for plain-text documents
const FORM_FEED: char = '\u{0c}';

/// Turns a file into its ordered page texts
///
/// Implementations are CPU-bound and synchronous; callers run them on a
/// blocking thread.
pub trait TextExtractor: Send + Sync {
    /// Extract one string per page
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<String>>;

    /// Get extractor name for logging
    fn name(&self) -> &str;
}

/// Extractor for PDFs (via `pdf-extract`) and plain text/markdown
#[derive(Debug, Clone, Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    /// Create a new extractor
    pub fn new() -> Self {
        Self
    }

    fn extract_pdf(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        if !data.starts_with(b"%PDF") {
            return Err(Error::ingestion(filename, "missing %PDF header"));
        }
        pdf_extract::extract_text_from_mem_by_pages(data)
            .map_err(|e| Error::ingestion(filename, format!("pdf-extract failed: {}", e)))
    }

    fn extract_text(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::ingestion(filename, format!("not valid UTF-8: {}", e)))?;
        Ok(text.split(FORM_FEED).map(str::to_string).collect())
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let pages = match FileType::from_filename(filename) {
            FileType::Pdf => Self::extract_pdf(filename, data)?,
            FileType::Txt | FileType::Markdown => Self::extract_text(filename, data)?,
            FileType::Unknown => {
                return Err(Error::ingestion(filename, "unsupported file type"));
            }
        };

        if pages.iter().all(|p| p.trim().is_empty()) {
            // Image-only PDFs come back as blank pages
            return Err(Error::ingestion(
                filename,
                "no extractable text (scanned or empty document)",
            ));
        }

        tracing::debug!("Extracted {} pages from {}", pages.len(), filename);
        Ok(pages)
    }

    fn name(&self) -> &str {
        "pdf-extract"
    }
}
