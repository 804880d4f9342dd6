//! Document and chunk types with page tracking for source references

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Separator placed between pages when a document is flattened to one text
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// A document that has been ingested
///
/// Immutable once ingested; re-ingesting the same id replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename, used in source references
    pub filename: String,
    /// Raw text of each page, in order
    pub pages: Vec<String>,
    /// Content hash for change detection
    pub content_hash: String,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document from its page texts
    pub fn new(filename: impl Into<String>, pages: Vec<String>) -> Self {
        Self::with_id(Uuid::new_v4(), filename, pages)
    }

    /// Create a document with a caller-chosen id (re-ingestion keeps the id)
    pub fn with_id(id: Uuid, filename: impl Into<String>, pages: Vec<String>) -> Self {
        let content_hash = hash_pages(&pages);
        Self {
            id,
            filename: filename.into(),
            pages,
            content_hash,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Number of pages
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The whole document as one string, pages joined by [`PAGE_SEPARATOR`]
    pub fn text(&self) -> String {
        self.pages.join(PAGE_SEPARATOR)
    }

    /// Byte offset at which each page starts within [`Document::text`]
    pub fn page_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.pages.len());
        let mut offset = 0;
        for page in &self.pages {
            offsets.push(offset);
            offset += page.len() + PAGE_SEPARATOR.len();
        }
        offsets
    }

    /// 1-based page number containing the byte at `offset`
    pub fn page_at(&self, offsets: &[usize], offset: usize) -> u32 {
        // partition_point gives the number of pages starting at or before `offset`
        let idx = offsets.partition_point(|&start| start <= offset);
        idx.max(1) as u32
    }
}

fn hash_pages(pages: &[String]) -> String {
    let mut hasher = Sha256::new();
    for page in pages {
        hasher.update(page.as_bytes());
        hasher.update([0x0c]);
    }
    format!("{:x}", hasher.finalize())
}

/// A chunk of text with its page range and embedding
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Filename of the parent document
    pub filename: String,
    /// Chunk text, an exact slice of the document text
    pub content: String,
    /// First page covered (1-based)
    pub page_start: u32,
    /// Last page covered (1-based, inclusive)
    pub page_end: u32,
    /// Byte offset of the chunk start in the document text
    pub char_start: usize,
    /// Byte offset one past the chunk end
    pub char_end: usize,
    /// Position of the chunk within its document
    pub chunk_index: u32,
    /// Embedding vector, empty until embedded
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Human-readable page reference, e.g. "Page 2" or "Pages 2-3"
    pub fn page_label(&self) -> String {
        if self.page_start == self.page_end {
            format!("Page {}", self.page_start)
        } else {
            format!("Pages {}-{}", self.page_start, self.page_end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.md"), FileType::Markdown);
        assert_eq!(FileType::from_filename("Makefile"), FileType::Unknown);
        assert!(!FileType::from_filename("image.png").is_supported());
    }

    #[test]
    fn test_page_offsets_and_lookup() {
        let doc = Document::new(
            "a.pdf",
            vec!["abc".to_string(), "defg".to_string(), "h".to_string()],
        );
        assert_eq!(doc.text(), "abc\n\ndefg\n\nh");

        let offsets = doc.page_offsets();
        assert_eq!(offsets, vec![0, 5, 11]);
        assert_eq!(doc.page_at(&offsets, 0), 1);
        assert_eq!(doc.page_at(&offsets, 3), 1); // separator belongs to the page before it
        assert_eq!(doc.page_at(&offsets, 5), 2);
        assert_eq!(doc.page_at(&offsets, 11), 3);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = Document::new("a.pdf", vec!["one".into(), "two".into()]);
        let b = Document::new("b.pdf", vec!["one".into(), "two".into()]);
        let c = Document::new("c.pdf", vec!["onetwo".into()]);
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, c.content_hash);
    }
}
