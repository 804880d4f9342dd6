//! Ingestion pipeline orchestration: extract then chunk

use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

use super::chunker::TextChunker;
use super::parser::TextExtractor;

/// Extraction and chunking for one document at a time
pub struct IngestPipeline {
    /// Page-text extractor
    extractor: Arc<dyn TextExtractor>,
    /// Text chunker
    chunker: TextChunker,
    /// Budget for extracting a single file
    extract_timeout: Duration,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(config: &RagConfig, extractor: Arc<dyn TextExtractor>) -> Result<Self> {
        Ok(Self {
            extractor,
            chunker: TextChunker::from_config(&config.chunking)?,
            extract_timeout: Duration::from_secs(config.extraction.timeout_secs),
        })
    }

    /// Extract a file into a document on a blocking thread, under a timeout
    pub async fn load(&self, filename: &str, data: Vec<u8>) -> Result<Document> {
        tracing::debug!("Extracting {} with {}", filename, self.extractor.name());
        let extractor = Arc::clone(&self.extractor);
        let name = filename.to_string();
        let task = tokio::task::spawn_blocking(move || extractor.extract(&name, &data));

        let pages = match tokio::time::timeout(self.extract_timeout, task).await {
            Ok(Ok(result)) => result?,
            // A panic inside the extraction library lands here
            Ok(Err(join_err)) => {
                return Err(Error::ingestion(
                    filename,
                    format!("extractor crashed: {}", join_err),
                ))
            }
            Err(_) => {
                return Err(Error::ingestion(
                    filename,
                    format!(
                        "extraction timed out after {}s",
                        self.extract_timeout.as_secs()
                    ),
                ))
            }
        };

        Ok(Document::new(filename, pages))
    }

    /// Create chunks from a document
    pub fn chunk(&self, doc: &Document) -> Vec<Chunk> {
        self.chunker.chunk_document(doc)
    }
}
