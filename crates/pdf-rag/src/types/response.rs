//! Response types for retrieval, aggregation, and answers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::document::{Chunk, Document};
use super::query::QueryMode;

/// A retrieved chunk and its similarity score (higher is better)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Similarity score
    pub score: f32,
}

/// Chunks ordered by descending similarity, at most `k` of them
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    /// Ranked hits
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether nothing was retrieved
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Iterate over hits in rank order
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredChunk> {
        self.hits.iter()
    }

    /// Chunk ids in rank order
    pub fn chunk_ids(&self) -> Vec<Uuid> {
        self.hits.iter().map(|h| h.chunk.id).collect()
    }
}

/// Label → value figures collected for a comparison query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregatedRecord {
    /// Field the figures describe, when the query named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Figures by category label
    pub values: BTreeMap<String, f64>,
}

impl AggregatedRecord {
    /// Whether no figures were found
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value recorded for a label
    pub fn get(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied()
    }
}

/// Source reference attached to an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// First page covered
    pub page_start: u32,
    /// Last page covered
    pub page_end: u32,
    /// Similarity score
    pub score: f32,
    /// Leading text of the chunk
    pub snippet: String,
}

impl SourceRef {
    const SNIPPET_CHARS: usize = 200;

    /// Create a source reference from a scored chunk
    pub fn from_hit(hit: &ScoredChunk) -> Self {
        let chunk = &hit.chunk;
        let mut snippet: String = chunk.content.chars().take(Self::SNIPPET_CHARS).collect();
        if snippet.len() < chunk.content.len() {
            snippet.push_str("...");
        }
        Self {
            chunk_id: chunk.id,
            document_id: chunk.document_id,
            filename: chunk.filename.clone(),
            page_start: chunk.page_start,
            page_end: chunk.page_end,
            score: hit.score,
            snippet,
        }
    }
}

/// Answer to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Raw language-model output
    pub answer: String,
    /// Mode the query was resolved in (never `auto`)
    pub mode: QueryMode,
    /// Sources the answer was grounded on, in rank order
    pub sources: Vec<SourceRef>,
    /// Figures gathered for comparison queries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregated: Option<AggregatedRecord>,
    /// Number of chunks retrieved
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// Summary of an ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document ID
    pub id: Uuid,
    /// Filename
    pub filename: String,
    /// Number of pages
    pub pages: usize,
    /// Number of chunks indexed
    pub chunks: usize,
    /// Content hash
    pub content_hash: String,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl DocumentSummary {
    /// Summarize a document and its chunk count
    pub fn new(doc: &Document, chunks: usize) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            pages: doc.page_count(),
            chunks,
            content_hash: doc.content_hash.clone(),
            ingested_at: doc.ingested_at,
        }
    }
}

/// Outcome of ingesting one document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// The indexed document
    pub document: DocumentSummary,
    /// Chunks removed because the document was ingested before
    pub replaced_chunks: usize,
}

/// Per-document failure in a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestError {
    /// Filename or document id
    pub document: String,
    /// Error message
    pub error: String,
}

/// Outcome of a skip-and-continue batch ingestion
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Documents indexed
    pub ingested: Vec<DocumentSummary>,
    /// Documents skipped with their errors
    pub errors: Vec<IngestError>,
    /// Total chunks indexed across the batch
    pub total_chunks: usize,
}
