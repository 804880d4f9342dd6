//! Core types for the RAG engine

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, Document, FileType, PAGE_SEPARATOR};
pub use query::{QueryMode, QueryRequest, RetrieveRequest};
pub use response::{
    AggregatedRecord, BatchReport, DocumentSummary, IngestError, IngestReport, QueryResponse,
    RetrievalResult, ScoredChunk, SourceRef,
};
