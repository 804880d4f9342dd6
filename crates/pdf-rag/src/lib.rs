//! pdf-rag: retrieval-augmented question answering over PDF documents
//!
//! Documents are split into page-tracked chunks, embedded, and held in an
//! in-memory flat index. A query is embedded, the closest chunks retrieved,
//! labeled figures aggregated for comparison questions, and a grounded prompt
//! sent to the language model.

pub mod aggregation;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use service::RagService;
pub use types::{
    document::{Chunk, Document, FileType},
    query::{QueryMode, QueryRequest},
    response::{AggregatedRecord, QueryResponse, RetrievalResult},
};
