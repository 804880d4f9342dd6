//! Embedding index, chunk storage, and query-time retrieval

pub mod distance;
pub mod index;
pub mod search;
pub mod store;

pub use index::{EmbeddingIndex, IndexHit};
pub use search::Retriever;
pub use store::ChunkStore;
