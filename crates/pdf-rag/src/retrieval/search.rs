//! Query-time retrieval: embed the query, search the store

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::providers::{with_timeout, EmbeddingProvider};
use crate::types::RetrievalResult;

use super::store::ChunkStore;

/// Produces the top-k chunks for a query
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<RwLock<ChunkStore>>,
    embed_timeout: Duration,
    default_top_k: usize,
    min_score: Option<f32>,
}

impl Retriever {
    /// Create a retriever over a shared store
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<RwLock<ChunkStore>>,
    ) -> Self {
        Self {
            embedder,
            store,
            embed_timeout: Duration::from_secs(config.embeddings.timeout_secs),
            default_top_k: config.retrieval.top_k,
            min_score: config.retrieval.min_score,
        }
    }

    /// Retrieve up to `top_k` chunks (default when `None`) for `query`
    ///
    /// Fails with `Error::EmptyIndex` when nothing has been ingested.
    pub async fn retrieve(&self, query: &str, top_k: Option<usize>) -> Result<RetrievalResult> {
        let k = top_k.unwrap_or(self.default_top_k);
        if k == 0 {
            return Err(Error::InvalidRequest("top_k must be positive".into()));
        }

        let query_vector = with_timeout(
            self.embedder.name(),
            self.embed_timeout,
            self.embedder.embed(query),
        )
        .await?;

        // Read lock only after the await; never held across one
        let mut result = self.store.read().search(&query_vector, k)?;

        if let Some(min_score) = self.min_score {
            result.hits.retain(|hit| hit.score >= min_score);
        }

        tracing::debug!(
            "Retrieved {} chunks for query (k={}, top score {:?})",
            result.len(),
            k,
            result.hits.first().map(|h| h.score)
        );
        Ok(result)
    }
}
