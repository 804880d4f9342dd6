//! Chunk store: the embedding index plus the chunks it points at

use std::collections::HashMap;
use uuid::Uuid;

use crate::config::DistanceMetric;
use crate::error::{Error, Result};
use crate::types::{Chunk, RetrievalResult, ScoredChunk};

use super::index::EmbeddingIndex;

/// Chunks by id, their vectors, and the document → chunk mapping
///
/// Every stored chunk has exactly one index entry and vice versa.
#[derive(Debug)]
pub struct ChunkStore {
    index: EmbeddingIndex,
    chunks: HashMap<Uuid, Chunk>,
    document_chunks: HashMap<Uuid, Vec<Uuid>>,
}

impl ChunkStore {
    /// Create an empty store
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            index: EmbeddingIndex::new(metric),
            chunks: HashMap::new(),
            document_chunks: HashMap::new(),
        }
    }

    /// Underlying index
    pub fn index(&self) -> &EmbeddingIndex {
        &self.index
    }

    /// Number of chunks stored
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Look up a chunk
    pub fn chunk(&self, id: &Uuid) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// Chunk count for a document
    pub fn document_chunk_count(&self, document_id: &Uuid) -> usize {
        self.document_chunks.get(document_id).map_or(0, Vec::len)
    }

    /// Replace all chunks of `document_id` with `chunks`
    ///
    /// Every chunk must carry an embedding of the index dimensionality. The
    /// batch is validated first, so on error the store is unchanged. Returns
    /// the number of chunks that were replaced.
    pub fn replace_document(&mut self, document_id: Uuid, chunks: Vec<Chunk>) -> Result<usize> {
        if let Some(stray) = chunks.iter().find(|c| c.document_id != document_id) {
            return Err(Error::internal(format!(
                "chunk {} belongs to document {}, not {}",
                stray.id, stray.document_id, document_id
            )));
        }
        self.index
            .validate_batch(chunks.iter().map(|c| c.embedding.as_slice()))?;

        let replaced = self.remove_document(&document_id);

        let mut entries = Vec::with_capacity(chunks.len());
        let mut chunk_ids = Vec::with_capacity(chunks.len());
        for mut chunk in chunks {
            let vector = std::mem::take(&mut chunk.embedding);
            entries.push((chunk.id, vector));
            chunk_ids.push(chunk.id);
            self.chunks.insert(chunk.id, chunk);
        }
        self.index.insert_batch(entries)?;
        self.document_chunks.insert(document_id, chunk_ids);

        Ok(replaced)
    }

    /// Drop every chunk of a document, returning how many were removed
    pub fn remove_document(&mut self, document_id: &Uuid) -> usize {
        let Some(chunk_ids) = self.document_chunks.remove(document_id) else {
            return 0;
        };
        for id in &chunk_ids {
            self.index.remove(id);
            self.chunks.remove(id);
        }
        chunk_ids.len()
    }

    /// Top `k` chunks for a query vector
    pub fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult> {
        let hits = self.index.search(query, k)?;
        let hits = hits
            .into_iter()
            .map(|hit| {
                self.chunks
                    .get(&hit.id)
                    .map(|chunk| ScoredChunk {
                        chunk: chunk.clone(),
                        score: hit.score,
                    })
                    .ok_or_else(|| Error::internal(format!("index entry {} has no chunk", hit.id)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RetrievalResult { hits })
    }
}
