//! Flat in-memory embedding index
//!
//! Exact nearest-neighbor search over every stored vector. Dimensionality is
//! fixed by the first insertion and the metric by construction; both apply
//! to every later insert and search.

use std::collections::HashMap;
use uuid::Uuid;

use crate::config::DistanceMetric;
use crate::error::{Error, Result};

use super::distance::magnitude;

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    /// Chunk ID
    pub id: Uuid,
    /// Similarity score, higher is closer
    pub score: f32,
}

/// Vectors keyed by chunk id, in insertion order
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    metric: DistanceMetric,
    dimensions: Option<usize>,
    ids: Vec<Uuid>,
    vectors: Vec<Vec<f32>>,
    magnitudes: Vec<f32>,
    positions: HashMap<Uuid, usize>,
}

impl EmbeddingIndex {
    /// Create an empty index using `metric`
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            dimensions: None,
            ids: Vec::new(),
            vectors: Vec::new(),
            magnitudes: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Metric fixed at creation
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Established dimensionality, if anything was ever inserted
    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether an entry exists for `id`
    pub fn contains(&self, id: &Uuid) -> bool {
        self.positions.contains_key(id)
    }

    /// Check a vector against the established dimensionality
    fn check(&self, expected: Option<usize>, vector: &[f32]) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::embedding("cannot index an empty vector"));
        }
        match expected {
            Some(expected) if expected != vector.len() => Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Validate a batch without inserting anything
    pub fn validate_batch<'a, I>(&self, vectors: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut expected = self.dimensions;
        for vector in vectors {
            self.check(expected, vector)?;
            expected.get_or_insert(vector.len());
        }
        Ok(())
    }

    /// Insert or replace the vector for `id`
    pub fn insert(&mut self, id: Uuid, vector: Vec<f32>) -> Result<()> {
        self.check(self.dimensions, &vector)?;
        self.dimensions.get_or_insert(vector.len());

        let mag = magnitude(&vector);
        match self.positions.get(&id) {
            Some(&pos) => {
                self.vectors[pos] = vector;
                self.magnitudes[pos] = mag;
            }
            None => {
                self.positions.insert(id, self.ids.len());
                self.ids.push(id);
                self.vectors.push(vector);
                self.magnitudes.push(mag);
            }
        }
        Ok(())
    }

    /// Insert every entry or none of them
    pub fn insert_batch(&mut self, entries: Vec<(Uuid, Vec<f32>)>) -> Result<()> {
        self.validate_batch(entries.iter().map(|(_, v)| v.as_slice()))?;
        for (id, vector) in entries {
            self.insert(id, vector)?;
        }
        Ok(())
    }

    /// Remove the entry for `id`, returning whether it existed
    ///
    /// Keeps the insertion order of the remaining entries. The established
    /// dimensionality is kept even if the index becomes empty.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        let Some(pos) = self.positions.remove(id) else {
            return false;
        };
        self.ids.remove(pos);
        self.vectors.remove(pos);
        self.magnitudes.remove(pos);
        for (i, id) in self.ids.iter().enumerate().skip(pos) {
            self.positions.insert(*id, i);
        }
        true
    }

    /// Up to `k` entries by descending similarity to `query`
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<IndexHit>> {
        if self.is_empty() {
            return Err(Error::EmptyIndex);
        }
        self.check(self.dimensions, query)?;

        let query_mag = magnitude(query);
        let mut hits: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .zip(&self.magnitudes)
            .enumerate()
            .map(|(pos, (vector, &mag))| {
                (pos, self.metric.similarity(query, query_mag, vector, mag))
            })
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);

        Ok(hits
            .into_iter()
            .map(|(pos, score)| IndexHit {
                id: self.ids[pos],
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_single_entry_round_trip() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Cosine);
        let id = Uuid::new_v4();
        index.insert(id, vec![0.3, -0.2, 0.9]).unwrap();

        let hits = index.search(&[0.3, -0.2, 0.9], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, id);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dimension_established_by_first_insert() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Euclidean);
        assert_eq!(index.dimensions(), None);
        index.insert(Uuid::new_v4(), vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(index.dimensions(), Some(3));

        let err = index.insert(Uuid::new_v4(), vec![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 2 }));
        assert_eq!(index.len(), 1);

        let err = index.search(&[1.0], 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 3, actual: 1 }));
    }

    #[test]
    fn test_empty_index_search_fails() {
        let index = EmbeddingIndex::new(DistanceMetric::Cosine);
        assert!(matches!(index.search(&[1.0], 5), Err(Error::EmptyIndex)));
    }

    #[test]
    fn test_k_larger_than_len_returns_all_ranked() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Euclidean);
        let ids = ids(3);
        index.insert(ids[0], vec![10.0, 0.0]).unwrap();
        index.insert(ids[1], vec![1.0, 0.0]).unwrap();
        index.insert(ids[2], vec![5.0, 0.0]).unwrap();

        let hits = index.search(&[0.0, 0.0], 10).unwrap();
        let ranked: Vec<Uuid> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ranked, vec![ids[1], ids[2], ids[0]]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Cosine);
        let ids = ids(4);
        for id in &ids {
            index.insert(*id, vec![1.0, 1.0]).unwrap();
        }
        let first = index.search(&[1.0, 1.0], 4).unwrap();
        let second = index.search(&[1.0, 1.0], 4).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.iter().map(|h| h.id).collect::<Vec<_>>(), ids);
    }

    #[test]
    fn test_insert_batch_is_all_or_nothing() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Cosine);
        let ids = ids(3);
        let err = index
            .insert_batch(vec![
                (ids[0], vec![1.0, 0.0]),
                (ids[1], vec![0.0, 1.0]),
                (ids[2], vec![1.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 1 }));
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), None);
    }

    #[test]
    fn test_reinsert_replaces_entry() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Cosine);
        let id = Uuid::new_v4();
        index.insert(id, vec![1.0, 0.0]).unwrap();
        index.insert(id, vec![0.0, 1.0]).unwrap();
        assert_eq!(index.len(), 1);
        let hits = index.search(&[0.0, 1.0], 1).unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_remove_keeps_order_and_dimensions() {
        let mut index = EmbeddingIndex::new(DistanceMetric::Cosine);
        let ids = ids(3);
        for id in &ids {
            index.insert(*id, vec![1.0, 0.0]).unwrap();
        }
        assert!(index.remove(&ids[0]));
        assert!(!index.remove(&ids[0]));
        assert!(!index.contains(&ids[0]));

        let hits = index.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![ids[1], ids[2]]);

        index.remove(&ids[1]);
        index.remove(&ids[2]);
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), Some(2));
    }
}
