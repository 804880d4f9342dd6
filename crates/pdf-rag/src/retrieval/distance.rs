//! Vector similarity for the flat index
//!
//! Both metrics are reported as similarities, so a higher score is always
//! closer.

use crate::config::DistanceMetric;

/// L2 norm of a vector
pub fn magnitude(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product over the shorter of the two slices
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Straight-line distance between two vectors of equal length
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Cosine similarity with precomputed magnitudes; zero vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32], mag_a: f32, mag_b: f32) -> f32 {
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot(a, b) / (mag_a * mag_b)
}

impl DistanceMetric {
    /// Similarity between `query` and `stored`, higher is closer
    ///
    /// Euclidean distance d is reported as 1 / (1 + d).
    pub fn similarity(&self, query: &[f32], query_mag: f32, stored: &[f32], stored_mag: f32) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(query, stored, query_mag, stored_mag),
            DistanceMetric::Euclidean => 1.0 / (1.0 + euclidean_distance(query, stored)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = [2.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b, magnitude(&a), magnitude(&b)), 0.0);
        assert!((cosine_similarity(&a, &c, magnitude(&a), magnitude(&c)) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0], 1.0, 0.0), 0.0);
    }

    #[test]
    fn test_euclidean_similarity() {
        let a = [0.0, 0.0];
        let b = [3.0, 4.0];
        assert_eq!(euclidean_distance(&a, &b), 5.0);
        let metric = DistanceMetric::Euclidean;
        assert_eq!(metric.similarity(&a, 0.0, &a, 0.0), 1.0);
        assert!((metric.similarity(&a, 0.0, &b, 5.0) - 1.0 / 6.0).abs() < 1e-6);
    }
}
