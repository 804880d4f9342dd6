//! Comparison-query classification and figure aggregation

pub mod aggregator;

pub use aggregator::Aggregator;
