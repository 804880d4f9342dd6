//! Labeled-figure extraction for comparison queries

use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::AggregationConfig;
use crate::error::Result;
use crate::types::{AggregatedRecord, QueryMode, QueryRequest, RetrievalResult};

/// Classifies queries and collects `label → value` figures from chunks
#[derive(Debug, Clone)]
pub struct Aggregator {
    pattern: Regex,
    comparison_terms: Vec<Vec<String>>,
}

impl Aggregator {
    /// Build from config; fails if the pattern is invalid
    pub fn from_config(config: &AggregationConfig) -> Result<Self> {
        let pattern = config.compile_pattern()?;
        let comparison_terms = config
            .comparison_terms
            .iter()
            .map(|term| words(term))
            .filter(|w| !w.is_empty())
            .collect();
        Ok(Self {
            pattern,
            comparison_terms,
        })
    }

    /// Resolve the mode a query runs in
    ///
    /// An explicit mode wins. In auto mode the query is a comparison when any
    /// configured term appears in it as a whole word (or word sequence).
    pub fn classify(&self, request: &QueryRequest) -> QueryMode {
        match request.mode {
            QueryMode::Auto => {
                let query = words(&request.question);
                let hit = self
                    .comparison_terms
                    .iter()
                    .any(|term| query.windows(term.len()).any(|w| w == term.as_slice()));
                if hit {
                    QueryMode::Comparison
                } else {
                    QueryMode::Freeform
                }
            }
            explicit => explicit,
        }
    }

    /// Collect figures from the retrieved chunks
    ///
    /// With a field, only chunks mentioning it are scanned, unless none do.
    /// A label seen twice keeps its last value.
    pub fn aggregate(&self, result: &RetrievalResult, field: Option<&str>) -> AggregatedRecord {
        let field = field.map(str::trim).filter(|f| !f.is_empty());

        let mentions: HashSet<usize> = match field {
            Some(field) => {
                let needle = field.to_lowercase();
                result
                    .iter()
                    .enumerate()
                    .filter(|(_, hit)| hit.chunk.content.to_lowercase().contains(&needle))
                    .map(|(i, _)| i)
                    .collect()
            }
            None => HashSet::new(),
        };

        let mut record = AggregatedRecord {
            field: field.map(str::to_string),
            ..Default::default()
        };

        for (i, hit) in result.iter().enumerate() {
            if !mentions.is_empty() && !mentions.contains(&i) {
                continue;
            }
            for caps in self.pattern.captures_iter(&hit.chunk.content) {
                let (Some(label), Some(value)) = (caps.name("label"), caps.name("value")) else {
                    continue;
                };
                let label = label.as_str().trim();
                let Ok(value) = value.as_str().parse::<f64>() else {
                    continue;
                };
                if !label.is_empty() {
                    record.values.insert(label.to_string(), value);
                }
            }
        }

        tracing::debug!(
            "Aggregated {} figures from {} chunks",
            record.values.len(),
            if mentions.is_empty() { result.len() } else { mentions.len() }
        );
        record
    }
}

fn words(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}
