//! Query request types

use serde::{Deserialize, Serialize};

/// How a query should be resolved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Decide from the query text using the configured comparison terms
    #[default]
    Auto,
    /// Grounded free-text answer
    Freeform,
    /// Aggregate labeled figures across retrieved chunks, then answer
    Comparison,
}

/// Query request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Number of chunks to retrieve (falls back to `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,

    /// Resolution mode
    #[serde(default)]
    pub mode: QueryMode,

    /// Field the comparison is about, e.g. "unemployment rate"
    #[serde(default)]
    pub field: Option<String>,
}

impl QueryRequest {
    /// Create a new query in auto mode
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: None,
            mode: QueryMode::Auto,
            field: None,
        }
    }

    /// Set the number of chunks to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Set the resolution mode
    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the comparison field
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Retrieval-only request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    /// Query text
    pub query: String,
    /// Number of chunks to retrieve (falls back to `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_defaults_from_json() {
        let req: QueryRequest = serde_json::from_str(r#"{"question": "What is X?"}"#).unwrap();
        assert_eq!(req.mode, QueryMode::Auto);
        assert!(req.top_k.is_none());
        assert!(req.field.is_none());

        let req: QueryRequest = serde_json::from_str(
            r#"{"question": "Compare rates", "mode": "comparison", "field": "unemployment rate", "top_k": 3}"#,
        )
        .unwrap();
        assert_eq!(req.mode, QueryMode::Comparison);
        assert_eq!(req.top_k, Some(3));
        assert_eq!(req.field.as_deref(), Some("unemployment rate"));
    }
}
