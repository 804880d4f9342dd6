//! Error types for the RAG engine

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG engine errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Text extraction failed; the document was not indexed
    #[error("Failed to ingest '{document}': {message}")]
    IngestionFailure { document: String, message: String },

    /// Vector length differs from the index dimensionality
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Search against an index with no entries
    #[error("Embedding index is empty")]
    EmptyIndex,

    /// Embedding service error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Language model error
    #[error("LLM error: {0}")]
    Llm(String),

    /// External service refused the call because of rate limiting
    #[error("Rate limited by {0}")]
    RateLimited(String),

    /// External service call exceeded its time budget
    #[error("{service} call timed out after {secs}s")]
    Timeout { service: String, secs: u64 },

    /// External service rejected the request as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an ingestion failure
    pub fn ingestion(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IngestionFailure {
            document: document.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a timeout error
    pub fn timeout(service: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            service: service.into(),
            secs,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the caller may reasonably retry the same call later
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Timeout { .. } | Error::RateLimited(_) => true,
            Error::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Config(_) => (StatusCode::BAD_REQUEST, "config_error"),
            Error::IngestionFailure { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "ingestion_error"),
            Error::DimensionMismatch { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "dimension_mismatch"),
            Error::EmptyIndex => (StatusCode::CONFLICT, "empty_index"),
            Error::Embedding(_) => (StatusCode::BAD_GATEWAY, "embedding_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            Error::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::DocumentNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
                "retriable": self.is_retriable(),
            }
        }));

        (status, body).into_response()
    }
}
