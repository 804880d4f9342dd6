//! API routes for the RAG server

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document management
        .route(
            "/documents",
            get(documents::list_documents).post(documents::ingest_document),
        )
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        // File upload, with a larger body limit
        .route(
            "/ingest",
            post(ingest::ingest_files).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/query", post(query::query_rag))
        .route("/retrieve", post(query::retrieve))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.service().stats();
    Json(serde_json::json!({
        "name": "pdf-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Retrieval-augmented answers grounded in ingested documents",
        "index": stats,
        "endpoints": {
            "POST /api/ingest": "Upload and index files (multipart)",
            "POST /api/documents": "Index a document given as JSON pages",
            "GET /api/documents": "List indexed documents",
            "GET /api/documents/:id": "Get document details",
            "DELETE /api/documents/:id": "Remove a document and its chunks",
            "POST /api/query": "Answer a question from the indexed documents",
            "POST /api/retrieve": "Top-k chunks for a query, without generation"
        }
    }))
}
