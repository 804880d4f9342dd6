//! Document endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Document, DocumentSummary, IngestReport};

/// A document given directly as page texts
#[derive(Debug, Deserialize)]
pub struct IngestDocumentRequest {
    /// Reuse an id to replace a previously ingested document
    #[serde(default)]
    pub id: Option<Uuid>,
    pub filename: String,
    pub pages: Vec<String>,
}

/// POST /api/documents - Index a document from its page texts
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestDocumentRequest>,
) -> Result<Json<IngestReport>> {
    let doc = match request.id {
        Some(id) => Document::with_id(id, request.filename, request.pages),
        None => Document::new(request.filename, request.pages),
    };
    let report = state.service().ingest_document(doc).await?;
    Ok(Json(report))
}

/// GET /api/documents - List indexed documents
pub async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentSummary>> {
    Json(state.service().list_documents())
}

/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    Ok(Json(state.service().get_document(&id)?))
}

/// DELETE /api/documents/:id
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let removed = state.service().remove_document(&id)?;
    Ok(Json(serde_json::json!({
        "id": id,
        "removed_chunks": removed
    })))
}
