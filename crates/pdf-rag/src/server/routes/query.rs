//! Query and retrieval endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse, RetrievalResult, RetrieveRequest};

/// POST /api/query - Answer a question
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let response = state.service().query(request).await?;
    Ok(Json(response))
}

/// POST /api/retrieve - Ranked chunks without generation
pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrievalResult>> {
    let result = state.service().retrieve(&request.query, request.top_k).await?;
    Ok(Json(result))
}
