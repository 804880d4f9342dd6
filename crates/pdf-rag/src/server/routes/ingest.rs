//! File upload endpoint

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{BatchReport, IngestError};

/// POST /api/ingest - Upload and index files
///
/// Every file part is ingested independently; failures are reported per
/// file and do not stop the rest of the upload.
pub async fn ingest_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchReport>> {
    let mut files = Vec::new();
    let mut read_errors = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        match field.bytes().await {
            Ok(data) => {
                tracing::info!("Received file: {} ({} bytes)", filename, data.len());
                files.push((filename, data.to_vec()));
            }
            Err(e) => read_errors.push(IngestError {
                document: filename,
                error: format!("Failed to read file: {}", e),
            }),
        }
    }

    if files.is_empty() && read_errors.is_empty() {
        return Err(Error::InvalidRequest("no files in upload".into()));
    }

    let mut report = state.service().ingest_files(files).await;
    report.errors.extend(read_errors);
    Ok(Json(report))
}
