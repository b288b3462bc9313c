use crate::error::ApiError;
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    Json,
};
use claim_rag::DecisionResponse;
use serde_json::{json, Value};
use std::path::Path;

struct Upload {
    filename: String,
    bytes: Bytes,
}

/// `POST /query`: multipart `query` plus an optional `file`.
pub async fn handle_query(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DecisionResponse>, ApiError> {
    let mut query = None;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidMultipart(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("query") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::InvalidMultipart(e.body_text()))?;
                query = Some(text);
            }
            Some("file") => {
                let filename = field.file_name().map(str::to_string).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::InvalidMultipart(e.body_text()))?;
                // Browsers send an empty part when no file was picked.
                if !(filename.is_empty() && bytes.is_empty()) {
                    upload = Some(Upload { filename, bytes });
                }
            }
            _ => log::debug!("Ignoring multipart field {:?}", name),
        }
    }

    let query = query.ok_or(ApiError::MissingField("query"))?;

    if let Some(upload) = upload {
        store_upload(&state, upload).await?;
    }

    let decision = state.engine.decide(&query).await.map_err(ApiError::Llm)?;
    Ok(Json(decision))
}

async fn store_upload(state: &AppState, upload: Upload) -> Result<(), ApiError> {
    // Only the base name is kept so uploads cannot escape the upload dir.
    let filename = Path::new(&upload.filename)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::InvalidMultipart("file part has no file name".to_string()))?;

    if !claim_rag::document_processor::is_supported(&filename) {
        let extension = Path::new(&filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default();
        return Err(ApiError::UnsupportedFileType(extension));
    }

    // Extract before touching disk so a corrupt upload leaves nothing behind.
    let document = state
        .engine
        .process(&filename, &upload.bytes)
        .map_err(ApiError::from_ingest)?;

    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    let file_path = state.upload_dir.join(&filename);
    tokio::fs::write(&file_path, &upload.bytes)
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    log::info!("Uploaded file saved to: {}", file_path.display());

    state.engine.add_document(document).await;
    Ok(())
}

/// `GET /ping`
pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "pong" }))
}
