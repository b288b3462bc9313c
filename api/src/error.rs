use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid multipart body: {0}")]
    InvalidMultipart(String),
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("could not process uploaded document: {0:#}")]
    UnprocessableDocument(anyhow::Error),
    #[error("{message}")]
    Unauthorized { code: &'static str, message: &'static str },
    #[error("decision backend failed: {0:#}")]
    Llm(anyhow::Error),
    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingField(_) => (StatusCode::BAD_REQUEST, "missing_field"),
            Self::InvalidMultipart(_) => (StatusCode::BAD_REQUEST, "invalid_multipart"),
            Self::UnsupportedFileType(_) => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_file_type")
            }
            Self::UnprocessableDocument(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "unprocessable_document")
            }
            Self::Unauthorized { code, .. } => (StatusCode::UNAUTHORIZED, *code),
            Self::Llm(_) => (StatusCode::BAD_GATEWAY, "llm_error"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Classifies a failed ingestion.
    pub fn from_ingest(err: anyhow::Error) -> Self {
        match err.downcast_ref::<claim_rag::UnsupportedFileType>() {
            Some(unsupported) => Self::UnsupportedFileType(unsupported.extension.clone()),
            None => Self::UnprocessableDocument(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }

        let body = ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
