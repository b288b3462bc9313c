use crate::error::ClientError;
use crate::models::{DecisionResult, ErrorBody, QueryRequest};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/query";

/// Sends one query submission and returns the backend's decision.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn submit(&self, request: QueryRequest) -> Result<DecisionResult, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    /// `None` waits for the backend indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
        }
    }
}

/// Posts submissions as `multipart/form-data` to a fixed endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn submit(&self, request: QueryRequest) -> Result<DecisionResult, ClientError> {
        let form = multipart_form(request)?;

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(server_error(status, &body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// `query` always, `file` only when one is attached.
fn multipart_form(request: QueryRequest) -> Result<Form, ClientError> {
    let mut form = Form::new().text("query", request.query);

    if let Some(file) = request.file {
        let mut part = Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part.mime_str(content_type)?;
        }
        form = form.part("file", part);
    }

    Ok(form)
}

fn server_error(status: StatusCode, body: &[u8]) -> ClientError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { error, message }) => ClientError::Server {
            status: status.as_u16(),
            error,
            message,
        },
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            ClientError::Server {
                status: status.as_u16(),
                error: "http_error".to_string(),
                message: if text.is_empty() {
                    status.canonical_reason().unwrap_or("unknown status").to_string()
                } else {
                    text
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_error_body_is_decoded() {
        let err = server_error(
            StatusCode::BAD_GATEWAY,
            br#"{"error":"llm_error","message":"decision backend failed"}"#,
        );
        match err {
            ClientError::Server { status, error, message } => {
                assert_eq!(status, 502);
                assert_eq!(error, "llm_error");
                assert_eq!(message, "decision backend failed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn plain_error_body_falls_back_to_text() {
        match server_error(StatusCode::NOT_FOUND, b"") {
            ClientError::Server { error, message, .. } => {
                assert_eq!(error, "http_error");
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
