use crate::error::ClientError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// A file picked or dropped into the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        Self {
            content_type: guess_content_type(&file_name).map(str::to_string),
            file_name,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ClientError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, bytes))
    }
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_string_lossy().to_lowercase();
    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "docx" => Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
        "txt" => Some("text/plain"),
        "md" => Some("text/markdown"),
        "eml" => Some("message/rfc822"),
        _ => None,
    }
}

/// One form submission; never reused.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query: String,
    pub file: Option<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    pub summary: String,
    #[serde(default)]
    pub clause_refs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub amount: String,
    pub justification: Justification,
}

/// Error body the backend sends with non-2xx statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_tolerates_missing_refs_and_null_amount() {
        let result: DecisionResult = serde_json::from_str(
            r#"{"decision":"informational","amount":null,"justification":{"summary":"ok"}}"#,
        )
        .unwrap();
        assert_eq!(result.amount, "");
        assert!(result.justification.clause_refs.is_empty());
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(Attachment::new("a.PDF", vec![]).content_type.as_deref(), Some("application/pdf"));
        assert_eq!(
            Attachment::new("wording.docx", vec![]).content_type.as_deref(),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        );
        assert_eq!(Attachment::new("blob", vec![]).content_type, None);
    }
}
