use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_UPLOAD_DIR: &str = "document_store/uploads";
const DEFAULT_MAX_UPLOAD_MB: usize = 25;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub documents_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    /// When unset, any non-empty bearer token is accepted.
    pub api_token: Option<String>,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let max_upload_mb = match env::var("MAX_UPLOAD_MB") {
            Ok(value) => value.parse().context("MAX_UPLOAD_MB must be a number")?,
            Err(_) => DEFAULT_MAX_UPLOAD_MB,
        };

        Ok(Self {
            bind_addr,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR)),
            documents_dir: optional_var("DOCUMENTS_DIR").map(PathBuf::from),
            static_dir: optional_var("STATIC_DIR").map(PathBuf::from),
            api_token: optional_var("API_TOKEN"),
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }

    pub fn for_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr: ([127, 0, 0, 1], 0).into(),
            upload_dir: upload_dir.into(),
            documents_dir: None,
            static_dir: None,
            api_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
        }
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
