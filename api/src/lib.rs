pub mod auth;
pub mod config;
pub mod error;
pub mod hackrx;
pub mod query;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use claim_rag::ClaimEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub use config::ServerConfig;
pub use error::{ApiError, ErrorResponse};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ClaimEngine>,
    pub upload_dir: PathBuf,
    pub api_token: Option<String>,
}

impl AppState {
    pub fn new(engine: Arc<ClaimEngine>, config: &ServerConfig) -> Self {
        Self {
            engine,
            upload_dir: config.upload_dir.clone(),
            api_token: config.api_token.clone(),
        }
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> Router {
    let hackrx = Router::new()
        .route("/hackrx/run", post(hackrx::handle_hackrx_run))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer));

    let app = Router::new()
        .route("/ping", get(query::ping))
        .route("/query", post(query::handle_query))
        .merge(hackrx)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Static files are mounted last so API routes take precedence.
    match &config.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => app,
    }
}
