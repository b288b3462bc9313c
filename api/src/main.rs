use anyhow::{Context, Result};
use claim_api::{router, AppState, ServerConfig};
use claim_rag::{ClaimEngine, GeminiService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = ServerConfig::from_env()?;
    let llm = GeminiService::from_env()?;
    let engine = Arc::new(ClaimEngine::new(Arc::new(llm)));

    // Documents uploaded by earlier runs are searchable again after a restart.
    let loaded = engine.load_directory(&config.upload_dir).await?;
    log::info!("Loaded {} previously uploaded documents", loaded);
    if let Some(dir) = &config.documents_dir {
        let loaded = engine.load_directory(dir).await?;
        log::info!("Loaded {} documents from {}", loaded, dir.display());
    }

    let state = AppState::new(engine, &config);
    let app = router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
