use anyhow::Result;
use clap::Parser;
use claim_client::transport::DEFAULT_ENDPOINT;
use claim_client::{Attachment, ClientConfig, HttpTransport, QueryForm};
use std::path::PathBuf;
use std::time::Duration;

/// Submit a claim query to the decision backend and print the result card.
#[derive(Debug, Parser)]
#[command(name = "claim-query", version)]
struct Cli {
    /// Backend endpoint accepting multipart query submissions
    #[arg(long, env = "CLAIM_QUERY_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Free-text query, e.g. "46M, knee surgery in Pune, 3-month policy"
    #[arg(short, long)]
    query: String,

    /// Document to attach; only the first one is submitted
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Give up after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print the raw decision JSON instead of the HTML card
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let transport = HttpTransport::new(ClientConfig {
        endpoint: cli.endpoint,
        timeout: cli.timeout_secs.map(Duration::from_secs),
    })?;

    let mut attachments = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        attachments.push(Attachment::from_path(path).await?);
    }

    let mut form = QueryForm::new();
    form.set_query(cli.query);
    form.select_files(attachments);

    log::info!("Posting to {}", transport.endpoint());
    let result = form.submit(&transport).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", form.result().inner_html());
    }
    Ok(())
}
