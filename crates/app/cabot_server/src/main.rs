//! CA Bot HTTP server binary.
//!
//! Serves the chat page and the `/chat` endpoint backed by Azure OpenAI and
//! an Astra DB vector collection.

use std::sync::Arc;
use std::time::Duration;

use cabot_api::config::{ApiConfig, DEFAULT_BIND_ADDR, resolve_session_secret};
use cabot_core::completion::azure::AzureChatCompleter;
use cabot_core::config::ProviderConfig;
use cabot_core::retrieval::handle::{AstraRetrieverFactory, RetrievalHandle};
use clap::Parser;
use tracing::{info, warn};

/// CLI arguments for the server.
#[derive(Parser, Debug)]
#[command(name = "cabot_server", about = "CA Bot chat server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// Connect timeout for outbound provider requests, in seconds.
    #[arg(long, default_value_t = 10)]
    connect_timeout_secs: u64,

    /// Do not connect to the vector store before serving; the first chat
    /// request builds the handle instead.
    #[arg(long, default_value_t = false)]
    skip_warmup: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv_override().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,cabot_api=debug,cabot_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let providers = ProviderConfig::from_env()?;
    info!(
        azure_endpoint = %providers.azure.endpoint,
        chat_deployment = %providers.azure.chat_deployment,
        astra_db_id = %providers.astra.database_id,
        collection = %providers.astra.collection,
        "starting cabot_server"
    );

    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(args.connect_timeout_secs))
        .build()?;

    let retrieval = Arc::new(RetrievalHandle::new(Arc::new(AstraRetrieverFactory::new(
        client.clone(),
        providers.clone(),
    ))));
    if !args.skip_warmup && retrieval.get().await.is_none() {
        warn!("vector store not reachable at startup, will retry on first request");
    }

    let completer = Arc::new(AzureChatCompleter::new(client, &providers.azure));

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        session_secret: resolve_session_secret(),
    };
    let state = cabot_api::AppState::new(config.clone(), retrieval, completer);
    let app = cabot_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
