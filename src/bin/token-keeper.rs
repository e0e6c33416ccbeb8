use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use token_keeper::cache::InMemoryCache;
use token_keeper::config::loader;
use token_keeper::server;
use token_keeper::sources;
use token_keeper::token::TokenManager;
use token_keeper::utils::logging;
use token_keeper::utils::logging::LogLevel;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "token-keeper.yaml")]
    config: PathBuf,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // -------------------------------
    // 1. Load YAML config
    // -------------------------------

    let service_config = loader::file_to_config(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Token manager over an in-memory cache
    // -------------------------------

    let manager = TokenManager::new(Arc::new(InMemoryCache::new()));

    // -------------------------------
    // 3. Register one fetcher per source
    // -------------------------------

    let client = sources::build_client(&service_config.settings)?;
    let registered = sources::register_sources(&manager, &service_config, &client).await;
    info!("registered {} token sources", registered);

    // -------------------------------
    // 4. Serve tokens until ctrl-c
    // -------------------------------

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for shutdown signal: {}", e);
        }
        info!("shutdown signal received");
    };

    info!("Service starting...");
    server::server::start(&service_config.settings, manager, shutdown).await
}
