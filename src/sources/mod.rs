use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tracing::{info, warn};

use crate::config::settings::SettingsConfig;
use crate::config::sources::ServiceConfig;
use crate::observability::metrics::get_metrics;
use crate::token::fetcher::TokenFetcher;
use crate::token::manager::TokenManager;

pub mod http;

use http::HttpSource;

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5_000;

/// Shared client for every configured source.
pub fn build_client(settings: &SettingsConfig) -> Result<Client> {
    let timeout = settings.http_timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS);
    Client::builder()
        .timeout(Duration::from_millis(timeout))
        .build()
        .context("failed to build HTTP client")
}

/// Register one fetcher per configured source. Returns the number registered.
///
/// Also publishes the manager's fetcher count as the `registered_fetchers` gauge,
/// so call it for the one manager the process serves from.
pub async fn register_sources(manager: &TokenManager, config: &ServiceConfig, client: &Client) -> usize {
    let mut keys: Vec<&String> = config.sources.keys().collect();
    keys.sort();

    for key in &keys {
        if manager.has_fetcher(key).await {
            warn!(key = %key, "replacing existing fetcher");
        }
        let source = HttpSource::new(key, config.sources[*key].clone(), client.clone(), &config.settings);
        manager.register_fetcher(key.as_str(), TokenFetcher::from_source(source)).await;
        info!(key = %key, "registered token source");
    }

    let registered = manager.registered_keys().await.len();
    get_metrics().await.registered_fetchers.set(registered as i64);
    keys.len()
}
