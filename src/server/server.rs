use std::future::Future;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::tokens;
use crate::token::manager::TokenManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: TokenManager,
    pub metrics_state: MetricsState,
}

impl AppState {
    pub fn new(manager: TokenManager, metrics: &Metrics) -> Self {
        Self {
            manager,
            metrics_state: MetricsState::new(metrics.registry.clone()),
        }
    }
}

/// Token routes, plus `/metrics` when enabled.
pub async fn build_router(settings_config: &SettingsConfig, state: AppState) -> Router {
    Router::new()
        .merge(tokens::router())
        .merge(state.metrics_state.router(&settings_config.metrics).await)
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start<S>(settings_config: &SettingsConfig, manager: TokenManager, shutdown: S) -> Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let metrics = get_metrics().await;
    let state = AppState::new(manager, metrics);
    let app = build_router(settings_config, state).await;

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind '{}'", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error");
    metrics.up.set(0);
    info!("server stopped");

    served
}
