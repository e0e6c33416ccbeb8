use axum::Router;
use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;

use crate::cache::InMemoryCache;
use crate::config::sources::ServiceConfig;
use crate::token::manager::TokenManager;

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn in_memory_manager() -> (TokenManager, Arc<InMemoryCache>) {
    let cache = Arc::new(InMemoryCache::new());
    (TokenManager::new(cache.clone()), cache)
}

/// Parse a YAML service config without env expansion or validation.
pub fn service_config(yaml: &str) -> ServiceConfig {
    serde_yaml::from_str(yaml).expect("test config")
}
