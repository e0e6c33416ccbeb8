use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::observability::metrics::get_metrics;
use crate::server::error::ApiError;
use crate::server::server::AppState;

pub const TOKENS_PATH: &str = "/tokens";
pub const TOKEN_PATH: &str = "/tokens/{key}";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub key: String,
    pub token: String,
}

/// Keys with a registered fetcher. Token values are never listed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenKeysResponse {
    pub keys: Vec<String>,
}

pub fn router() -> Router<AppState> {
    info!("served paths: {}, {}", TOKENS_PATH, TOKEN_PATH);
    Router::new()
        .route(TOKENS_PATH, get(list_keys))
        .route(TOKEN_PATH, get(get_token))
}

async fn list_keys(State(state): State<AppState>) -> Json<TokenKeysResponse> {
    Json(TokenKeysResponse { keys: state.manager.registered_keys().await })
}

async fn get_token(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let metrics = get_metrics().await;

    match state.manager.get_token(&key).await {
        Ok(token) => {
            metrics.token_requests.with_label_values(&[StatusCode::OK.as_str()]).inc();
            (StatusCode::OK, Json(TokenResponse { key, token })).into_response()
        }
        Err(err) => {
            let api_error = ApiError::from(&err);
            warn!(key = %key, status = api_error.code, "token request failed: {}", err);
            metrics
                .token_requests
                .with_label_values(&[api_error.status().as_str()])
                .inc();
            api_error.into_response()
        }
    }
}
