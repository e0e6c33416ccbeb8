use std::error::Error as StdError;
use std::sync::Arc;

/// Failure returned by [`TokenManager::get_token`](crate::token::manager::TokenManager::get_token).
///
/// Cloneable so one failed fetch can be handed to every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenError {
    #[error("no fetcher registered for key: {key}")]
    MissingFetcher { key: String },

    #[error("failed to fetch token for key {key}: {source}")]
    FetchFailed {
        key: String,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },
}

impl TokenError {
    pub fn fetch_failed(key: &str, err: anyhow::Error) -> Self {
        let source: Box<dyn StdError + Send + Sync> = err.into();
        TokenError::FetchFailed {
            key: key.to_owned(),
            source: Arc::from(source),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            TokenError::MissingFetcher { key } => key,
            TokenError::FetchFailed { key, .. } => key,
        }
    }
}
