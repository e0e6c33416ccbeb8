use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::cache::{Cache, CacheValue, Token};
use crate::helpers::time::{get_instant, Clock, SystemClock};
use crate::observability::metrics::{get_metrics, HIT_MSG, MISS_MSG};
use crate::token::error::TokenError;
use crate::token::fetcher::TokenFetcher;

type InFlight = Shared<BoxFuture<'static, Result<String, TokenError>>>;

/// Named, cached, lazily refreshed tokens.
///
/// Tokens live in a shared [`Cache`] as [`CacheValue::Token`] entries. A read
/// that finds no entry, an entry of another kind, or an expired token calls
/// the fetcher registered for that key and stores the result.
///
/// Concurrent reads that miss on the same key share one fetch: the first
/// caller starts it, the others await the same outcome. Failures are handed
/// to every waiter and are not remembered, so the next read fetches again.
/// There are no retries and no timeouts here; both belong in the fetcher.
///
/// Clones share cache, registry and in-flight state.
#[derive(Clone)]
pub struct TokenManager {
    cache: Arc<dyn Cache>,
    clock: Arc<dyn Clock>,
    fetchers: Arc<RwLock<HashMap<String, TokenFetcher>>>,
    in_flight: Arc<Mutex<HashMap<String, InFlight>>>,
}

impl TokenManager {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self::with_clock(cache, Arc::new(SystemClock))
    }

    pub fn with_clock(cache: Arc<dyn Cache>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache,
            clock,
            fetchers: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register `fetcher` for `key`, replacing any previous one.
    pub async fn register_fetcher(&self, key: &str, fetcher: TokenFetcher) {
        self.fetchers.write().await.insert(key.to_owned(), fetcher);
        debug!(key, "fetcher registered");
    }

    /// Shorthand for registering a closure.
    pub async fn register_fn<F, Fut>(&self, key: &str, fetch: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Token>> + Send + 'static,
    {
        self.register_fetcher(key, TokenFetcher::new(fetch)).await;
    }

    pub async fn has_fetcher(&self, key: &str) -> bool {
        self.fetchers.read().await.contains_key(key)
    }

    pub async fn registered_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.fetchers.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Store a token directly, bypassing fetchers.
    ///
    /// An `expiry` in the past forces the next read to fetch.
    pub async fn set_token(&self, key: &str, value: &str, expiry: DateTime<Utc>) {
        store_token(self.cache.as_ref(), key, Token::new(value, expiry)).await;
    }

    /// Cached token for `key`, fetching a fresh one when needed.
    pub async fn get_token(&self, key: &str) -> Result<String, TokenError> {
        let metrics = get_metrics().await;
        if let Some(token) = self.valid_cached_token(key).await {
            metrics.cache_lookups.with_label_values(&[HIT_MSG]).inc();
            debug!(key, "token cache hit");
            return Ok(token.value);
        }
        metrics.cache_lookups.with_label_values(&[MISS_MSG]).inc();

        let flight = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(key) {
                Some(flight) => {
                    debug!(key, "joining in-flight fetch");
                    flight.clone()
                }
                None => {
                    // a fetch may have finished between the first read and taking the lock
                    if let Some(token) = self.valid_cached_token(key).await {
                        return Ok(token.value);
                    }

                    let fetcher = self.fetchers.read().await.get(key).cloned();
                    let Some(fetcher) = fetcher else {
                        return Err(TokenError::MissingFetcher { key: key.to_owned() });
                    };

                    let flight = self.start_fetch(key, fetcher);
                    in_flight.insert(key.to_owned(), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    async fn valid_cached_token(&self, key: &str) -> Option<Token> {
        match self.cache.get(key).await {
            Some(CacheValue::Token(token)) if !token.is_expired(self.clock.now()) => Some(token),
            Some(CacheValue::Token(_)) => {
                debug!(key, "cached token expired");
                None
            }
            // another writer put a non-token value under this key: refetch over it
            Some(other) => {
                debug!(key, kind = other.kind(), "cached value is not a token");
                None
            }
            None => None,
        }
    }

    fn start_fetch(&self, key: &str, fetcher: TokenFetcher) -> InFlight {
        let key = key.to_owned();
        let cache = self.cache.clone();
        let in_flight = self.in_flight.clone();

        async move {
            // a panic must not leave a poisoned flight behind for later callers
            let outcome = match AssertUnwindSafe(fetch_and_store(&key, cache.as_ref(), fetcher))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(panic) => {
                    let err = anyhow!("fetcher panicked: {}", panic_message(panic.as_ref()));
                    error!(key = %key, "{}", err);
                    get_metrics().await.token_fetch_failures.with_label_values(&[key.as_str()]).inc();
                    Err(TokenError::fetch_failed(&key, err))
                }
            };

            in_flight.lock().await.remove(&key);
            outcome
        }
        .boxed()
        .shared()
    }
}

async fn fetch_and_store(key: &str, cache: &dyn Cache, fetcher: TokenFetcher) -> Result<String, TokenError> {
    let metrics = get_metrics().await;
    let start = get_instant();
    metrics.token_fetch_requests.with_label_values(&[key]).inc();
    debug!(key, "fetching token");

    let result = fetcher.fetch().await;
    metrics
        .token_fetch_duration
        .with_label_values(&[key])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(token) => {
            info!(key, expiry = %token.expiry, "token fetched");
            metrics
                .token_expiry_unix
                .with_label_values(&[key])
                .set(token.expiry.timestamp());
            let value = token.value.clone();
            store_token(cache, key, token).await;
            Ok(value)
        }
        Err(err) => {
            metrics.token_fetch_failures.with_label_values(&[key]).inc();
            Err(TokenError::fetch_failed(key, err))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

async fn store_token(cache: &dyn Cache, key: &str, token: Token) {
    cache.set(key, CacheValue::Token(token)).await;
}
