use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::cache::token::Token;

/// Something that can produce a fresh token on demand.
pub trait FetchToken: Send + Sync + 'static {
    fn fetch_token(&self) -> impl Future<Output = Result<Token>> + Send;
}

/// Type-erased fetcher stored in a [`TokenManager`](crate::token::manager::TokenManager) registry.
///
/// Invoked with no manager lock held. Timeouts and retries, if wanted, belong
/// inside the fetcher itself.
#[derive(Clone)]
pub struct TokenFetcher {
    inner: Arc<dyn Fn() -> BoxFuture<'static, Result<Token>> + Send + Sync>,
}

impl TokenFetcher {
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Token>> + Send + 'static,
    {
        Self { inner: Arc::new(move || fetch().boxed()) }
    }

    pub fn from_source<S: FetchToken>(source: S) -> Self {
        let source = Arc::new(source);
        Self::new(move || {
            let source = source.clone();
            async move { source.fetch_token().await }
        })
    }

    pub fn fetch(&self) -> BoxFuture<'static, Result<Token>> {
        (self.inner)()
    }
}

impl fmt::Debug for TokenFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenFetcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    struct StaticSource(&'static str);

    impl FetchToken for StaticSource {
        async fn fetch_token(&self) -> Result<Token> {
            Ok(Token::new(self.0, Utc::now() + Duration::hours(1)))
        }
    }

    #[tokio::test]
    async fn source_backed_fetcher_produces_token() {
        let fetcher = TokenFetcher::from_source(StaticSource("from-source"));
        let token = fetcher.fetch().await.unwrap();
        assert_eq!(token.value, "from-source");

        // every call builds a fresh future
        let again = fetcher.clone().fetch().await.unwrap();
        assert_eq!(again.value, "from-source");
    }
}
