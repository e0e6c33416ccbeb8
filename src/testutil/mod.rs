//! Test doubles for code written against [`Cache`] and [`Clock`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::cache::{Cache, CacheValue, InMemoryCache};
use crate::helpers::time::Clock;

/// Every call a [`RecordingCache`] has seen.
#[derive(Debug, Clone, Default)]
pub struct CacheCalls {
    pub get_calls: Vec<String>,
    pub set_calls: Vec<(String, CacheValue)>,
    pub set_all_calls: Vec<HashMap<String, CacheValue>>,
    pub flush_calls: usize,
}

/// In-memory cache that records calls for later assertions.
#[derive(Debug, Default)]
pub struct RecordingCache {
    store: InMemoryCache,
    calls: Mutex<CacheCalls>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the calls recorded so far.
    pub fn calls(&self) -> CacheCalls {
        self.log().clone()
    }

    fn log(&self) -> MutexGuard<'_, CacheCalls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn set(&self, key: &str, value: CacheValue) {
        self.log().set_calls.push((key.to_owned(), value.clone()));
        self.store.set(key, value).await;
    }

    async fn get(&self, key: &str) -> Option<CacheValue> {
        self.log().get_calls.push(key.to_owned());
        self.store.get(key).await
    }

    async fn set_all(&self, values: HashMap<String, CacheValue>) {
        self.log().set_all_calls.push(values.clone());
        self.store.set_all(values).await;
    }

    async fn get_all(&self) -> HashMap<String, CacheValue> {
        self.store.get_all().await
    }

    async fn flush(&self) {
        self.log().flush_calls += 1;
        self.store.flush().await;
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_every_call() {
        let cache = RecordingCache::new();
        cache.set("a", "1".into()).await;
        let _ = cache.get("a").await;
        let _ = cache.get("missing").await;
        cache.set_all(HashMap::from([("b".to_string(), CacheValue::from("2"))])).await;
        cache.flush().await;
        cache.flush().await;

        let calls = cache.calls();
        assert_eq!(calls.set_calls, vec![("a".to_string(), CacheValue::from("1"))]);
        assert_eq!(calls.get_calls, vec!["a".to_string(), "missing".to_string()]);
        assert_eq!(calls.set_all_calls.len(), 1);
        assert_eq!(calls.flush_calls, 2);
        assert!(cache.get_all().await.is_empty());
    }

    #[test]
    fn manual_clock_moves_only_on_request() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::seconds(30));
        assert_eq!(clock.now(), start + Duration::seconds(30));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
