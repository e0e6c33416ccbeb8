use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::{Cache, CacheValue};

/// Unbounded in-process cache: one map behind one lock.
///
/// Clones share the same store. Entries live until overwritten or flushed;
/// there is no expiry sweep and no eviction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    inner: Arc<RwLock<HashMap<String, CacheValue>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn set(&self, key: &str, value: CacheValue) {
        let mut map = self.inner.write().await;
        map.insert(key.to_owned(), value);
    }

    async fn get(&self, key: &str) -> Option<CacheValue> {
        self.inner.read().await.get(key).cloned()
    }

    async fn set_all(&self, values: HashMap<String, CacheValue>) {
        let mut map = self.inner.write().await;
        map.extend(values);
    }

    async fn get_all(&self) -> HashMap<String, CacheValue> {
        let map = self.inner.read().await;
        let mut snapshot = HashMap::with_capacity(map.len());
        for (key, value) in map.iter() {
            snapshot.insert(key.clone(), value.clone());
        }
        snapshot
    }

    async fn flush(&self) {
        let mut map = self.inner.write().await;
        *map = HashMap::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn set_get_set_all_get_all_flush() {
        let cache = InMemoryCache::new();

        cache.set("foo", "bar".into()).await;
        assert_eq!(cache.get("foo").await, Some(CacheValue::Text("bar".into())));

        let mut batch = HashMap::new();
        batch.insert("a".to_string(), CacheValue::Json(json!(1)));
        batch.insert("b".to_string(), CacheValue::Json(json!(2)));
        cache.set_all(batch).await;
        assert_eq!(cache.get("a").await, Some(CacheValue::Json(json!(1))));
        assert_eq!(cache.get("b").await, Some(CacheValue::Json(json!(2))));

        let all = cache.get_all().await;
        assert_eq!(all.len(), 3);
        assert_eq!(all["foo"], CacheValue::Text("bar".into()));

        cache.flush().await;
        assert!(cache.get("foo").await.is_none());
        assert!(cache.get("a").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let cache = InMemoryCache::new();
        assert!(cache.get("never-set").await.is_none());
    }

    #[tokio::test]
    async fn set_overwrites_and_set_all_merges() {
        let cache = InMemoryCache::new();
        cache.set("k", "first".into()).await;
        cache.set("k", "second".into()).await;
        assert_eq!(cache.get("k").await, Some(CacheValue::Text("second".into())));

        let mut batch = HashMap::new();
        batch.insert("k".to_string(), CacheValue::from("third"));
        batch.insert("other".to_string(), CacheValue::from("x"));
        cache.set("untouched", "keep".into()).await;
        cache.set_all(batch).await;

        assert_eq!(cache.get("k").await, Some(CacheValue::Text("third".into())));
        assert_eq!(cache.get("untouched").await, Some(CacheValue::Text("keep".into())));
        assert_eq!(cache.len().await, 3);
    }

    #[tokio::test]
    async fn snapshot_is_isolated_from_store() {
        let cache = InMemoryCache::new();
        cache.set("foo", "bar".into()).await;

        let mut snapshot = cache.get_all().await;
        snapshot.insert("foo".to_string(), "changed".into());
        snapshot.insert("extra".to_string(), "x".into());

        assert_eq!(cache.get("foo").await, Some(CacheValue::Text("bar".into())));
        assert!(cache.get("extra").await.is_none());
        assert_eq!(cache.get_all().await.len(), 1);

        // writes after the snapshot do not leak into it either
        let before = cache.get_all().await;
        cache.set("late", "y".into()).await;
        cache.flush().await;
        assert_eq!(before.len(), 1);
    }

    #[tokio::test]
    async fn flush_twice_leaves_cache_empty() {
        let cache = InMemoryCache::new();
        cache.set("a", "1".into()).await;

        cache.flush().await;
        assert!(cache.get_all().await.is_empty());
        cache.flush().await;
        assert!(cache.get_all().await.is_empty());
        assert!(cache.get("a").await.is_none());
    }

    #[tokio::test]
    async fn clones_share_store() {
        let cache = InMemoryCache::new();
        let other = cache.clone();
        other.set("shared", "yes".into()).await;
        assert_eq!(cache.get("shared").await, Some(CacheValue::Text("yes".into())));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writers_do_not_lose_keys() {
        let cache = InMemoryCache::new();
        let mut handles = Vec::new();
        for worker in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    cache.set(&format!("w{}-{}", worker, i), CacheValue::Json(json!(i))).await;
                    let _ = cache.get_all().await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(cache.len().await, 8 * 50);
    }
}
