//! Process-local key-value storage.
//!
//! [`Cache`] is the storage contract the token manager is written against;
//! [`InMemoryCache`] is the backend shipped with the crate.

use std::collections::HashMap;

use async_trait::async_trait;

pub mod in_memory;
pub mod token;
pub mod value;

pub use in_memory::InMemoryCache;
pub use token::Token;
pub use value::CacheValue;

/// Opaque key-value store.
///
/// All methods must be safe to call concurrently without external
/// synchronisation. None of them can fail.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: CacheValue);

    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Option<CacheValue>;

    /// Merge `values` into the store; overlapping keys are overwritten.
    async fn set_all(&self, values: HashMap<String, CacheValue>);

    /// Independent snapshot of every entry.
    async fn get_all(&self) -> HashMap<String, CacheValue>;

    /// Remove every entry.
    async fn flush(&self);
}
