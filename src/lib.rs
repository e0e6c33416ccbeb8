//! # Token Keeper
//!
//! Keeps named, short-lived access tokens fresh behind a shared cache.
//! A token is fetched on first use, served from the cache while valid, and
//! fetched again once it expires.
//!
//! Modules:
//! - `cache` — the key-value storage contract and its in-memory backend
//! - `token` — fetcher registry and the lazily refreshing token manager
//! - `config` — YAML service configuration, env expansion and validation
//! - `sources` — HTTP token issuers built from config
//! - `parser` — extracting tokens and expirations from issuer responses
//! - `server` — HTTP API serving tokens and metrics

pub mod cache;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod parser;
pub mod resilience;
pub mod server;
pub mod sources;
pub mod testutil;
pub mod token;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::cache::{Cache, CacheValue, InMemoryCache, Token};
pub use crate::config::sources::ServiceConfig;
pub use crate::token::{FetchToken, TokenError, TokenFetcher, TokenManager};
