//! Lazily refreshed tokens on top of a [`Cache`](crate::cache::Cache).

pub mod error;
pub mod fetcher;
pub mod manager;

pub use error::TokenError;
pub use fetcher::{FetchToken, TokenFetcher};
pub use manager::TokenManager;
