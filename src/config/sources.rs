use http::Method;
use serde::Deserialize;
use std::collections::HashMap;
use crate::config::settings::SettingsConfig;


/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default)]
    pub settings: SettingsConfig,
    /// token key -> where to fetch it from
    pub sources: HashMap<String, SourceConfig>,
}

/// ================================
/// Sources
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub request: RequestConfig,
    pub response: ResponseConfig,
    pub safety_margin_seconds: Option<u64>,
}

/// HTTP request details
#[derive(Debug, Deserialize, Clone)]
pub struct RequestConfig {
    pub url: String,
    #[serde(with = "http_serde::method", default = "default_method")]
    pub method: Method, // GET, POST
    pub headers: Option<HashMap<String, GenericSourceValue>>,
    /// sent as application/x-www-form-urlencoded
    pub form: Option<HashMap<String, GenericSourceValue>>,
    /// sent as JSON
    pub body: Option<HashMap<String, GenericSourceValue>>,
}

/// Header, form and body value sources
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum GenericSourceValue {
    Plain(String),
    Literal {
        value: String,
    },
    FromEnv {
        from_env: String,
    },
    FromFile {
        path: String,
    },
}

/// ================================
/// Parsing - Token & Expiration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ResponseConfig {
    /// JSON pointer to the token string, e.g. `/access_token`
    #[serde(default = "default_token_pointer")]
    pub token_pointer: String,
    pub expiry: ExpiryConfig,
}

/// Used when neither the source nor `settings` sets a margin.
pub const DEFAULT_SAFETY_MARGIN_SECONDS: u64 = 60;

/// Where the token lifetime comes from
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum ExpiryConfig {
    /// read from the response body
    Field {
        pointer: String,
        #[serde(default)]
        format: ExpirationSourceFormat,
    },
    /// issuer does not report one
    Fixed {
        ttl_seconds: u64,
    },
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationSourceFormat {
    /// Duration in seconds until expiration.
    #[default]
    Seconds,

    /// Unix timestamp (integer seconds since epoch)
    Unix,
}

fn default_method() -> Method {
    Method::GET
}

fn default_token_pointer() -> String {
    "/access_token".to_string()
}
