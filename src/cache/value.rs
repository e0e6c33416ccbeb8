use serde_json::Value;

use crate::cache::token::Token;

/// Entry stored in a [`Cache`](crate::cache::Cache).
///
/// The cache itself never looks inside; each consumer reads back only the
/// variant it wrote and treats anything else under its key as absent.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Token(Token),
    Text(String),
    Json(Value),
}

impl CacheValue {
    pub fn as_token(&self) -> Option<&Token> {
        match self {
            CacheValue::Token(token) => Some(token),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CacheValue::Token(_) => "token",
            CacheValue::Text(_) => "text",
            CacheValue::Json(_) => "json",
        }
    }
}

impl From<Token> for CacheValue {
    fn from(token: Token) -> Self {
        CacheValue::Token(token)
    }
}

impl From<String> for CacheValue {
    fn from(value: String) -> Self {
        CacheValue::Text(value)
    }
}

impl From<&str> for CacheValue {
    fn from(value: &str) -> Self {
        CacheValue::Text(value.to_owned())
    }
}

impl From<Value> for CacheValue {
    fn from(value: Value) -> Self {
        CacheValue::Json(value)
    }
}
