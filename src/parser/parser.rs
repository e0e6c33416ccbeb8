use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tracing::warn;

use crate::cache::token::Token;
use crate::config::sources::{ExpirationSourceFormat, ExpiryConfig, ResponseConfig};

/// Extract the token and its expiry from a JSON response body.
///
/// The returned expiry is the issuer's expiry minus `safety_margin_seconds`.
pub fn parse_token(
    body: &str,
    response: &ResponseConfig,
    safety_margin_seconds: u64,
    now: DateTime<Utc>,
) -> Result<Token> {
    let json: Value = serde_json::from_str(body).context("response body is not valid JSON")?;

    let value = json
        .pointer(&response.token_pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow!("body field '{}' not found or not a string", response.token_pointer))?;
    if value.is_empty() {
        return Err(anyhow!("body field '{}' is empty", response.token_pointer));
    }

    let issuer_expiry = match &response.expiry {
        ExpiryConfig::Field { pointer, format } => {
            let raw = json
                .pointer(pointer)
                .and_then(as_integer)
                .ok_or_else(|| anyhow!("expiration field '{}' not found or not a number", pointer))?;
            match format {
                ExpirationSourceFormat::Seconds => add_seconds(now, raw)?,
                ExpirationSourceFormat::Unix => DateTime::from_timestamp(raw, 0)
                    .ok_or_else(|| anyhow!("invalid unix timestamp {}", raw))?,
            }
        }
        ExpiryConfig::Fixed { ttl_seconds } => add_seconds(now, i64::try_from(*ttl_seconds)?)?,
    };

    let expiry = add_seconds(issuer_expiry, -i64::try_from(safety_margin_seconds)?)?;
    if expiry <= now {
        warn!(
            issuer_expiry = %issuer_expiry,
            safety_margin_seconds,
            "safety margin exceeds token lifetime, token will be refetched on every read"
        );
    }

    Ok(Token::new(value, expiry))
}

/// Accepts `3600`, `3600.0` and `"3600"`.
fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn add_seconds(at: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>> {
    Duration::try_seconds(seconds)
        .and_then(|delta| at.checked_add_signed(delta))
        .ok_or_else(|| anyhow!("expiration offset of {} seconds is out of range", seconds))
}
