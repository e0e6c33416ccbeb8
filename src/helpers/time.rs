use std::fmt::Debug;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::config::sources::DEFAULT_SAFETY_MARGIN_SECONDS;

/// Source of the current time for expiry checks.
pub trait Clock: Debug + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn get_token_safety_margin_seconds(
    safety_margin_seconds_settings: Option<u64>,
    safety_margin_seconds_source: Option<u64>,
) -> u64 {
    // source level
    safety_margin_seconds_source
        // settings (global) level
        .or(safety_margin_seconds_settings)
        .unwrap_or(DEFAULT_SAFETY_MARGIN_SECONDS)
}

pub fn get_instant() -> Instant {
    Instant::now()
}
