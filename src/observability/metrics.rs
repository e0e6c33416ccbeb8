use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub static HIT_MSG: &str = "hit";
pub static MISS_MSG: &str = "miss";

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        // metric names and label sets are static, registration cannot collide
        Arc::new(Metrics::new().expect("static metric definitions are valid"))
    }).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Cache metrics
    pub cache_lookups: IntCounterVec,
    pub token_expiry_unix: IntGaugeVec,

    // Fetch metrics
    pub token_fetch_requests: IntCounterVec,
    pub token_fetch_failures: IntCounterVec,
    pub token_fetch_duration: HistogramVec,
    pub registered_fetchers: IntGauge,

    // Server metrics
    pub token_requests: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some("tokenkeeper".into()), None)?;

        let metrics = Self {
            // Cache
            cache_lookups: IntCounterVec::new(Opts::new("cache_lookups_total", "Token cache lookups by result"), &["result"])?,
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Expiry of the last fetched token"), &["key"])?,

            // Fetch
            token_fetch_requests: IntCounterVec::new(Opts::new("token_fetch_requests_total", "Fetcher invocations by key"), &["key"])?,
            token_fetch_failures: IntCounterVec::new(Opts::new("token_fetch_failures_total", "Failed fetcher invocations by key"), &["key"])?,
            token_fetch_duration: HistogramVec::new(HistogramOpts::new("token_fetch_duration_seconds", "Fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["key"])?,
            registered_fetchers: IntGauge::new("registered_fetchers", "Fetchers registered on the serving token manager")?,

            // Server
            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "HTTP token requests by status"), &["status"])?,

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup")?,
            up: IntGauge::new("up", "1 if service is healthy")?,

            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.cache_lookups.clone()))?;
        reg.register(Box::new(metrics.token_expiry_unix.clone()))?;
        reg.register(Box::new(metrics.token_fetch_requests.clone()))?;
        reg.register(Box::new(metrics.token_fetch_failures.clone()))?;
        reg.register(Box::new(metrics.token_fetch_duration.clone()))?;
        reg.register(Box::new(metrics.registered_fetchers.clone()))?;
        reg.register(Box::new(metrics.token_requests.clone()))?;
        reg.register(Box::new(metrics.config_validation_errors.clone()))?;
        reg.register(Box::new(metrics.up.clone()))?;

        Ok(metrics)
    }
}
