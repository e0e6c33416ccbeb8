//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates settings (server, metrics, logging, retry) and every source
//!   (request, response pointers, expiry definition)

use std::collections::HashMap;
use tracing::{error, info};

use crate::config::settings::{RetryConfig, SettingsConfig};
use crate::config::sources::{ExpiryConfig, GenericSourceValue, ServiceConfig, SourceConfig};

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);

    if cfg.sources.is_empty() {
        errors.push("config: 'sources' is empty; at least one source required".to_string());
    }

    for (src_name, src_cfg) in &cfg.sources {
        validate_source(src_name, src_cfg, &mut errors);
    }

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        errors.sort();
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        Err(errors)
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(retry) = &settings.retry {
        validate_retry("settings.retry", retry, errors);
    }

    if let Some(s) = settings.safety_margin_seconds {
        if s > 60 * 60 * 24 * 365 {
            errors.push(format!(
                "settings.safety_margin_seconds ({}) is unreasonably large",
                s
            ));
        }
    }

    if settings.http_timeout_ms == Some(0) {
        errors.push("settings.http_timeout_ms must be > 0".to_string());
    }

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be an integer in range 0-65535",
            settings.server.port
        ));
    }

    let metrics = &settings.metrics;
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            metrics.path
        ));
    }

    if let Some(logging) = &settings.logging {
        let valid = ["trace", "debug", "info", "warn", "error"];
        if !valid.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' invalid; allowed: {:?}",
                logging.level, valid
            ));
        }
    }
}

fn validate_retry(path: &str, retry: &RetryConfig, errors: &mut Vec<String>) {
    if retry.attempts == Some(0) {
        errors.push(format!("{}.attempts must be > 0", path));
    }
    if let (Some(base), Some(max)) = (retry.base_delay_ms, retry.max_delay_ms) {
        if max < base {
            errors.push(format!(
                "{}.max_delay_ms ({}) must be >= base_delay_ms ({})",
                path, max, base
            ));
        }
    }
}

/// SOURCE VALIDATION
fn validate_source(src_name: &str, src_cfg: &SourceConfig, errors: &mut Vec<String>) {
    let url = src_cfg.request.url.trim();
    if url.is_empty() {
        errors.push(format!("sources.{}: request.url cannot be empty", src_name));
    } else if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(format!(
            "sources.{}: request.url '{}' must start with http:// or https://",
            src_name, url
        ));
    }

    match src_cfg.request.method.as_str() {
        "GET" | "POST" => {}
        m => errors.push(format!(
            "sources.{}: request.method '{}' must be 'GET' or 'POST'",
            src_name, m
        )),
    }

    if src_cfg.request.form.is_some() && src_cfg.request.body.is_some() {
        errors.push(format!(
            "sources.{}: request.form and request.body are mutually exclusive",
            src_name
        ));
    }

    for (block, values) in [
        ("headers", &src_cfg.request.headers),
        ("form", &src_cfg.request.form),
        ("body", &src_cfg.request.body),
    ] {
        if let Some(values) = values {
            validate_generic_source_values(src_name, block, values, errors);
        }
    }

    if !src_cfg.response.token_pointer.starts_with('/') {
        errors.push(format!(
            "sources.{}: response.token_pointer '{}' must be a JSON pointer starting with '/'",
            src_name, src_cfg.response.token_pointer
        ));
    }

    match &src_cfg.response.expiry {
        ExpiryConfig::Field { pointer, .. } if !pointer.starts_with('/') => {
            errors.push(format!(
                "sources.{}: response.expiry.pointer '{}' must be a JSON pointer starting with '/'",
                src_name, pointer
            ));
        }
        ExpiryConfig::Fixed { ttl_seconds: 0 } => {
            errors.push(format!("sources.{}: response.expiry.ttl_seconds must be > 0", src_name));
        }
        _ => {}
    }
}

fn validate_generic_source_values(
    src_name: &str,
    block: &str,
    values: &HashMap<String, GenericSourceValue>,
    errors: &mut Vec<String>,
) {
    for (k, v) in values {
        let empty = match v {
            GenericSourceValue::FromEnv { from_env } => from_env.trim().is_empty(),
            GenericSourceValue::FromFile { path } => path.trim().is_empty(),
            GenericSourceValue::Plain(_) | GenericSourceValue::Literal { .. } => false,
        };
        if empty {
            errors.push(format!(
                "sources.{}.request.{}.{}: reference must not be empty",
                src_name, block, k
            ));
        }
    }
}
