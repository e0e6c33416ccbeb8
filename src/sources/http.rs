use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::{Client, StatusCode};

use crate::cache::token::Token;
use crate::config::settings::SettingsConfig;
use crate::config::sources::{GenericSourceValue, SourceConfig};
use crate::helpers::time::get_token_safety_margin_seconds;
use crate::parser::parser::parse_token;
use crate::resilience::retry::RetrySettings;
use crate::token::fetcher::FetchToken;

/// Non-2xx answer from a token issuer.
#[derive(Debug, thiserror::Error)]
#[error("HTTP request failed: {status}")]
pub struct HttpStatusError {
    pub status: StatusCode,
}

/// Token issued by an HTTP endpoint answering with JSON.
///
/// Transient failures are retried with the configured backoff inside a single
/// fetch; the token manager itself never retries.
#[derive(Debug, Clone)]
pub struct HttpSource {
    pub key: String,
    config: Arc<SourceConfig>,
    client: Client,
    retry: RetrySettings,
    safety_margin_seconds: u64,
}

impl HttpSource {
    pub fn new(key: &str, config: SourceConfig, client: Client, settings: &SettingsConfig) -> Self {
        let safety_margin_seconds = get_token_safety_margin_seconds(
            settings.safety_margin_seconds,
            config.safety_margin_seconds,
        );
        Self {
            key: key.to_owned(),
            config: Arc::new(config),
            client,
            retry: RetrySettings::from_config(settings.retry.as_ref()),
            safety_margin_seconds,
        }
    }

    async fn fetch_once(&self) -> Result<Token> {
        let req_cfg = &self.config.request;
        let mut request = self.client.request(req_cfg.method.clone(), &req_cfg.url);

        // Build headers dynamically
        if let Some(headers) = &req_cfg.headers {
            for (key, v) in headers {
                request = request.header(key, prepare_generic_source_value(v).await?);
            }
        }
        if let Some(form) = &req_cfg.form {
            request = request.form(&prepare_values(form).await?);
        }
        if let Some(body) = &req_cfg.body {
            request = request.json(&prepare_values(body).await?);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("request to '{}' failed", req_cfg.url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpStatusError { status }.into());
        }
        let body = response.text().await?;
        parse_token(&body, &self.config.response, self.safety_margin_seconds, Utc::now())
    }
}

impl FetchToken for HttpSource {
    async fn fetch_token(&self) -> Result<Token> {
        self.retry.run_with_retry_if(|| self.fetch_once(), is_transient).await
    }
}

/// Transport errors, 5xx and 429 are worth another attempt. Client errors,
/// unresolvable request values and unparseable bodies are not.
pub fn is_transient(err: &anyhow::Error) -> bool {
    if let Some(status_err) = err.downcast_ref::<HttpStatusError>() {
        let status = status_err.status;
        return status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
    }
    err.downcast_ref::<reqwest::Error>()
        .is_some_and(|e| !e.is_builder())
}

async fn prepare_values(values: &HashMap<String, GenericSourceValue>) -> Result<HashMap<String, String>> {
    let mut prepared = HashMap::with_capacity(values.len());
    for (k, v) in values {
        prepared.insert(k.to_owned(), prepare_generic_source_value(v).await?);
    }
    Ok(prepared)
}

async fn prepare_generic_source_value(value: &GenericSourceValue) -> Result<String> {
    match value {
        GenericSourceValue::Plain(value) | GenericSourceValue::Literal { value } => Ok(value.to_owned()),
        GenericSourceValue::FromEnv { from_env } => std::env::var(from_env)
            .with_context(|| format!("environment variable '{}' is not set", from_env)),
        GenericSourceValue::FromFile { path } => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read '{}'", path))
            .map(|res| res.trim().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[tokio::test]
    #[serial]
    async fn generic_values_resolve_from_env_and_file() {
        std::env::set_var("TOKEN_KEEPER_TEST_SECRET", "from-env");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  from-file  ").unwrap();

        let env = GenericSourceValue::FromEnv { from_env: "TOKEN_KEEPER_TEST_SECRET".into() };
        let path = GenericSourceValue::FromFile { path: file.path().to_string_lossy().into_owned() };
        let plain = GenericSourceValue::Plain("plain".into());

        assert_eq!(prepare_generic_source_value(&env).await.unwrap(), "from-env");
        assert_eq!(prepare_generic_source_value(&path).await.unwrap(), "from-file");
        assert_eq!(prepare_generic_source_value(&plain).await.unwrap(), "plain");

        std::env::remove_var("TOKEN_KEEPER_TEST_SECRET");
        let err = prepare_generic_source_value(&env).await.unwrap_err();
        assert!(err.to_string().contains("TOKEN_KEEPER_TEST_SECRET"));
        assert!(!is_transient(&err));
    }

    #[test]
    fn only_server_side_statuses_are_transient() {
        let status = |code: u16| anyhow::Error::from(HttpStatusError { status: StatusCode::from_u16(code).unwrap() });

        assert!(is_transient(&status(500)));
        assert!(is_transient(&status(503)));
        assert!(is_transient(&status(429)));
        assert!(!is_transient(&status(400)));
        assert!(!is_transient(&status(401)));
        assert!(!is_transient(&status(404)));
        assert!(!is_transient(&anyhow::anyhow!("body field '/access_token' not found or not a string")));
    }
}
