use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::token::error::TokenError;

pub const REASON_MISSING_FETCHER: &str = "MISSING_FETCHER";
pub const REASON_FETCH_FAILED: &str = "FETCH_FAILED";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub reason: String,
    pub message: String,
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { code: status.as_u16(), message: message.into(), details: Vec::new() }
    }

    pub fn with_detail(mut self, reason: &str, message: impl Into<String>) -> Self {
        self.details.push(ErrorDetail { reason: reason.to_owned(), message: message.into() });
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<&TokenError> for ApiError {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::MissingFetcher { .. } => ApiError::new(StatusCode::NOT_FOUND, "token not available")
                .with_detail(REASON_MISSING_FETCHER, err.to_string()),
            TokenError::FetchFailed { .. } => ApiError::new(StatusCode::BAD_GATEWAY, "token issuer unavailable")
                .with_detail(REASON_FETCH_FAILED, err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn token_errors_map_to_status_and_reason() {
        let missing = ApiError::from(&TokenError::MissingFetcher { key: "svc".into() });
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.details[0].reason, REASON_MISSING_FETCHER);
        assert_eq!(missing.details[0].message, "no fetcher registered for key: svc");

        let failed = ApiError::from(&TokenError::fetch_failed("svc", anyhow!("boom")));
        assert_eq!(failed.code, 502);
        assert_eq!(failed.details[0].reason, REASON_FETCH_FAILED);
        assert_eq!(failed.details[0].message, "failed to fetch token for key svc: boom");
    }

    #[test]
    fn empty_details_are_omitted() {
        let body = serde_json::to_value(ApiError::new(StatusCode::NOT_FOUND, "nope")).unwrap();
        assert_eq!(body, serde_json::json!({"code": 404, "message": "nope"}));
    }
}
