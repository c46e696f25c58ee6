//! # API Errors
//!
//! Every failure leaves the service as `{ "error", "code", "details"? }`
//! with a matching status line.

use axum::extract::rejection::JsonRejection;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use market_core::MarketError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No bearer token presented
    #[error("Authentication required: missing bearer token")]
    AuthenticationMissing,

    /// Token failed signature or expiry checks
    #[error("Authentication failed: invalid or expired token")]
    AuthenticationInvalid,

    /// Valid caller, wrong resource
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Body could not be parsed into the expected document
    #[error("Malformed request body")]
    MalformedBody(String),

    #[error(transparent)]
    Market(#[from] MarketError),
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationMissing => StatusCode::UNAUTHORIZED,
            ApiError::AuthenticationInvalid | ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Market(err) => StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if let ApiError::Market(err) = &self {
            if err.is_upstream() || status.is_server_error() {
                error!("request failed: {}", err);
            }
        }

        let body = match &self {
            ApiError::MalformedBody(details) => {
                ErrorResponse::new(self.to_string(), status.as_u16()).with_details(details.clone())
            }
            _ => ErrorResponse::new(self.to_string(), status.as_u16()),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// Result alias for handlers
pub type ApiResult<T> = Result<T, ApiError>;
