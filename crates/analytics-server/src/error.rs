//! HTTP Error Mapping
//!
//! Every failure leaves the server as JSON `{error, code, field?}`. Server-side
//! failures are logged in full and reported to the client without detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crypto_analytics::AnalyticsError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed JSON, unreadable or oversized body
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Analytics(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Analytics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::NotFound => "NOT_FOUND",
            Self::Analytics(AnalyticsError::Validation { .. }) => "VALIDATION_ERROR",
            Self::Analytics(AnalyticsError::EmptyPortfolio) => "EMPTY_PORTFOLIO",
            Self::Analytics(AnalyticsError::TooManyTokens { .. }) => "TOO_MANY_TOKENS",
            Self::Analytics(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let error = if status.is_server_error() {
            tracing::error!(error = %self, error_code = code, "Request failed");
            "internal server error".to_string()
        } else {
            tracing::warn!(error = %self, error_code = code, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        let field = match &self {
            Self::Analytics(e) => e.field().map(str::to_string),
            _ => None,
        };

        (status, Json(ErrorResponse { error, code, field })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
