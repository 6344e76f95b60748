//! Error Types for Crypto Analytics

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// A request field violates the portfolio or market-analysis invariants
    #[error("Validation error on field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Portfolio has no positions")]
    EmptyPortfolio,

    #[error("Too many tokens: {count} requested, at most {max} allowed")]
    TooManyTokens { count: usize, max: usize },

    /// Price API failure. Recovered inside the collector, never surfaced to callers.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Data collector already running")]
    AlreadyRunning,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the caller caused this error (maps to a 4xx status)
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::EmptyPortfolio | Self::TooManyTokens { .. }
        )
    }

    /// Whether the error came from the external price API
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::Network(_) | Self::Serialization(_)
        )
    }

    /// Offending field for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::EmptyPortfolio => Some("positions"),
            Self::TooManyTokens { .. } => Some("tokens"),
            _ => None,
        }
    }
}
