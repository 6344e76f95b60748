//! Request Extractors

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor that reports every failure as a 400 [`ApiError`].
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header, and an
/// oversized body is a bad request rather than 413.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))?;

        let value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid JSON: {e}")))?;

        Ok(Self(value))
    }
}
