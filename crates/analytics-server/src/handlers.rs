//! HTTP Handlers

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crypto_analytics::{
    MarketAnalysis, MarketAnalysisRequest, MarketIndicators, Portfolio, RebalanceRecommendation,
    RiskMetrics, SnapshotSource,
};

use crate::error::{ApiError, ApiResult};
use crate::extract::JsonBody;
use crate::monitor::{EndpointMetrics, PerformanceMonitor};
use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub services: Vec<ServiceHealth>,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub name: &'static str,
    pub status: &'static str,
    pub response_time_ms: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_requests: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_rate: Option<f64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub endpoints: Vec<EndpointReport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SnapshotSource>,
}

/// Per-route request statistics
#[derive(Debug, Serialize)]
pub struct EndpointReport {
    pub endpoint: String,
    pub request_count: u64,
    pub error_count: u64,
    pub average_time_ms: f64,
    pub min_time_ms: f64,
    pub max_time_ms: f64,
    pub last_request: DateTime<Utc>,
}

impl EndpointReport {
    fn new(endpoint: String, metrics: &EndpointMetrics) -> Self {
        Self {
            endpoint,
            request_count: metrics.request_count,
            error_count: metrics.error_count,
            average_time_ms: metrics.average_time().as_secs_f64() * 1_000.0,
            min_time_ms: metrics.min_time.as_secs_f64() * 1_000.0,
            max_time_ms: metrics.max_time.as_secs_f64() * 1_000.0,
            last_request: metrics.last_request,
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint. Always `healthy`; per-service detail in `services`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = Utc::now();

    // Engine latency is the average over served requests
    let performance = state.monitor.snapshot().await;
    let degradation = performance.degradation();
    let mut endpoints: Vec<EndpointReport> = performance
        .endpoints
        .iter()
        .map(|(endpoint, metrics)| EndpointReport::new(endpoint.clone(), metrics))
        .collect();
    endpoints.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
    let engine = ServiceHealth {
        name: "ai-engine",
        status: if degradation.is_some() { "degraded" } else { "healthy" },
        response_time_ms: performance.average_response_ms(),
        error: degradation,
        total_requests: Some(performance.total_requests),
        error_rate: Some(performance.error_rate()),
        endpoints,
        running: None,
        last_update: None,
        source: None,
    };

    let collector_started = Instant::now();
    let status = state.collector.status().await;
    let collector_status = if !status.running {
        "idle"
    } else if status.is_stale(now) {
        "stale"
    } else {
        "healthy"
    };
    let collector = ServiceHealth {
        name: "data-collector",
        status: collector_status,
        response_time_ms: elapsed_ms(collector_started),
        error: None,
        total_requests: None,
        error_rate: None,
        endpoints: Vec::new(),
        running: Some(status.running),
        last_update: status.last_update,
        source: status.source,
    };

    Json(HealthResponse {
        status: "healthy",
        timestamp: now,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        services: vec![engine, collector],
    })
}

pub async fn market_indicators(State(state): State<AppState>) -> ApiResult<Json<MarketIndicators>> {
    let indicators = state.collector.market_indicators().await?;
    Ok(Json(indicators))
}

pub async fn optimize_portfolio(
    State(state): State<AppState>,
    JsonBody(portfolio): JsonBody<Portfolio>,
) -> ApiResult<Json<RebalanceRecommendation>> {
    let recommendation = state.engine.rebalance_recommendation(&portfolio)?;
    Ok(Json(recommendation))
}

pub async fn risk_metrics(
    State(state): State<AppState>,
    JsonBody(portfolio): JsonBody<Portfolio>,
) -> ApiResult<Json<RiskMetrics>> {
    let metrics = state.engine.risk_metrics(&portfolio)?;

    debug!(
        portfolio_id = %portfolio.id,
        positions = portfolio.positions.len(),
        volatility = metrics.volatility,
        "Risk metrics computed"
    );

    Ok(Json(metrics))
}

pub async fn market_analysis(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MarketAnalysisRequest>,
) -> ApiResult<Json<MarketAnalysis>> {
    let analysis = state.engine.market_analysis(request)?;
    Ok(Json(analysis))
}

/// `OPTIONS` on any route
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ============================================================================
// Middleware
// ============================================================================

/// One log line per request (method, path, status, elapsed time), and a
/// sample for the performance monitor. Server errors count as errors.
pub async fn log_request(State(monitor): State<PerformanceMonitor>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |matched| matched.as_str().to_string());
    let started = Instant::now();

    let response = next.run(req).await;
    let elapsed = started.elapsed();
    let status = response.status();

    monitor.record(&endpoint, elapsed, status.is_server_error()).await;

    info!(
        %method,
        %path,
        status = status.as_u16(),
        elapsed_ms = elapsed.as_secs_f64() * 1_000.0,
        "Request handled"
    );

    response
}
