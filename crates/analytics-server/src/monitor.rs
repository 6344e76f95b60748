//! Performance Monitor
//!
//! Request counts and latency per endpoint, fed by the request-log
//! middleware. The health check derives the `ai-engine` status from it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Error rate above which the engine reports `degraded`
pub const MAX_ERROR_RATE: f64 = 0.1;

/// Average latency above which the engine reports `degraded`
pub const MAX_AVERAGE_RESPONSE: Duration = Duration::from_millis(100);

#[derive(Clone, Debug, PartialEq)]
pub struct EndpointMetrics {
    pub request_count: u64,
    pub error_count: u64,
    total_time: Duration,
    pub min_time: Duration,
    pub max_time: Duration,
    pub last_request: DateTime<Utc>,
}

impl EndpointMetrics {
    #[allow(clippy::cast_possible_truncation)]
    pub fn average_time(&self) -> Duration {
        if self.request_count == 0 {
            return Duration::ZERO;
        }
        self.total_time / self.request_count.min(u64::from(u32::MAX)) as u32
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    total_requests: u64,
    error_count: u64,
    total_time: Duration,
    endpoints: HashMap<String, EndpointMetrics>,
}

/// Aggregate view at one instant
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceSnapshot {
    pub total_requests: u64,
    pub error_count: u64,
    pub average_response: Duration,
    pub endpoints: HashMap<String, EndpointMetrics>,
}

impl PerformanceSnapshot {
    #[allow(clippy::cast_precision_loss)]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.error_count as f64 / self.total_requests as f64
        }
    }

    pub fn average_response_ms(&self) -> f64 {
        self.average_response.as_secs_f64() * 1_000.0
    }

    /// Why the engine is degraded, if it is
    pub fn degradation(&self) -> Option<String> {
        let error_rate = self.error_rate();
        if error_rate > MAX_ERROR_RATE {
            return Some(format!("High error rate: {:.2}%", error_rate * 100.0));
        }
        if self.average_response > MAX_AVERAGE_RESPONSE {
            return Some(format!("High response time: {:.2}ms", self.average_response_ms()));
        }
        None
    }
}

#[derive(Clone, Debug, Default)]
pub struct PerformanceMonitor {
    inner: Arc<RwLock<MonitorState>>,
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, endpoint: &str, elapsed: Duration, is_error: bool) {
        let now = Utc::now();
        let mut state = self.inner.write().await;

        state.total_requests += 1;
        state.total_time += elapsed;
        if is_error {
            state.error_count += 1;
        }

        let metrics = state
            .endpoints
            .entry(endpoint.to_string())
            .or_insert_with(|| EndpointMetrics {
                request_count: 0,
                error_count: 0,
                total_time: Duration::ZERO,
                min_time: elapsed,
                max_time: elapsed,
                last_request: now,
            });
        metrics.request_count += 1;
        metrics.total_time += elapsed;
        metrics.min_time = metrics.min_time.min(elapsed);
        metrics.max_time = metrics.max_time.max(elapsed);
        metrics.last_request = now;
        if is_error {
            metrics.error_count += 1;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    pub async fn snapshot(&self) -> PerformanceSnapshot {
        let state = self.inner.read().await;
        let average_response = if state.total_requests == 0 {
            Duration::ZERO
        } else {
            state.total_time / state.total_requests.min(u64::from(u32::MAX)) as u32
        };

        PerformanceSnapshot {
            total_requests: state.total_requests,
            error_count: state.error_count,
            average_response,
            endpoints: state.endpoints.clone(),
        }
    }
}
