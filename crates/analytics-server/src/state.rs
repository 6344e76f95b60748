//! Application State

use std::sync::Arc;
use std::time::Instant;

use crypto_analytics::{AnalyticsEngine, MarketDataCollector};

use crate::monitor::PerformanceMonitor;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Stateless analytics kernel
    pub engine: Arc<dyn AnalyticsEngine>,

    /// Background market data collector (read-only from handlers)
    pub collector: Arc<dyn MarketDataCollector>,

    /// Request counters, written by the request-log middleware
    pub monitor: PerformanceMonitor,

    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<dyn AnalyticsEngine>, collector: Arc<dyn MarketDataCollector>) -> Self {
        Self {
            engine,
            collector,
            monitor: PerformanceMonitor::new(),
            started_at: Instant::now(),
        }
    }
}
