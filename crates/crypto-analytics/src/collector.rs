//! Market Data Collector
//!
//! A background task that keeps the [`SnapshotCache`] fresh from a
//! [`PriceFeed`]. Every refresh writes a complete BTC/ETH/LINK set: the live
//! quotes when the feed answers in time, the fixed fallback snapshot otherwise.
//!
//! ```text
//! start ──► refresh (sync) ──► spawn ──► tick ──► refresh ──► tick ...
//!                                         ▲
//! stop  ──► signal shutdown ──► join ─────┘  (no cache writes after join)
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{AnalyticsError, Result};
use crate::exchange::{fallback_snapshots, PriceFeed};
use crate::model::{MarketIndicators, PriceSnapshot, SnapshotSource};

/// Fear-greed placeholder reported in market indicators
pub const FEAR_GREED_PLACEHOLDER: f64 = 50.0;

/// DeFi TVL placeholder reported in market indicators
pub const DEFI_TVL_PLACEHOLDER: f64 = 250_000_000_000.0;

/// Scale from |24h change %| to the aggregate volatility figure
const VOLATILITY_SCALE: f64 = 0.15;

/// Refreshes older than this many intervals count as stale
const STALE_AFTER_INTERVALS: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectorConfig {
    pub refresh_interval: Duration,

    /// Deadline for a single feed fetch
    pub fetch_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl CollectorConfig {
    /// Replace zero durations with the defaults. A zero period would make
    /// the refresh ticker panic.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let mut config = self;
        if config.refresh_interval.is_zero() {
            warn!("Zero refresh interval, using default");
            config.refresh_interval = defaults.refresh_interval;
        }
        if config.fetch_timeout.is_zero() {
            warn!("Zero fetch timeout, using default");
            config.fetch_timeout = defaults.fetch_timeout;
        }
        config
    }

    pub fn stale_after(&self) -> Duration {
        self.refresh_interval * STALE_AFTER_INTERVALS
    }
}

#[derive(Debug, Default)]
struct CacheState {
    snapshots: HashMap<String, PriceSnapshot>,
    last_update: Option<DateTime<Utc>>,
    source: Option<SnapshotSource>,
}

/// Token → latest snapshot. Written only by the collector.
///
/// A refresh replaces every entry under one write lock, so readers never see
/// a mix of two refresh cycles.
#[derive(Clone, Debug, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<CacheState>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a complete refresh
    pub async fn replace(&self, snapshots: Vec<PriceSnapshot>, source: SnapshotSource, at: DateTime<Utc>) {
        let mut state = self.inner.write().await;
        for snapshot in snapshots {
            state.snapshots.insert(snapshot.symbol.to_uppercase(), snapshot);
        }
        state.last_update = Some(at);
        state.source = Some(source);
    }

    pub async fn get(&self, symbol: &str) -> Option<PriceSnapshot> {
        self.inner
            .read()
            .await
            .snapshots
            .get(&symbol.to_uppercase())
            .cloned()
    }

    /// All cached snapshots, ordered by symbol
    pub async fn all(&self) -> Vec<PriceSnapshot> {
        let state = self.inner.read().await;
        let mut snapshots: Vec<PriceSnapshot> = state.snapshots.values().cloned().collect();
        snapshots.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        snapshots
    }

    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_update
    }

    pub async fn source(&self) -> Option<SnapshotSource> {
        self.inner.read().await.source
    }

    /// Aggregate indicators over whatever is cached right now
    pub async fn market_indicators(&self, now: DateTime<Utc>) -> MarketIndicators {
        let state = self.inner.read().await;
        let snapshots = &state.snapshots;

        let total_market_cap: f64 = snapshots.values().map(|s| s.market_cap).sum();
        let dominance = |symbol: &str| {
            if total_market_cap > 0.0 {
                snapshots
                    .get(symbol)
                    .map_or(0.0, |s| s.market_cap / total_market_cap * 100.0)
            } else {
                0.0
            }
        };

        #[allow(clippy::cast_precision_loss)]
        let volatility = if snapshots.is_empty() {
            0.0
        } else {
            snapshots
                .values()
                .map(|s| s.change_24h.abs() * VOLATILITY_SCALE)
                .sum::<f64>()
                / snapshots.len() as f64
        };

        MarketIndicators {
            fear_greed_index: FEAR_GREED_PLACEHOLDER,
            total_market_cap,
            btc_dominance: dominance("BTC"),
            eth_dominance: dominance("ETH"),
            defi_tvl: DEFI_TVL_PLACEHOLDER,
            volatility,
            timestamp: now,
        }
    }
}

/// Point-in-time view of the collector for health reporting
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectorStatus {
    pub running: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub source: Option<SnapshotSource>,
    pub refresh_interval_secs: u64,

    #[serde(skip)]
    stale_after: Duration,
}

impl CollectorStatus {
    /// Running, but the last refresh is older than three intervals
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        if !self.running {
            return false;
        }
        let Some(last_update) = self.last_update else {
            return true;
        };
        (now - last_update)
            .to_std()
            .is_ok_and(|age| age > self.stale_after)
    }
}

/// Market data collector seam used by the service layer
#[async_trait]
pub trait MarketDataCollector: Send + Sync {
    /// Fail with `AlreadyRunning` if started twice
    async fn start(&self) -> Result<()>;

    /// Idempotent. No cache writes happen after this returns.
    async fn stop(&self) -> Result<()>;

    async fn market_indicators(&self) -> Result<MarketIndicators>;

    async fn snapshot(&self, symbol: &str) -> Option<PriceSnapshot>;

    async fn snapshots(&self) -> Vec<PriceSnapshot>;

    async fn status(&self) -> CollectorStatus;
}

struct RefreshTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

pub struct DataCollector {
    feed: Arc<dyn PriceFeed>,
    cache: SnapshotCache,
    config: CollectorConfig,
    clock: Arc<dyn Clock>,
    task: Mutex<Option<RefreshTask>>,
}

impl DataCollector {
    pub fn new(feed: Arc<dyn PriceFeed>, config: CollectorConfig) -> Self {
        Self::with_clock(feed, config, Arc::new(SystemClock))
    }

    pub fn with_clock(feed: Arc<dyn PriceFeed>, config: CollectorConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            feed,
            cache: SnapshotCache::new(),
            config: config.sanitized(),
            clock,
            task: Mutex::new(None),
        }
    }

    pub const fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub const fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Run one refresh cycle now
    pub async fn refresh(&self) -> SnapshotSource {
        refresh_cache(self.feed.as_ref(), &self.cache, self.config.fetch_timeout, self.clock.as_ref()).await
    }
}

/// Fetch from `feed` within `timeout` and install the result, or the
/// fallback snapshot on any failure.
async fn refresh_cache(
    feed: &dyn PriceFeed,
    cache: &SnapshotCache,
    timeout: Duration,
    clock: &dyn Clock,
) -> SnapshotSource {
    let fetched = match tokio::time::timeout(timeout, feed.fetch_snapshots()).await {
        Ok(Ok(snapshots)) if !snapshots.is_empty() => Ok(snapshots),
        Ok(Ok(_)) => Err(AnalyticsError::UpstreamUnavailable("feed returned no snapshots".to_string())),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(AnalyticsError::UpstreamUnavailable(format!(
            "fetch exceeded {}ms",
            timeout.as_millis()
        ))),
    };

    let now = clock.now();
    match fetched {
        Ok(snapshots) => {
            let source = snapshots
                .first()
                .map_or(SnapshotSource::CoinGecko, |s| s.source);
            debug!(feed = feed.name(), count = snapshots.len(), "Price snapshots refreshed");
            cache.replace(snapshots, source, now).await;
            source
        }
        Err(e) => {
            warn!(feed = feed.name(), error = %e, "Price feed failed, using fallback snapshot");
            cache.replace(fallback_snapshots(now), SnapshotSource::Mock, now).await;
            SnapshotSource::Mock
        }
    }
}

#[async_trait]
impl MarketDataCollector for DataCollector {
    async fn start(&self) -> Result<()> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(AnalyticsError::AlreadyRunning);
        }

        let source = self.refresh().await;
        info!(
            feed = self.feed.name(),
            source = source.as_str(),
            interval_secs = self.config.refresh_interval.as_secs(),
            "Data collector started"
        );

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let feed = Arc::clone(&self.feed);
        let cache = self.cache.clone();
        let clock = Arc::clone(&self.clock);
        let config = self.config;

        let handle = tokio::spawn(async move {
            let period = config.refresh_interval;
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        refresh_cache(feed.as_ref(), &cache, config.fetch_timeout, clock.as_ref()).await;
                    }
                }
            }
            debug!("Data collector loop exited");
        });

        *task = Some(RefreshTask { shutdown, handle });
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let Some(RefreshTask { shutdown, handle }) = self.task.lock().await.take() else {
            return Ok(());
        };

        let _ = shutdown.send(true);
        handle
            .await
            .map_err(|e| AnalyticsError::Internal(format!("collector task failed: {e}")))?;

        info!("Data collector stopped");
        Ok(())
    }

    async fn market_indicators(&self) -> Result<MarketIndicators> {
        Ok(self.cache.market_indicators(self.clock.now()).await)
    }

    async fn snapshot(&self, symbol: &str) -> Option<PriceSnapshot> {
        self.cache.get(symbol).await
    }

    async fn snapshots(&self) -> Vec<PriceSnapshot> {
        self.cache.all().await
    }

    async fn status(&self) -> CollectorStatus {
        let running = self.task.lock().await.is_some();
        CollectorStatus {
            running,
            last_update: self.cache.last_update().await,
            source: self.cache.source().await,
            refresh_interval_secs: self.config.refresh_interval.as_secs(),
            stale_after: self.config.stale_after(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::clock::FixedClock;

    struct CountingFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceFeed for CountingFeed {
        async fn fetch_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut snapshots = fallback_snapshots(Utc::now());
            for s in &mut snapshots {
                s.source = SnapshotSource::CoinGecko;
                s.price *= 2.0;
            }
            Ok(snapshots)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct FailingFeed;

    #[async_trait]
    impl PriceFeed for FailingFeed {
        async fn fetch_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
            Err(AnalyticsError::UpstreamUnavailable("status 503".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct SlowFeed;

    #[async_trait]
    impl PriceFeed for SlowFeed {
        async fn fetch_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    fn fast_config() -> CollectorConfig {
        CollectorConfig {
            refresh_interval: Duration::from_millis(20),
            fetch_timeout: Duration::from_millis(50),
        }
    }

    fn snapshot(symbol: &str, market_cap: f64, change_24h: f64) -> PriceSnapshot {
        PriceSnapshot {
            symbol: symbol.to_string(),
            price: 1.0,
            volume_24h: 0.0,
            change_24h,
            market_cap,
            timestamp: Utc::now(),
            source: SnapshotSource::CoinGecko,
        }
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let collector = DataCollector::new(Arc::new(FailingFeed), CollectorConfig::default());
        collector.start().await.unwrap();

        let err = collector.start().await.unwrap_err();
        assert!(matches!(err, AnalyticsError::AlreadyRunning));

        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let collector = DataCollector::new(Arc::new(FailingFeed), CollectorConfig::default());
        collector.stop().await.unwrap();

        collector.start().await.unwrap();
        collector.stop().await.unwrap();
        collector.stop().await.unwrap();
        assert!(!collector.status().await.running);
    }

    #[tokio::test]
    async fn test_failed_fetch_installs_fallback() {
        let collector = DataCollector::new(Arc::new(FailingFeed), CollectorConfig::default());
        collector.start().await.unwrap();

        let snapshots = collector.snapshots().await;
        let symbols: Vec<&str> = snapshots.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, ["BTC", "ETH", "LINK"]);
        assert!(snapshots.iter().all(|s| s.source == SnapshotSource::Mock));

        let btc = collector.snapshot("btc").await.unwrap();
        assert!((btc.price - 42_000.0).abs() < f64::EPSILON);

        let status = collector.status().await;
        assert!(status.running);
        assert_eq!(status.source, Some(SnapshotSource::Mock));
        assert!(status.last_update.is_some());

        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out_to_fallback() {
        let collector = DataCollector::new(Arc::new(SlowFeed), fast_config());
        let source = collector.refresh().await;
        assert_eq!(source, SnapshotSource::Mock);
        assert_eq!(collector.snapshots().await.len(), 3);
    }

    #[tokio::test]
    async fn test_periodic_refresh_stops_after_stop() {
        let feed = Arc::new(CountingFeed { calls: AtomicUsize::new(0) });
        let collector = DataCollector::new(feed.clone(), fast_config());

        collector.start().await.unwrap();
        assert_eq!(collector.cache().source().await, Some(SnapshotSource::CoinGecko));

        tokio::time::sleep(Duration::from_millis(120)).await;
        collector.stop().await.unwrap();

        let after_stop = feed.calls.load(Ordering::SeqCst);
        assert!(after_stop >= 2, "expected periodic refreshes, got {after_stop}");

        let last_update = collector.cache().last_update().await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), after_stop);
        assert_eq!(collector.cache().last_update().await, last_update);
    }

    #[tokio::test]
    async fn test_market_indicators_math() {
        let cache = SnapshotCache::new();
        let now = Utc::now();
        cache
            .replace(
                vec![
                    snapshot("BTC", 600.0, 2.0),
                    snapshot("ETH", 300.0, -4.0),
                    snapshot("LINK", 100.0, 0.0),
                ],
                SnapshotSource::CoinGecko,
                now,
            )
            .await;

        let indicators = cache.market_indicators(now).await;
        assert!((indicators.total_market_cap - 1_000.0).abs() < 1e-9);
        assert!((indicators.btc_dominance - 60.0).abs() < 1e-9);
        assert!((indicators.eth_dominance - 30.0).abs() < 1e-9);
        assert!((indicators.volatility - 0.3).abs() < 1e-9);
        assert!((indicators.fear_greed_index - 50.0).abs() < f64::EPSILON);
        assert!((indicators.defi_tvl - 2.5e11).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_market_indicators_empty_cache() {
        let indicators = SnapshotCache::new().market_indicators(Utc::now()).await;
        assert!(indicators.total_market_cap.abs() < f64::EPSILON);
        assert!(indicators.btc_dominance.abs() < f64::EPSILON);
        assert!(indicators.eth_dominance.abs() < f64::EPSILON);
        assert!(indicators.volatility.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_zero_durations_fall_back_to_defaults() {
        let config = CollectorConfig {
            refresh_interval: Duration::ZERO,
            fetch_timeout: Duration::ZERO,
        };
        let collector = DataCollector::new(Arc::new(FailingFeed), config);
        assert_eq!(*collector.config(), CollectorConfig::default());

        collector.start().await.unwrap();
        collector.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_staleness() {
        let clock = Arc::new(FixedClock::at_unix(1_700_000_000));
        let collector = DataCollector::with_clock(Arc::new(FailingFeed), CollectorConfig::default(), clock);

        let idle = collector.status().await;
        assert!(!idle.running);
        assert!(!idle.is_stale(Utc::now()));

        collector.start().await.unwrap();
        let status = collector.status().await;
        let refreshed = status.last_update.unwrap();

        assert!(!status.is_stale(refreshed + chrono::Duration::seconds(60)));
        assert!(status.is_stale(refreshed + chrono::Duration::seconds(91)));

        collector.stop().await.unwrap();
    }
}
