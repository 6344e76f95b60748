//! Mock Price Feed
//!
//! Fixed snapshot used when the live API is unreachable, and as a feed for
//! offline runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PriceFeed;
use crate::error::Result;
use crate::model::{PriceSnapshot, SnapshotSource};

/// (symbol, price, 24h change %, 24h volume, market cap)
const FALLBACK: [(&str, f64, f64, f64, f64); 3] = [
    ("BTC", 42_000.0, 2.5, 15_000_000_000.0, 825_000_000_000.0),
    ("ETH", 2_500.0, 3.2, 8_000_000_000.0, 300_000_000_000.0),
    ("LINK", 15.0, -1.8, 400_000_000.0, 8_500_000_000.0),
];

/// The fixed BTC/ETH/LINK snapshot, stamped with `now`
pub fn fallback_snapshots(now: DateTime<Utc>) -> Vec<PriceSnapshot> {
    FALLBACK
        .iter()
        .map(|&(symbol, price, change_24h, volume_24h, market_cap)| PriceSnapshot {
            symbol: symbol.to_string(),
            price,
            volume_24h,
            change_24h,
            market_cap,
            timestamp: now,
            source: SnapshotSource::Mock,
        })
        .collect()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MockPriceFeed;

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn fetch_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
        Ok(fallback_snapshots(Utc::now()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_snapshot_values() {
        let now = Utc::now();
        let snapshots = fallback_snapshots(now);

        assert_eq!(snapshots.len(), 3);
        let btc = &snapshots[0];
        assert_eq!(btc.symbol, "BTC");
        assert!((btc.price - 42_000.0).abs() < f64::EPSILON);
        assert!((btc.market_cap - 825_000_000_000.0).abs() < 1.0);
        assert_eq!(btc.timestamp, now);

        let link = &snapshots[2];
        assert!((link.change_24h + 1.8).abs() < f64::EPSILON);
        assert!(snapshots.iter().all(|s| s.source == SnapshotSource::Mock));
    }

    #[tokio::test]
    async fn test_mock_feed() {
        let feed = MockPriceFeed;
        let snapshots = feed.fetch_snapshots().await.unwrap();
        assert_eq!(snapshots.len(), 3);
        assert_eq!(feed.name(), "mock");
    }
}
