//! Price Feeds
//!
//! Sources of spot price snapshots for the data collector.

mod coingecko;
mod mock;

pub use coingecko::{CoinGeckoFeed, DEFAULT_PRICE_API_URL};
pub use mock::{fallback_snapshots, MockPriceFeed};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PriceSnapshot;

/// Price feed trait (Strategy pattern)
///
/// One call returns one complete snapshot per tracked token.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn fetch_snapshots(&self) -> Result<Vec<PriceSnapshot>>;

    /// Feed name for logs
    fn name(&self) -> &str;
}
