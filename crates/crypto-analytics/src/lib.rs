//! # crypto-analytics
//!
//! Portfolio analytics for a DeFi vault: rebalancing recommendations, risk
//! metrics and per-token market analysis, plus the background collector that
//! keeps a market snapshot cache fresh.
//!
//! ## Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  engine      AnalyticsEngine / PortfolioAnalyzer             │
//! │    ├─ strategy   rebalance: optimal weights, actions         │
//! │    ├─ svckit     risk analyzer, market analyzer, validator   │
//! │    └─ reference  token profiles (return, σ, β, base price)   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  collector   DataCollector ──► SnapshotCache                 │
//! │    └─ exchange   PriceFeed: CoinGecko, mock fallback         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The kernel is synchronous and pure apart from the injected [`Clock`];
//! only the collector suspends.

pub mod clock;
pub mod collector;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod model;
pub mod reference;
pub mod strategy;
pub mod svckit;

pub use clock::{Clock, FixedClock, SystemClock};
pub use collector::{CollectorConfig, CollectorStatus, DataCollector, MarketDataCollector, SnapshotCache};
pub use engine::{AnalyticsEngine, PortfolioAnalyzer};
pub use error::{AnalyticsError, Result};
pub use exchange::{CoinGeckoFeed, MockPriceFeed, PriceFeed};
pub use model::{
    MarketAnalysis, MarketAnalysisRequest, MarketIndicators, Portfolio, PortfolioPosition, PriceSnapshot,
    RebalanceRecommendation, RiskMetrics, SnapshotSource,
};
pub use strategy::RebalanceStrategy;
