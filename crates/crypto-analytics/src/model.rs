//! Domain Models
//!
//! Wire types for portfolios, recommendations, risk metrics and market data.
//! Field names are the JSON field names; timestamps serialize as RFC 3339.
//!
//! Everything here is `f64`: the kernel is closed-form math over weights,
//! volatilities and trigonometric clock terms, and the wire format is plain
//! JSON numbers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A weighted position in a portfolio
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPosition {
    /// Token symbol (e.g., "BTC", "ETH")
    #[serde(default)]
    pub token: String,

    /// Units held
    #[serde(default)]
    pub amount: f64,

    /// Current value in USD
    #[serde(default)]
    pub value: f64,

    /// Share of portfolio value, in [0, 1]
    #[serde(default)]
    pub weight: f64,

    #[serde(default)]
    pub yield_apy: f64,
}

impl PortfolioPosition {
    pub fn new(token: impl Into<String>, weight: f64, amount: f64, value: f64) -> Self {
        Self {
            token: token.into(),
            amount,
            value,
            weight,
            yield_apy: 0.0,
        }
    }
}

/// A caller-supplied portfolio. Weights need not sum to 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub total_value: f64,

    #[serde(default)]
    pub positions: Vec<PortfolioPosition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Portfolio {
    pub fn new(id: impl Into<String>, total_value: f64, positions: Vec<PortfolioPosition>) -> Self {
        Self {
            id: id.into(),
            total_value,
            positions,
            last_updated: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Buy,
    Sell,
    Rebalance,
}

/// A single rebalancing step toward the optimal allocation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebalanceAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,

    pub token: String,

    /// USD amount to move (non-negative)
    pub amount: f64,

    pub target_weight: f64,

    /// Larger weight gaps get higher priority
    pub priority: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRecommendation {
    pub portfolio_id: String,
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    pub expected_return: f64,
    pub risk: f64,
    /// Sorted by descending priority
    pub actions: Vec<RebalanceAction>,
    pub reasoning: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub portfolio_id: String,
    /// One-day 95% VaR, negative (a loss)
    pub var_95: f64,
    /// One-day 99% VaR, at or below `var_95`
    pub var_99: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub beta: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenAnalysis {
    pub token: String,
    pub price: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
    pub volatility: f64,
    pub support_level: f64,
    pub resistance_level: f64,
    pub trend: Trend,
}

/// Aggregate sentiment. The three percentages sum to roughly 100.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketSentiment {
    pub fear_greed_index: f64,
    pub bullish_sentiment: f64,
    pub bearish_sentiment: f64,
    pub neutral_sentiment: f64,
}

impl MarketSentiment {
    pub fn total(&self) -> f64 {
        self.bullish_sentiment + self.bearish_sentiment + self.neutral_sentiment
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    /// Same order as the requested tokens
    pub token_analysis: Vec<TokenAnalysis>,
    pub sentiment: MarketSentiment,
    pub timestamp: DateTime<Utc>,
}

/// Body of a market-analysis request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysisRequest {
    #[serde(default)]
    pub tokens: Vec<String>,

    /// Empty means `1d`
    #[serde(default)]
    pub timeframe: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketIndicators {
    pub fear_greed_index: f64,
    pub total_market_cap: f64,
    /// Percent of total cached market cap
    pub btc_dominance: f64,
    pub eth_dominance: f64,
    pub defi_tvl: f64,
    pub volatility: f64,
    pub timestamp: DateTime<Utc>,
}

/// Where a price snapshot came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    CoinGecko,
    Mock,
}

impl SnapshotSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CoinGecko => "coingecko",
            Self::Mock => "mock",
        }
    }
}

/// Latest observed spot record for one token
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub symbol: String,
    pub price: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
    pub market_cap: f64,
    pub timestamp: DateTime<Utc>,
    pub source: SnapshotSource,
}
