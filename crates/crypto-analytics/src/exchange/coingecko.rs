//! CoinGecko Price Feed
//!
//! Live BTC/ETH/LINK quotes from the public `simple/price` endpoint.
//! No API key required.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use super::PriceFeed;
use crate::error::{AnalyticsError, Result};
use crate::model::{PriceSnapshot, SnapshotSource};

pub const DEFAULT_PRICE_API_URL: &str = "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin,ethereum,chainlink&vs_currencies=usd&include_24hr_change=true&include_24hr_vol=true&include_market_cap=true&include_last_updated_at=true";

const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Default, Deserialize)]
struct CoinQuote {
    #[serde(default)]
    usd: f64,
    #[serde(default)]
    usd_24h_change: f64,
    #[serde(default)]
    usd_24h_vol: f64,
    #[serde(default)]
    usd_market_cap: f64,
    /// Unix seconds
    #[serde(default)]
    last_updated_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: CoinQuote,
    ethereum: CoinQuote,
    chainlink: CoinQuote,
}

impl SimplePriceResponse {
    fn into_snapshots(self, fetched_at: DateTime<Utc>) -> Vec<PriceSnapshot> {
        [("BTC", self.bitcoin), ("ETH", self.ethereum), ("LINK", self.chainlink)]
            .into_iter()
            .map(|(symbol, quote)| PriceSnapshot {
                symbol: symbol.to_string(),
                price: quote.usd,
                volume_24h: quote.usd_24h_vol,
                change_24h: quote.usd_24h_change,
                market_cap: quote.usd_market_cap,
                timestamp: quote
                    .last_updated_at
                    .filter(|&secs| secs > 0)
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .unwrap_or(fetched_at),
                source: SnapshotSource::CoinGecko,
            })
            .collect()
    }
}

pub struct CoinGeckoFeed {
    client: Client,
    endpoint: String,
}

impl CoinGeckoFeed {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, DEFAULT_CLIENT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn fetch_snapshots(&self) -> Result<Vec<PriceSnapshot>> {
        let resp = self.client.get(&self.endpoint).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AnalyticsError::UpstreamUnavailable(format!(
                "price API returned status {status}"
            )));
        }

        let body = resp.bytes().await?;
        let parsed: SimplePriceResponse = serde_json::from_slice(&body)?;
        Ok(parsed.into_snapshots(Utc::now()))
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
