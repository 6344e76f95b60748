//! Market Analyzer
//!
//! Mechanical technical analysis per token (support, resistance, trend,
//! 24h change) and an aggregate sentiment reading. All time-varying terms are
//! driven by the supplied instant, so a pinned clock gives pinned output.

use std::f64::consts::TAU;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::{MarketAnalysis, MarketSentiment, TokenAnalysis, Trend};
use crate::reference::{reference_volume, token_profile};
use crate::svckit::validator::validate_tokens;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Trend oscillator magnitude beyond which the trend is directional
const TREND_THRESHOLD: f64 = 0.3;

#[derive(Clone, Copy, Debug, Default)]
pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// Analyze `tokens` in order. `timeframe` is informational only.
    pub fn analyze(&self, tokens: &[String], timeframe: &str, now: DateTime<Utc>) -> Result<MarketAnalysis> {
        validate_tokens(tokens)?;

        let seconds = now.timestamp();
        let token_analysis = tokens
            .iter()
            .map(|token| Self::technical_analysis(token, seconds))
            .collect();

        tracing::debug!(tokens = tokens.len(), timeframe, "Market analysis computed");

        Ok(MarketAnalysis {
            token_analysis,
            sentiment: Self::sentiment(seconds),
            timestamp: now,
        })
    }

    /// Support/resistance band, diurnal 24h change and hourly trend for one token
    pub fn technical_analysis(token: &str, unix_seconds: i64) -> TokenAnalysis {
        let profile = token_profile(token);
        let base_price = profile.base_price;
        let volatility = profile.volatility;

        let change_24h = Self::change_24h(volatility, unix_seconds);

        TokenAnalysis {
            token: token.to_string(),
            price: base_price * (1.0 + change_24h),
            volume_24h: reference_volume(token),
            change_24h,
            volatility,
            support_level: base_price * (1.0 - volatility * 0.1),
            resistance_level: base_price * (1.0 + volatility * 0.1),
            trend: Self::trend(unix_seconds),
        }
    }

    /// sin(day fraction · 2π) · σ · 0.1
    #[allow(clippy::cast_precision_loss)]
    pub fn change_24h(volatility: f64, unix_seconds: i64) -> f64 {
        let day_fraction = unix_seconds.rem_euclid(SECONDS_PER_DAY) as f64 / SECONDS_PER_DAY as f64;
        (day_fraction * TAU).sin() * volatility * 0.1
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn trend(unix_seconds: i64) -> Trend {
        let oscillator = (unix_seconds as f64 / SECONDS_PER_HOUR).sin();
        if oscillator > TREND_THRESHOLD {
            Trend::Bullish
        } else if oscillator < -TREND_THRESHOLD {
            Trend::Bearish
        } else {
            Trend::Neutral
        }
    }

    /// Fear-greed oscillates in [30, 70]; the split shifts at the extremes
    #[allow(clippy::cast_precision_loss)]
    pub fn sentiment(unix_seconds: i64) -> MarketSentiment {
        let fear_greed_index = 20.0f64.mul_add((unix_seconds as f64 / SECONDS_PER_DAY as f64).sin(), 50.0);

        let mut bullish = 60.0;
        let mut bearish = 25.0;
        let mut neutral = 15.0;

        if fear_greed_index > 60.0 {
            bullish += 10.0;
            bearish -= 5.0;
            neutral -= 5.0;
        } else if fear_greed_index < 40.0 {
            bullish -= 10.0;
            bearish += 10.0;
        }

        MarketSentiment {
            fear_greed_index,
            bullish_sentiment: bullish,
            bearish_sentiment: bearish,
            neutral_sentiment: neutral,
        }
    }
}
