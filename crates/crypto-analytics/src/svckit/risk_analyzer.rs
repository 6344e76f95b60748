//! Risk Analyzer
//!
//! Portfolio volatility, one-day VaR, Sharpe ratio, max drawdown and beta from
//! the token reference table and a single cross-asset correlation constant.

use chrono::{DateTime, Utc};

use crate::error::{AnalyticsError, Result};
use crate::model::{Portfolio, PortfolioPosition, RiskMetrics};
use crate::reference::token_profile;

const TRADING_DAYS_PER_YEAR: f64 = 365.0;

/// One-sided normal quantile for a VaR confidence level
pub fn z_score(confidence: f64) -> f64 {
    if (confidence - 0.95).abs() < 1e-9 {
        1.645
    } else if (confidence - 0.99).abs() < 1e-9 {
        2.326
    } else {
        1.96
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RiskAnalyzer {
    /// Assumed pairwise correlation between crypto assets
    correlation: f64,

    /// Annual risk-free rate for the Sharpe ratio
    risk_free_rate: f64,

    /// Max drawdown as a multiple of volatility
    drawdown_multiple: f64,
}

impl Default for RiskAnalyzer {
    fn default() -> Self {
        Self {
            correlation: 0.3,
            risk_free_rate: 0.02,
            drawdown_multiple: 2.5,
        }
    }
}

impl RiskAnalyzer {
    pub fn calculate(&self, portfolio: &Portfolio, now: DateTime<Utc>) -> Result<RiskMetrics> {
        if portfolio.positions.is_empty() {
            return Err(AnalyticsError::EmptyPortfolio);
        }

        let volatility = self.portfolio_volatility(&portfolio.positions);

        Ok(RiskMetrics {
            portfolio_id: portfolio.id.clone(),
            var_95: Self::value_at_risk(0.95, volatility),
            var_99: Self::value_at_risk(0.99, volatility),
            volatility,
            sharpe_ratio: self.sharpe_ratio(&portfolio.positions, volatility),
            max_drawdown: volatility * self.drawdown_multiple,
            beta: Self::beta(&portfolio.positions),
            timestamp: now,
        })
    }

    /// √(Σ wᵢ²σᵢ² + Σ_{i≠j} 2·wᵢwⱼσᵢσⱼρ), over ordered pairs
    pub fn portfolio_volatility(&self, positions: &[PortfolioPosition]) -> f64 {
        let vols: Vec<f64> = positions
            .iter()
            .map(|p| token_profile(&p.token).volatility)
            .collect();

        let mut variance = 0.0;
        for (p, vol) in positions.iter().zip(&vols) {
            variance += p.weight * p.weight * vol * vol;
        }

        for (i, (p1, v1)) in positions.iter().zip(&vols).enumerate() {
            for (j, (p2, v2)) in positions.iter().zip(&vols).enumerate() {
                if i != j {
                    variance += 2.0 * p1.weight * p2.weight * v1 * v2 * self.correlation;
                }
            }
        }

        variance.max(0.0).sqrt()
    }

    /// One-day VaR, reported as a negative number (a loss)
    pub fn value_at_risk(confidence: f64, volatility: f64) -> f64 {
        -(z_score(confidence) * volatility * (1.0 / TRADING_DAYS_PER_YEAR).sqrt())
    }

    pub fn expected_return(positions: &[PortfolioPosition]) -> f64 {
        positions
            .iter()
            .map(|p| p.weight * token_profile(&p.token).expected_return)
            .sum()
    }

    /// Excess return over volatility; zero when volatility is zero
    pub fn sharpe_ratio(&self, positions: &[PortfolioPosition], volatility: f64) -> f64 {
        if volatility == 0.0 {
            return 0.0;
        }
        (Self::expected_return(positions) - self.risk_free_rate) / volatility
    }

    pub fn beta(positions: &[PortfolioPosition]) -> f64 {
        positions
            .iter()
            .map(|p| p.weight * token_profile(&p.token).beta)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balanced() -> Portfolio {
        Portfolio::new(
            "p1",
            100_000.0,
            vec![
                PortfolioPosition::new("BTC", 0.5, 1.0, 50_000.0),
                PortfolioPosition::new("ETH", 0.5, 20.0, 50_000.0),
            ],
        )
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_volatility_includes_cross_terms() {
        let analyzer = RiskAnalyzer::default();
        let vol = analyzer.portfolio_volatility(&balanced().positions);

        // own: 0.25·0.09 + 0.25·0.0625, cross: 2 ordered pairs × 2·0.25·0.3·0.25·0.3
        let expected = (0.038_125_f64 + 0.022_5).sqrt();
        assert!(close(vol, expected));
    }

    #[test]
    fn test_var_is_negative_and_ordered() {
        let analyzer = RiskAnalyzer::default();
        let metrics = analyzer.calculate(&balanced(), Utc::now()).unwrap();

        assert!(metrics.var_95 < 0.0);
        assert!(metrics.var_99 < metrics.var_95);
        assert!(metrics.volatility >= 0.0);
        assert!(close(
            metrics.var_95,
            -1.645 * metrics.volatility * (1.0_f64 / 365.0).sqrt()
        ));
    }

    #[test]
    fn test_sharpe_drawdown_beta() {
        let analyzer = RiskAnalyzer::default();
        let metrics = analyzer.calculate(&balanced(), Utc::now()).unwrap();

        assert!(close(metrics.sharpe_ratio, (0.135 - 0.02) / metrics.volatility));
        assert!(close(metrics.max_drawdown, 2.5 * metrics.volatility));
        assert!(close(metrics.beta, 0.5 * 0.8 + 0.5 * 1.0));
        assert_eq!(metrics.portfolio_id, "p1");
    }

    #[test]
    fn test_zero_weights_have_zero_sharpe() {
        let analyzer = RiskAnalyzer::default();
        let portfolio = Portfolio::new(
            "flat",
            0.0,
            vec![PortfolioPosition::new("BTC", 0.0, 0.0, 0.0)],
        );

        let metrics = analyzer.calculate(&portfolio, Utc::now()).unwrap();
        assert!(close(metrics.volatility, 0.0));
        assert!(close(metrics.sharpe_ratio, 0.0));
        assert!(metrics.var_99 <= metrics.var_95 && metrics.var_95 <= 0.0);
    }

    #[test]
    fn test_z_scores() {
        assert!(close(z_score(0.95), 1.645));
        assert!(close(z_score(0.99), 2.326));
        assert!(close(z_score(0.90), 1.96));
    }

    #[test]
    fn test_empty_portfolio() {
        let analyzer = RiskAnalyzer::default();
        let portfolio = Portfolio::new("empty", 0.0, Vec::new());
        assert!(matches!(
            analyzer.calculate(&portfolio, Utc::now()),
            Err(AnalyticsError::EmptyPortfolio)
        ));
    }
}
