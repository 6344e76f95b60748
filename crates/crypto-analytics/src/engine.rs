//! Analytics Engine
//!
//! The stateless kernel behind the HTTP surface. Handlers hold an
//! `Arc<dyn AnalyticsEngine>`; [`PortfolioAnalyzer`] is the production
//! implementation and owns the clock that drives the time-varying formulas.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::model::{MarketAnalysis, MarketAnalysisRequest, Portfolio, RebalanceRecommendation, RiskMetrics};
use crate::strategy::RebalanceStrategy;
use crate::svckit::{validate_portfolio, MarketAnalyzer, RiskAnalyzer};

/// Kernel operations exposed to the service layer
pub trait AnalyticsEngine: Send + Sync {
    /// Validate `portfolio` and recommend rebalancing actions
    fn rebalance_recommendation(&self, portfolio: &Portfolio) -> Result<RebalanceRecommendation>;

    /// Validate `portfolio` and compute its risk metrics
    fn risk_metrics(&self, portfolio: &Portfolio) -> Result<RiskMetrics>;

    /// Validate the request and analyze each requested token in order
    fn market_analysis(&self, request: MarketAnalysisRequest) -> Result<MarketAnalysis>;
}

pub struct PortfolioAnalyzer {
    clock: Arc<dyn Clock>,
    strategy: RebalanceStrategy,
    risk: RiskAnalyzer,
    market: MarketAnalyzer,
}

impl Default for PortfolioAnalyzer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl PortfolioAnalyzer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            strategy: RebalanceStrategy::default(),
            risk: RiskAnalyzer::default(),
            market: MarketAnalyzer,
        }
    }
}

impl AnalyticsEngine for PortfolioAnalyzer {
    fn rebalance_recommendation(&self, portfolio: &Portfolio) -> Result<RebalanceRecommendation> {
        validate_portfolio(portfolio)?;
        self.strategy.recommend(portfolio, self.clock.now())
    }

    fn risk_metrics(&self, portfolio: &Portfolio) -> Result<RiskMetrics> {
        validate_portfolio(portfolio)?;
        self.risk.calculate(portfolio, self.clock.now())
    }

    fn market_analysis(&self, request: MarketAnalysisRequest) -> Result<MarketAnalysis> {
        let request = request.normalize()?;
        self.market
            .analyze(&request.tokens, &request.timeframe, self.clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::AnalyticsError;
    use crate::model::PortfolioPosition;

    fn engine() -> PortfolioAnalyzer {
        PortfolioAnalyzer::new(Arc::new(FixedClock::at_unix(1_700_000_000)))
    }

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

    #[test]
    fn test_rebalance_uses_engine_clock() {
        let engine = engine();
        let rec = engine.rebalance_recommendation(&balanced()).unwrap();
        assert_eq!(rec.portfolio_id, "p1");
        assert_eq!(rec.timestamp.timestamp(), 1_700_000_000);
        assert_eq!(rec.actions.len(), 2);
    }

    #[test]
    fn test_risk_metrics_ordering() {
        let metrics = engine().risk_metrics(&balanced()).unwrap();
        assert!(metrics.var_99 < metrics.var_95);
        assert!(metrics.var_95 < 0.0);
        assert!(metrics.volatility > 0.0);
    }

    #[test]
    fn test_invalid_portfolio_rejected_before_kernel() {
        let mut portfolio = balanced();
        portfolio.id = String::new();

        let err = engine().rebalance_recommendation(&portfolio).unwrap_err();
        assert_eq!(err.field(), Some("id"));

        portfolio.id = "p1".to_string();
        portfolio.positions[0].weight = 1.5;
        let err = engine().risk_metrics(&portfolio).unwrap_err();
        assert_eq!(err.field(), Some("positions[0].weight"));
    }

    #[test]
    fn test_market_analysis_defaults_timeframe() {
        let request = MarketAnalysisRequest {
            tokens: vec!["BTC".to_string(), "ETH".to_string()],
            timeframe: String::new(),
        };
        let analysis = engine().market_analysis(request).unwrap();
        let tokens: Vec<&str> = analysis.token_analysis.iter().map(|t| t.token.as_str()).collect();
        assert_eq!(tokens, ["BTC", "ETH"]);
    }

    #[test]
    fn test_market_analysis_rejects_empty_tokens() {
        let err = engine()
            .market_analysis(MarketAnalysisRequest::default())
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::Validation { .. }));
        assert!(err.is_client_error());
    }
}
