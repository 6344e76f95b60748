//! Request Validation
//!
//! Boundary checks applied before any kernel call. Each check reports the
//! first offending field as an [`AnalyticsError::Validation`].

use crate::error::{AnalyticsError, Result};
use crate::model::{MarketAnalysisRequest, Portfolio};

/// Most tokens accepted by one market-analysis request
pub const MAX_ANALYSIS_TOKENS: usize = 10;

/// Timeframe used when the request leaves it empty
pub const DEFAULT_TIMEFRAME: &str = "1d";

/// Validate a portfolio against the data-model invariants.
///
/// Checked in order: `id`, `total_value`, `positions`, then per position
/// `token`, `weight`, `amount`, `value`. Weights need not sum to 1.
pub fn validate_portfolio(portfolio: &Portfolio) -> Result<()> {
    if portfolio.id.trim().is_empty() {
        return Err(AnalyticsError::validation("id", "portfolio ID is required"));
    }
    if portfolio.total_value < 0.0 || portfolio.total_value.is_nan() {
        return Err(AnalyticsError::validation(
            "total_value",
            "total value must be non-negative",
        ));
    }
    if portfolio.positions.is_empty() {
        return Err(AnalyticsError::validation(
            "positions",
            "at least one position is required",
        ));
    }

    for (i, position) in portfolio.positions.iter().enumerate() {
        if position.token.trim().is_empty() {
            return Err(AnalyticsError::validation(
                format!("positions[{i}].token"),
                "token is required",
            ));
        }
        if !(0.0..=1.0).contains(&position.weight) {
            return Err(AnalyticsError::validation(
                format!("positions[{i}].weight"),
                "weight must be between 0 and 1",
            ));
        }
        if position.amount < 0.0 || position.amount.is_nan() {
            return Err(AnalyticsError::validation(
                format!("positions[{i}].amount"),
                "amount must be non-negative",
            ));
        }
        if position.value < 0.0 || position.value.is_nan() {
            return Err(AnalyticsError::validation(
                format!("positions[{i}].value"),
                "value must be non-negative",
            ));
        }
    }

    Ok(())
}

impl MarketAnalysisRequest {
    /// Check the token list and fill in the default timeframe
    pub fn normalize(mut self) -> Result<Self> {
        validate_tokens(&self.tokens)?;
        if self.timeframe.trim().is_empty() {
            self.timeframe = DEFAULT_TIMEFRAME.to_string();
        }
        Ok(self)
    }
}

/// Token list must hold 1..=10 non-empty symbols
pub fn validate_tokens(tokens: &[String]) -> Result<()> {
    if tokens.is_empty() {
        return Err(AnalyticsError::validation(
            "tokens",
            "at least one token is required",
        ));
    }
    if tokens.len() > MAX_ANALYSIS_TOKENS {
        return Err(AnalyticsError::TooManyTokens {
            count: tokens.len(),
            max: MAX_ANALYSIS_TOKENS,
        });
    }
    if let Some(i) = tokens.iter().position(|t| t.trim().is_empty()) {
        return Err(AnalyticsError::validation(
            format!("tokens[{i}]"),
            "token is required",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PortfolioPosition;

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

    fn field_of(result: Result<()>) -> String {
        match result {
            Err(AnalyticsError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_portfolio_passes() {
        assert!(validate_portfolio(&balanced()).is_ok());
    }

    #[test]
    fn test_weight_drift_is_tolerated() {
        let mut portfolio = balanced();
        portfolio.positions[0].weight = 0.7;
        assert!(validate_portfolio(&portfolio).is_ok());
    }

    #[test]
    fn test_empty_id() {
        let mut portfolio = balanced();
        portfolio.id = String::new();
        assert_eq!(field_of(validate_portfolio(&portfolio)), "id");
    }

    #[test]
    fn test_no_positions() {
        let mut portfolio = balanced();
        portfolio.positions.clear();
        assert_eq!(field_of(validate_portfolio(&portfolio)), "positions");
    }

    #[test]
    fn test_empty_token() {
        let mut portfolio = balanced();
        portfolio.positions[1].token = String::new();
        assert_eq!(field_of(validate_portfolio(&portfolio)), "positions[1].token");
    }

    #[test]
    fn test_weight_out_of_range() {
        let mut portfolio = balanced();
        portfolio.positions[0].weight = 1.5;
        assert_eq!(field_of(validate_portfolio(&portfolio)), "positions[0].weight");

        portfolio.positions[0].weight = -0.1;
        assert_eq!(field_of(validate_portfolio(&portfolio)), "positions[0].weight");
    }

    #[test]
    fn test_boundary_weights_accepted() {
        let mut portfolio = balanced();
        portfolio.positions[0].weight = 0.0;
        portfolio.positions[1].weight = 1.0;
        assert!(validate_portfolio(&portfolio).is_ok());
    }

    #[test]
    fn test_negative_money_fields() {
        let mut portfolio = balanced();
        portfolio.positions[1].amount = -1.0;
        assert_eq!(field_of(validate_portfolio(&portfolio)), "positions[1].amount");

        let mut portfolio = balanced();
        portfolio.positions[0].value = -5.0;
        assert_eq!(field_of(validate_portfolio(&portfolio)), "positions[0].value");

        let mut portfolio = balanced();
        portfolio.total_value = -1.0;
        assert_eq!(field_of(validate_portfolio(&portfolio)), "total_value");
    }

    #[test]
    fn test_market_request_defaults_timeframe() {
        let request = MarketAnalysisRequest {
            tokens: vec!["BTC".into(), "ETH".into()],
            timeframe: String::new(),
        };
        let normalized = request.normalize().unwrap();
        assert_eq!(normalized.timeframe, "1d");
        assert_eq!(normalized.tokens, vec!["BTC", "ETH"]);
    }

    #[test]
    fn test_market_request_token_bounds() {
        assert!(matches!(
            validate_tokens(&[]),
            Err(AnalyticsError::Validation { ref field, .. }) if field == "tokens"
        ));

        let ten: Vec<String> = (0..10).map(|i| format!("T{i}")).collect();
        assert!(validate_tokens(&ten).is_ok());

        let eleven: Vec<String> = (0..11).map(|i| format!("T{i}")).collect();
        assert!(matches!(
            validate_tokens(&eleven),
            Err(AnalyticsError::TooManyTokens { count: 11, max: 10 })
        ));
    }
}
