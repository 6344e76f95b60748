//! Rebalance Strategy
//!
//! Risk-adjusted target weights over the tokens already in the portfolio,
//! and the buy/sell/rebalance actions needed to move toward them.
//!
//! ```text
//! score(t)  = R(t) / (σ(t) + 0.01)
//! w*(t)     = score(t) / Σ score
//! Δ         = w* − w        (no action when |Δ| ≤ 0.02)
//! priority  = ⌊|Δ| · 100⌋
//! ```

use chrono::{DateTime, Utc};

use crate::error::{AnalyticsError, Result};
use crate::model::{ActionType, Portfolio, PortfolioPosition, RebalanceAction, RebalanceRecommendation};
use crate::reference::token_profile;

/// Weights below this are treated as zero when sizing an action
const ZERO_WEIGHT_EPSILON: f64 = 1e-9;

/// Tunable thresholds for the rebalance strategy
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RebalanceParams {
    /// Minimum |Δ| that produces an action
    pub drift_threshold: f64,

    /// |Δ| beyond which an action is a plain buy or sell
    pub strong_signal: f64,

    /// Added to volatility in the score denominator
    pub score_epsilon: f64,

    /// Share of diversification credited against raw risk
    pub diversification_credit: f64,
}

impl Default for RebalanceParams {
    fn default() -> Self {
        Self {
            drift_threshold: 0.02,
            strong_signal: 0.1,
            score_epsilon: 0.01,
            diversification_credit: 0.3,
        }
    }
}

/// Summary statistics of the current allocation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortfolioAnalysis {
    pub expected_return: f64,
    pub risk: f64,
    pub diversification: f64,
    /// Herfindahl–Hirschman index of position weights
    pub concentration: f64,
}

#[derive(Clone, Debug, Default)]
pub struct RebalanceStrategy {
    params: RebalanceParams,
}

impl RebalanceStrategy {
    pub const fn new(params: RebalanceParams) -> Self {
        Self { params }
    }

    /// Build the full recommendation for a portfolio
    pub fn recommend(&self, portfolio: &Portfolio, now: DateTime<Utc>) -> Result<RebalanceRecommendation> {
        if portfolio.positions.is_empty() {
            return Err(AnalyticsError::EmptyPortfolio);
        }

        let analysis = self.analyze(portfolio);
        let optimal = self.optimal_weights(&portfolio.positions);
        let actions = self.generate_actions(portfolio, &optimal);
        let confidence = Self::confidence(&analysis);
        let reasoning = Self::reasoning(&analysis, &actions);

        tracing::debug!(
            portfolio_id = %portfolio.id,
            actions = actions.len(),
            confidence,
            concentration = analysis.concentration,
            "Rebalance recommendation computed"
        );

        Ok(RebalanceRecommendation {
            portfolio_id: portfolio.id.clone(),
            timestamp: now,
            confidence,
            expected_return: analysis.expected_return,
            risk: analysis.risk,
            actions,
            reasoning,
        })
    }

    /// Concentration, diversification, expected return and correlation-adjusted risk
    pub fn analyze(&self, portfolio: &Portfolio) -> PortfolioAnalysis {
        let mut concentration = 0.0;
        let mut expected_return = 0.0;
        let mut raw_variance = 0.0;

        for position in &portfolio.positions {
            let profile = token_profile(&position.token);
            let w = position.weight;

            concentration += w * w;
            expected_return += w * profile.expected_return;
            raw_variance += w * w * profile.volatility * profile.volatility;
        }

        let diversification = 1.0 - concentration;
        let risk = raw_variance.sqrt() * (1.0 - self.params.diversification_credit * diversification);

        PortfolioAnalysis {
            expected_return,
            risk,
            diversification,
            concentration,
        }
    }

    /// Target weight per position, in position order.
    ///
    /// Only tokens already held are considered. Duplicate tokens each carry
    /// their own score.
    pub fn optimal_weights(&self, positions: &[PortfolioPosition]) -> Vec<f64> {
        let n = positions.len();
        if n == 0 {
            return Vec::new();
        }

        let scores: Vec<f64> = positions
            .iter()
            .map(|p| {
                let profile = token_profile(&p.token);
                profile.expected_return / (profile.volatility + self.params.score_epsilon)
            })
            .collect();

        // Normalize to sum to 1
        let total: f64 = scores.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            #[allow(clippy::cast_precision_loss)]
            return vec![1.0 / n as f64; n];
        }

        scores.iter().map(|s| s / total).collect()
    }

    /// Actions for every position whose weight is off target by more than the drift threshold
    pub fn generate_actions(&self, portfolio: &Portfolio, optimal: &[f64]) -> Vec<RebalanceAction> {
        let mut actions: Vec<RebalanceAction> = portfolio
            .positions
            .iter()
            .zip(optimal)
            .filter_map(|(position, &target)| self.action_for(position, target, portfolio.total_value))
            .collect();

        // Stable: ties keep position order
        actions.sort_by(|a, b| b.priority.cmp(&a.priority));
        actions
    }

    fn action_for(&self, position: &PortfolioPosition, target: f64, total_value: f64) -> Option<RebalanceAction> {
        let delta = target - position.weight;
        let gap = delta.abs();
        if gap <= self.params.drift_threshold {
            return None;
        }

        let action_type = if delta > self.params.strong_signal {
            ActionType::Buy
        } else if delta < -self.params.strong_signal {
            ActionType::Sell
        } else {
            ActionType::Rebalance
        };

        // A zero-weight position has no value-per-weight; size against the whole portfolio
        let amount = if position.weight < ZERO_WEIGHT_EPSILON {
            gap * total_value
        } else {
            gap * position.value / position.weight
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let priority = (gap * 100.0).floor() as u32;

        Some(RebalanceAction {
            action_type,
            token: position.token.clone(),
            amount,
            target_weight: target,
            priority,
        })
    }

    /// Confidence in [0, 1] from diversification, concentration and return/risk
    pub fn confidence(analysis: &PortfolioAnalysis) -> f64 {
        let mut confidence = 0.7;

        confidence += analysis.diversification * 0.2;

        if analysis.concentration > 0.5 {
            confidence -= (analysis.concentration - 0.5) * 0.3;
        }

        if analysis.risk > 0.0 && analysis.expected_return / analysis.risk > 0.5 {
            confidence += 0.1;
        }

        confidence.clamp(0.0, 1.0)
    }

    /// Human-readable explanation of the recommendation
    pub fn reasoning(analysis: &PortfolioAnalysis, actions: &[RebalanceAction]) -> String {
        if actions.is_empty() {
            return "Portfolio is well-balanced. No rebalancing needed at this time.".into();
        }

        let mut reasoning =
            String::from("Portfolio analysis suggests rebalancing to improve risk-adjusted returns. ");

        if analysis.concentration > 0.6 {
            reasoning.push_str("High concentration detected - diversification recommended. ");
        }

        if analysis.diversification > 0.8 {
            reasoning.push_str("Good diversification maintained. ");
        }

        if actions.len() > 3 {
            reasoning.push_str("Multiple adjustments needed for optimal allocation.");
        } else {
            reasoning.push_str("Minor adjustments will optimize performance.");
        }

        reasoning
    }
}
