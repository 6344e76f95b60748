//! Allocation Strategies
//!
//! Target-weight computation and the rebalancing actions that reach it.

mod rebalance;

pub use rebalance::{PortfolioAnalysis, RebalanceParams, RebalanceStrategy};
