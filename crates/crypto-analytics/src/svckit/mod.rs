//! Service Kit
//!
//! Risk and market analyzers plus request validation.

mod market_analyzer;
mod risk_analyzer;
pub mod validator;

pub use market_analyzer::MarketAnalyzer;
pub use risk_analyzer::{z_score, RiskAnalyzer};
pub use validator::{validate_portfolio, validate_tokens, DEFAULT_TIMEFRAME, MAX_ANALYSIS_TOKENS};
