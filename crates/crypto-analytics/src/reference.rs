//! Token Reference Table
//!
//! Static per-token constants used by the analytics kernel. Symbols outside
//! the table resolve to [`TokenProfile::DEFAULT`]; adding a token is a
//! data-only change here.

/// Annualised reference constants for one token
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TokenProfile {
    /// Expected annual return (0.12 = 12%)
    pub expected_return: f64,

    /// Annual volatility
    pub volatility: f64,

    /// Beta relative to the crypto market
    pub beta: f64,

    /// Reference price in USD
    pub base_price: f64,
}

impl TokenProfile {
    pub const DEFAULT: Self = Self::new(0.10, 0.35, 1.0, 100.0);

    const fn new(expected_return: f64, volatility: f64, beta: f64, base_price: f64) -> Self {
        Self {
            expected_return,
            volatility,
            beta,
            base_price,
        }
    }
}

/// Default 24h volume for tokens without a reference volume
pub const DEFAULT_VOLUME_24H: f64 = 50_000_000.0;

/// Look up the reference profile for a symbol (case-insensitive)
pub fn token_profile(symbol: &str) -> TokenProfile {
    // (expected return, volatility, beta, base price)
    match symbol.to_uppercase().as_str() {
        "BTC" => TokenProfile::new(0.12, 0.30, 0.8, 42_000.0),
        "ETH" => TokenProfile::new(0.15, 0.25, 1.0, 2_500.0),
        "USDC" => TokenProfile::new(0.03, 0.02, 0.1, 1.0),   // Stablecoin
        "LINK" => TokenProfile::new(0.18, 0.35, 1.2, 15.0),
        "UNI" => TokenProfile::new(0.20, 0.40, 1.3, 8.0),
        "AAVE" => TokenProfile::new(0.16, 0.38, 1.1, 120.0),
        _ => TokenProfile::DEFAULT,
    }
}

/// Reference 24h trading volume in USD
pub fn reference_volume(symbol: &str) -> f64 {
    match symbol.to_uppercase().as_str() {
        "BTC" => 8_000_000_000.0,
        "USDC" => 5_000_000_000.0,
        "ETH" => 2_000_000_000.0,
        "LINK" => 500_000_000.0,
        "UNI" => 200_000_000.0,
        "AAVE" => 150_000_000.0,
        _ => DEFAULT_VOLUME_24H,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tokens_have_entries() {
        for symbol in ["BTC", "ETH", "USDC", "LINK", "UNI", "AAVE"] {
            assert_ne!(token_profile(symbol), TokenProfile::DEFAULT, "{symbol}");
            assert!((reference_volume(symbol) - DEFAULT_VOLUME_24H).abs() > 1.0, "{symbol}");
        }
    }

    #[test]
    fn test_unknown_token_falls_back() {
        let profile = token_profile("DOGE");
        assert_eq!(profile, TokenProfile::DEFAULT);
        assert!((profile.expected_return - 0.10).abs() < f64::EPSILON);
        assert!((profile.volatility - 0.35).abs() < f64::EPSILON);
        assert!((profile.beta - 1.0).abs() < f64::EPSILON);
        assert!((profile.base_price - 100.0).abs() < f64::EPSILON);
        assert!((reference_volume("DOGE") - DEFAULT_VOLUME_24H).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(token_profile("btc"), token_profile("BTC"));
        assert!((reference_volume("eth") - 2_000_000_000.0).abs() < f64::EPSILON);
    }
}
