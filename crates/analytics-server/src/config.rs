//! Server Configuration
//!
//! Read from the environment (after `.env`, if present). Unparseable values
//! fall back to their defaults with a warning.

use std::str::FromStr;
use std::time::Duration;

use crypto_analytics::collector::CollectorConfig;
use crypto_analytics::exchange::DEFAULT_PRICE_API_URL;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Request bodies above this are rejected with 400
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Deadline for a single price API fetch inside a refresh
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall deadline of the price API HTTP client
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub price_api_url: String,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            price_api_url: DEFAULT_PRICE_API_URL.to_string(),
            refresh_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("BIND_HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);

        let price_api_url = lookup("PRICE_API_URL")
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or(defaults.price_api_url);

        Self {
            host,
            port: parse_or(&lookup, "PORT", defaults.port),
            price_api_url,
            refresh_interval: seconds_or(&lookup, "COLLECTOR_REFRESH_SECS", defaults.refresh_interval),
            request_timeout: seconds_or(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout),
            shutdown_grace: seconds_or(&lookup, "SHUTDOWN_GRACE_SECS", defaults.shutdown_grace),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub const fn collector(&self) -> CollectorConfig {
        CollectorConfig {
            refresh_interval: self.refresh_interval,
            fetch_timeout: FETCH_TIMEOUT,
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, default = %default, "Invalid configuration value, using default");
        default
    })
}

/// Whole seconds; zero is treated as invalid
fn seconds_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, key, default.as_secs()) {
        0 => {
            tracing::warn!(key, "Zero duration is not allowed, using default");
            default
        }
        secs => Duration::from_secs(secs),
    }
}
