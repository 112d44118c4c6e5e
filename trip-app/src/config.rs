//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use trip_repo::DEFAULT_RATES_URL;
use trip_types::CurrencyCode;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/trips.db?mode=rwc";

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub rates_source: String,
    pub rates_api_url: String,
    pub base_currency: CurrencyCode,
    pub rates_max_age: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// unset or blank keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a port number, got {raw:?}"))?,
            None => 3000,
        };

        let base_currency = match var("BASE_CURRENCY") {
            Some(raw) => CurrencyCode::parse(&raw)?,
            None => CurrencyCode::USD,
        };

        let max_age_hours: u64 = match var("RATES_MAX_AGE_HOURS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                anyhow::anyhow!("RATES_MAX_AGE_HOURS must be a whole number, got {raw:?}")
            })?,
            None => 24,
        };

        Ok(Self {
            port,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            rates_source: var("RATES_SOURCE").unwrap_or_else(|| "http".into()),
            rates_api_url: var("RATES_API_URL").unwrap_or_else(|| DEFAULT_RATES_URL.into()),
            base_currency,
            rates_max_age: Duration::from_secs(max_age_hours * 60 * 60),
        })
    }
}
