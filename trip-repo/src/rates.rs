//! Exchange rate sources.
//!
//! `HttpRateSource` speaks the exchangerate-api.com v4 shape:
//! `GET {url}/{BASE}` returning `{"base": "USD", "rates": {"EUR": 0.92, ..}}`.
//! `FixedRateSource` serves a fixed table without touching the network.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use trip_types::{CurrencyCode, ExchangeError, RateSource, RateTable};

pub const DEFAULT_RATES_URL: &str = "https://api.exchangerate-api.com/v4/latest";

const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

// ─────────────────────────────────────────────────────────────────────────────
// HTTP source
// ─────────────────────────────────────────────────────────────────────────────

pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, base: CurrencyCode) -> String {
        format!("{}/{}", self.base_url, base)
    }
}

#[derive(Debug, Deserialize)]
struct RatesPayload {
    base: Option<String>,
    rates: HashMap<String, f64>,
}

/// Builds a table from a v4 response body. Entries with codes that are not
/// three letters are dropped.
fn parse_payload(body: &str, requested: CurrencyCode) -> Result<RateTable, ExchangeError> {
    let payload: RatesPayload =
        serde_json::from_str(body).map_err(|e| ExchangeError::InvalidResponse(e.to_string()))?;

    let base = match payload.base.as_deref().map(CurrencyCode::parse) {
        Some(Ok(code)) => code,
        Some(Err(e)) => return Err(ExchangeError::InvalidResponse(e.to_string())),
        None => requested,
    };
    if base != requested {
        return Err(ExchangeError::InvalidResponse(format!(
            "asked for {requested} rates, got {base}"
        )));
    }

    let rates = payload
        .rates
        .into_iter()
        .filter_map(|(code, rate)| CurrencyCode::parse(&code).ok().map(|c| (c, rate)));
    Ok(RateTable::from_rates(base, rates))
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[tracing::instrument(skip(self))]
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, ExchangeError> {
        let url = self.url_for(base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExchangeError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExchangeError::ServiceUnavailable(format!(
                "{url} answered {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::ServiceUnavailable(e.to_string()))?;
        let table = parse_payload(&body, base)?;
        tracing::debug!(rates = table.len(), "Fetched exchange rates");
        Ok(table)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixed source
// ─────────────────────────────────────────────────────────────────────────────

/// Serves either one fixed table or the built-in reference rates.
#[derive(Debug, Clone, Default)]
pub struct FixedRateSource {
    table: Option<RateTable>,
}

impl FixedRateSource {
    /// Built-in reference rates, pivoted to whichever base is asked for.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Always serves `table`; other bases are unsupported.
    pub fn with_table(table: RateTable) -> Self {
        Self { table: Some(table) }
    }
}

#[async_trait]
impl RateSource for FixedRateSource {
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, ExchangeError> {
        match &self.table {
            Some(table) if table.base() == base => Ok(table.clone()),
            Some(_) => Err(ExchangeError::UnsupportedBase(base)),
            None => {
                let table = RateTable::reference(base);
                if table.is_empty() {
                    return Err(ExchangeError::UnsupportedBase(base));
                }
                Ok(table)
            }
        }
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Source chosen at startup
// ─────────────────────────────────────────────────────────────────────────────

/// Rate source picked from configuration.
pub enum Rates {
    Http(HttpRateSource),
    Fixed(FixedRateSource),
}

/// Builds the rate source named by `kind` (`http` or `fixed`).
pub fn build_rate_source(kind: &str, url: &str) -> anyhow::Result<Rates> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "http" | "" => Ok(Rates::Http(HttpRateSource::new(url)?)),
        "fixed" => Ok(Rates::Fixed(FixedRateSource::reference())),
        other => anyhow::bail!("Unknown rate source {other:?} (expected http or fixed)"),
    }
}

#[async_trait]
impl RateSource for Rates {
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, ExchangeError> {
        match self {
            Rates::Http(source) => source.fetch_rates(base).await,
            Rates::Fixed(source) => source.fetch_rates(base).await,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Rates::Http(source) => source.name(),
            Rates::Fixed(source) => source.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v4_payload() {
        let body = r#"{"base": "USD", "date": "2024-01-01", "time_last_updated": 1704067201,
                       "rates": {"USD": 1, "EUR": 0.9, "GBP": 0.8}}"#;
        let table = parse_payload(body, CurrencyCode::USD).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rate_of(CurrencyCode::EUR), Some(0.9));
    }

    #[test]
    fn test_parse_drops_bad_codes() {
        let body = r#"{"rates": {"EUR": 0.9, "EURO": 1.0, "": 2.0}}"#;
        let table = parse_payload(body, CurrencyCode::USD).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.base(), CurrencyCode::USD);
    }

    #[test]
    fn test_parse_rejects_other_base() {
        let body = r#"{"base": "EUR", "rates": {"USD": 1.1}}"#;
        assert!(matches!(
            parse_payload(body, CurrencyCode::USD),
            Err(ExchangeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_payload("<html>", CurrencyCode::USD),
            Err(ExchangeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_url_for() {
        let source = HttpRateSource::new("https://rates.example/v4/latest/").unwrap();
        assert_eq!(
            source.url_for(CurrencyCode::GBP),
            "https://rates.example/v4/latest/GBP"
        );
    }

    #[tokio::test]
    async fn test_fixed_reference_pivots() {
        let source = FixedRateSource::reference();
        let table = source.fetch_rates(CurrencyCode::EUR).await.unwrap();
        assert_eq!(table.base(), CurrencyCode::EUR);
        assert_eq!(table.convert(10.0, CurrencyCode::EUR, CurrencyCode::EUR).value, 10.0);
        assert!(!table.convert(10.0, CurrencyCode::EUR, CurrencyCode::USD).approximated);
    }

    #[test]
    fn test_build_rate_source() {
        let source = build_rate_source("FIXED", DEFAULT_RATES_URL).unwrap();
        assert_eq!(source.name(), "fixed");
        let source = build_rate_source("http", DEFAULT_RATES_URL).unwrap();
        assert_eq!(source.name(), "http");
        assert!(build_rate_source("carrier-pigeon", DEFAULT_RATES_URL).is_err());
    }

    #[tokio::test]
    async fn test_fixed_table_serves_only_its_base() {
        let table = RateTable::from_rates(CurrencyCode::USD, [(CurrencyCode::EUR, 0.9)]);
        let source = FixedRateSource::with_table(table);
        assert!(source.fetch_rates(CurrencyCode::USD).await.is_ok());
        assert!(matches!(
            source.fetch_rates(CurrencyCode::EUR).await,
            Err(ExchangeError::UnsupportedBase(_))
        ));
    }
}
