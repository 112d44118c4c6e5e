//! Exchange rate source port.
//!
//! A rate source hands back a whole table of rates relative to one base
//! currency. Caching and staleness live in the application layer.

use crate::CurrencyCode;
use exchange_rates::RateTable;

/// Error type for rate fetches.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Malformed rate response: {0}")]
    InvalidResponse(String),

    #[error("Unsupported base currency: {0}")]
    UnsupportedBase(CurrencyCode),
}

/// Port trait for exchange rate providers.
#[async_trait::async_trait]
pub trait RateSource: Send + Sync + 'static {
    /// Fetches the current rates, expressed as units per one `base`.
    async fn fetch_rates(&self, base: CurrencyCode) -> Result<RateTable, ExchangeError>;

    /// Short name for logs and the status endpoint.
    fn name(&self) -> &'static str;
}
