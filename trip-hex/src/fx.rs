//! Currency converter with a process-wide rate cache.
//!
//! Rates are fetched from a [`RateSource`] relative to one base currency and
//! reused until they are older than the configured maximum age. A failed
//! refresh keeps whatever table was there before, even an empty one, so a
//! conversion always produces a value; [`Conversion::approximated`] tells the
//! caller when that value is a passthrough.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};

use trip_types::{Conversion, CurrencyCode, ExchangeError, RateSource, RateStatus, RateTable};

pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

struct RateCache {
    table: RateTable,
    refreshed_at: Option<DateTime<Utc>>,
}

pub struct CurrencyConverter<S: RateSource> {
    source: S,
    base: CurrencyCode,
    max_age: Duration,
    // never held across an await
    cache: RwLock<RateCache>,
}

impl<S: RateSource> CurrencyConverter<S> {
    pub fn new(source: S, base: CurrencyCode, max_age: Duration) -> Self {
        Self {
            source,
            base,
            max_age,
            cache: RwLock::new(RateCache {
                table: RateTable::new(base),
                refreshed_at: None,
            }),
        }
    }

    pub fn base(&self) -> CurrencyCode {
        self.base
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Replaces the cached table as if it had been fetched at `refreshed_at`.
    pub fn prime(&self, table: RateTable, refreshed_at: DateTime<Utc>) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.table = table;
        cache.refreshed_at = Some(refreshed_at);
    }

    /// True when rates were never fetched or are older than the maximum age.
    pub fn is_stale(&self) -> bool {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        match cache.refreshed_at {
            None => true,
            Some(at) => {
                let age = Utc::now().signed_duration_since(at);
                age.to_std().is_ok_and(|age| age > self.max_age)
            }
        }
    }

    /// Fetches a fresh table and swaps it in. Concurrent refreshes race;
    /// the last one to finish wins.
    pub async fn refresh(&self) -> Result<usize, ExchangeError> {
        let table = self.source.fetch_rates(self.base).await?;
        let loaded = table.len();
        self.prime(table, Utc::now());
        tracing::info!(source = self.source.name(), base = %self.base, rates = loaded, "Exchange rates refreshed");
        Ok(loaded)
    }

    async fn ensure_fresh(&self) {
        if !self.is_stale() {
            return;
        }
        if let Err(e) = self.refresh().await {
            tracing::warn!(source = self.source.name(), error = %e, "Rate refresh failed, keeping previous rates");
        }
    }

    /// Current table, refreshed first if stale.
    pub async fn snapshot(&self) -> RateTable {
        self.ensure_fresh().await;
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .table
            .clone()
    }

    pub async fn convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> Conversion {
        if from == to {
            return Conversion::exact(amount);
        }
        self.ensure_fresh().await;
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.table.convert(amount, from, to)
    }

    pub async fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Conversion {
        if from == to {
            return Conversion::exact(1.0);
        }
        self.ensure_fresh().await;
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        cache.table.rate(from, to)
    }

    pub fn status(&self) -> RateStatus {
        let stale = self.is_stale();
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        RateStatus {
            source: self.source.name().to_string(),
            base: self.base,
            rates_loaded: cache.table.len(),
            refreshed_at: cache.refreshed_at,
            stale,
        }
    }
}
