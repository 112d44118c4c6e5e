//! # Trip Repository
//!
//! Outbound adapters for the trip ledger: trip stores implementing the
//! `TripRepository` port and exchange-rate sources implementing `RateSource`.

use async_trait::async_trait;
use trip_types::{Expense, RepoError, Trip, TripId, TripListing, TripRecord, TripRepository};

pub mod file;
pub mod rates;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
mod types;


pub use file::JsonFileRepo;
pub use rates::{DEFAULT_RATES_URL, FixedRateSource, HttpRateSource, Rates, build_rate_source};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// Storage chosen at startup from the configured URL.
pub enum Repo {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteRepo),
    File(JsonFileRepo),
}

/// Build and initialize a repository from a storage URL.
///
/// - `sqlite:...` opens (and migrates) a SQLite database
/// - `file://<dir>` or a bare path stores one JSON document per trip
///
/// # Examples
///
/// ```ignore
/// let repo = build_repo("sqlite://data/trips.db?mode=rwc").await?;
/// let repo = build_repo("file://data/trips").await?;
/// ```
pub async fn build_repo(url: &str) -> anyhow::Result<Repo> {
    Repo::new(url).await
}

impl Repo {
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        if url.starts_with("sqlite:") {
            #[cfg(feature = "sqlite")]
            return Ok(Repo::Sqlite(SqliteRepo::new(url).await?));
            #[cfg(not(feature = "sqlite"))]
            anyhow::bail!("SQLite support is not compiled in (enable the `sqlite` feature)");
        }

        let dir = url.strip_prefix("file://").unwrap_or(url);
        if dir.is_empty() {
            anyhow::bail!("Storage URL is empty");
        }
        Ok(Repo::File(JsonFileRepo::new(dir).await?))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implement TripRepository for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! delegate {
    ($self:ident, $repo:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "sqlite")]
            Repo::Sqlite($repo) => $call,
            Repo::File($repo) => $call,
        }
    };
}

#[async_trait]
impl TripRepository for Repo {
    async fn save_trip(&self, trip: &Trip, expenses: &[Expense]) -> Result<(), RepoError> {
        delegate!(self, repo => repo.save_trip(trip, expenses).await)
    }

    async fn load_trip(&self, id: &TripId) -> Result<Option<TripRecord>, RepoError> {
        delegate!(self, repo => repo.load_trip(id).await)
    }

    async fn list_trips(&self) -> Result<Vec<TripListing>, RepoError> {
        delegate!(self, repo => repo.list_trips().await)
    }

    async fn delete_trip(&self, id: &TripId) -> Result<bool, RepoError> {
        delegate!(self, repo => repo.delete_trip(id).await)
    }

    fn backend(&self) -> &'static str {
        delegate!(self, repo => repo.backend())
    }
}
