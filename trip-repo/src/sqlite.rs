//! SQLite repository adapter.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use trip_types::domain::timestamp;
use trip_types::{Expense, RepoError, Trip, TripId, TripListing, TripRecord, TripRepository};

use crate::types::{DbTripListing, DbTripRecord};

const MIGRATION: &str = include_str!("../migrations/0001_create_trips.sql");

const TRIP_COLUMNS: &str =
    "id, name, destination, start_date, end_date, currency, travelers, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::query(MIGRATION).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TripRepository for SqliteRepo {
    #[tracing::instrument(skip(self, trip, expenses), fields(trip_id = %trip.id))]
    async fn save_trip(&self, trip: &Trip, expenses: &[Expense]) -> Result<(), RepoError> {
        let travelers = serde_json::to_string(&trip.travelers)?;
        let expenses = serde_json::to_string(expenses)?;
        let updated_at = timestamp::format_timestamp(&timestamp::now());

        sqlx::query(
            r#"INSERT INTO trips
                (id, name, destination, start_date, end_date, currency,
                 travelers, expenses, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 destination = excluded.destination,
                 start_date = excluded.start_date,
                 end_date = excluded.end_date,
                 currency = excluded.currency,
                 travelers = excluded.travelers,
                 expenses = excluded.expenses,
                 updated_at = excluded.updated_at"#,
        )
        .bind(trip.id.as_str())
        .bind(&trip.name)
        .bind(&trip.destination)
        .bind(trip.start_date.to_string())
        .bind(trip.end_date.to_string())
        .bind(trip.currency.as_str())
        .bind(travelers)
        .bind(expenses)
        .bind(timestamp::format_timestamp(&trip.created_at))
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn load_trip(&self, id: &TripId) -> Result<Option<TripRecord>, RepoError> {
        let row: Option<DbTripRecord> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS}, expenses FROM trips WHERE id = ?"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbTripRecord::into_domain).transpose()
    }

    async fn list_trips(&self) -> Result<Vec<TripListing>, RepoError> {
        let rows: Vec<DbTripListing> = sqlx::query_as(&format!(
            "SELECT {TRIP_COLUMNS}, json_array_length(expenses) AS expense_count \
             FROM trips ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbTripListing::into_domain).collect()
    }

    async fn delete_trip(&self, id: &TripId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM trips WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
