//! Database row types for the SQLite store.
//!
//! Scalar trip fields live in their own columns; travelers and expenses are
//! JSON text columns so a trip is always read and written whole.

use chrono::NaiveDate;
use sqlx::FromRow;

use trip_types::domain::timestamp;
use trip_types::{
    CurrencyCode, DomainError, Expense, RepoError, Traveler, Trip, TripListing, TripRecord,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Trip columns shared by every query.
#[derive(FromRow)]
pub struct DbTrip {
    pub id: String,
    pub name: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub currency: String,
    pub travelers: String,
    pub created_at: String,
}

/// Trip row with its expense list.
#[derive(FromRow)]
pub struct DbTripRecord {
    #[sqlx(flatten)]
    pub trip: DbTrip,
    pub expenses: String,
}

/// Trip row with the length of its expense list.
#[derive(FromRow)]
pub struct DbTripListing {
    #[sqlx(flatten)]
    pub trip: DbTrip,
    pub expense_count: i64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Row -> domain conversions
// ─────────────────────────────────────────────────────────────────────────────

fn parse_date(column: &str, raw: &str) -> Result<NaiveDate, RepoError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        RepoError::Domain(DomainError::ValidationError(format!(
            "Invalid {column} {raw:?}: {e}"
        )))
    })
}

impl DbTrip {
    pub fn into_domain(self) -> Result<Trip, RepoError> {
        let travelers: Vec<Traveler> = serde_json::from_str(&self.travelers)?;
        Ok(Trip {
            id: self.id.parse()?,
            name: self.name,
            destination: self.destination,
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            currency: CurrencyCode::parse(&self.currency).map_err(DomainError::from)?,
            travelers,
            created_at: timestamp::parse_timestamp(&self.created_at)?,
        })
    }
}

impl DbTripRecord {
    pub fn into_domain(self) -> Result<TripRecord, RepoError> {
        let expenses: Vec<Expense> = serde_json::from_str(&self.expenses)?;
        Ok(TripRecord {
            trip: self.trip.into_domain()?,
            expenses,
        })
    }
}

impl DbTripListing {
    pub fn into_domain(self) -> Result<TripListing, RepoError> {
        Ok(TripListing {
            trip: self.trip.into_domain()?,
            expense_count: usize::try_from(self.expense_count).unwrap_or_default(),
        })
    }
}
