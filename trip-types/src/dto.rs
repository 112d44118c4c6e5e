//! Data Transfer Objects (DTOs) for requests and responses.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ExpenseId, TripId, timestamp};
use exchange_rates::CurrencyCode;

// ─────────────────────────────────────────────────────────────────────────────
// Trip DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a new trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTripRequest {
    pub name: String,
    #[serde(default)]
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_currency")]
    pub currency: CurrencyCode,
}

fn default_currency() -> CurrencyCode {
    CurrencyCode::USD
}

/// Wraps the result of a mutation with whether it reached storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub data: T,
    pub saved: bool,
}

impl<T> Persisted<T> {
    pub fn new(data: T, saved: bool) -> Self {
        Self { data, saved }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    pub trip_id: TripId,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTripResponse {
    pub trip_id: TripId,
    /// An open session was closed
    pub closed: bool,
    /// A stored copy was deleted
    pub deleted: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Traveler & Expense DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to add a traveler to a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTravelerRequest {
    pub name: String,
    #[serde(default)]
    pub email: String,
}

/// Request to record an expense.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddExpenseRequest {
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    /// Defaults to the trip currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    pub category: String,
    pub paid_by: String,
    /// Defaults to now
    #[serde(
        default,
        with = "timestamp::serde_timestamp_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDateTime>,
    #[serde(default)]
    pub split_with: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteExpenseResponse {
    pub expense_id: ExpenseId,
    pub saved: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Report & Conversion DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryQuery {
    /// Also convert every expense into the trip currency
    #[serde(default)]
    pub convert: bool,
}

/// Request to convert an amount between currencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertRequest {
    pub amount: f64,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub converted_amount: f64,
    pub rate: f64,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    /// A missing rate forced a one-to-one passthrough
    pub approximated: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Status DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateStatus {
    pub source: String,
    pub base: CurrencyCode,
    pub rates_loaded: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub storage_backend: String,
    pub open_sessions: usize,
    pub rates: RateStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_expense_defaults() {
        let req: AddExpenseRequest = serde_json::from_str(
            r#"{"amount": 12.5, "category": "food", "paid_by": "Ana"}"#,
        )
        .unwrap();
        assert_eq!(req.description, "");
        assert!(req.currency.is_none());
        assert!(req.date.is_none());
        assert!(req.split_with.is_empty());
    }

    #[test]
    fn test_add_expense_with_date_and_currency() {
        let req: AddExpenseRequest = serde_json::from_str(
            r#"{"amount": 3, "currency": "eur", "category": "transport",
                "paid_by": "Bo", "date": "2024-01-02 08:15:00", "split_with": ["Ana"]}"#,
        )
        .unwrap();
        assert_eq!(req.currency, Some(CurrencyCode::EUR));
        assert_eq!(
            req.date.map(|d| timestamp::format_timestamp(&d)).as_deref(),
            Some("2024-01-02 08:15:00")
        );
    }

    #[test]
    fn test_bad_currency_is_rejected() {
        let result = serde_json::from_str::<ConvertRequest>(
            r#"{"amount": 1, "from_currency": "dollars", "to_currency": "EUR"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_create_trip_defaults_to_usd() {
        let req: CreateTripRequest = serde_json::from_str(
            r#"{"name": "Rome", "start_date": "2024-06-01", "end_date": "2024-06-04"}"#,
        )
        .unwrap();
        assert_eq!(req.currency, CurrencyCode::USD);
    }
}
