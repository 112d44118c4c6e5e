//! Trip domain model.

use chrono::{NaiveDate, NaiveDateTime};
use exchange_rates::CurrencyCode;
use serde::{Deserialize, Serialize};

use super::expense::Expense;
use super::ids::TripId;
use super::timestamp;
use super::traveler::Traveler;
use crate::error::DomainError;

/// A trip shared by a group of travelers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    /// Unique identifier
    #[serde(default)]
    pub id: TripId,
    /// Human-readable trip name
    pub name: String,
    #[serde(default)]
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Display currency for reports
    pub currency: CurrencyCode,
    /// Travelers in the order they joined
    #[serde(default)]
    pub travelers: Vec<Traveler>,
    /// When the trip was created
    #[serde(with = "timestamp::serde_timestamp", default = "timestamp::now")]
    pub created_at: NaiveDateTime,
}

impl Trip {
    /// Creates a new trip with no travelers.
    ///
    /// # Validation
    /// - Name cannot be empty
    /// - End date cannot precede the start date
    pub fn new(
        name: impl Into<String>,
        destination: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        currency: CurrencyCode,
    ) -> Result<Self, DomainError> {
        let trip = Self {
            id: TripId::new(),
            name: name.into().trim().to_string(),
            destination: destination.into().trim().to_string(),
            start_date,
            end_date,
            currency,
            travelers: Vec::new(),
            created_at: timestamp::now(),
        };
        trip.validate()?;
        Ok(trip)
    }

    /// Checks the invariants that constructors enforce, for trips that
    /// arrived through deserialization.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Trip name cannot be empty".into(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(DomainError::ValidationError(format!(
                "End date {} is before start date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }

    pub fn add_traveler(&mut self, traveler: Traveler) {
        self.travelers.push(traveler);
    }

    /// Removes every traveler with the given name. Returns whether any was removed.
    pub fn remove_traveler(&mut self, name: &str) -> bool {
        let before = self.travelers.len();
        self.travelers.retain(|t| t.name != name);
        self.travelers.len() != before
    }

    pub fn traveler(&self, name: &str) -> Option<&Traveler> {
        self.travelers.iter().find(|t| t.name == name)
    }
}

/// A trip together with its expenses, as stored and exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip: Trip,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

/// A stored trip as shown in listings, without its expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripListing {
    pub trip: Trip,
    pub expense_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn lisbon() -> Trip {
        Trip::new(
            "Lisbon",
            "Portugal",
            date("2024-05-01"),
            date("2024-05-07"),
            CurrencyCode::EUR,
        )
        .unwrap()
    }

    #[test]
    fn test_trip_creation() {
        let trip = lisbon();
        assert_eq!(trip.name, "Lisbon");
        assert_eq!(trip.currency, CurrencyCode::EUR);
        assert!(trip.travelers.is_empty());
    }

    #[test]
    fn test_empty_name_fails() {
        let result = Trip::new(
            "  ",
            "",
            date("2024-05-01"),
            date("2024-05-01"),
            CurrencyCode::USD,
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_end_before_start_fails() {
        let result = Trip::new(
            "Backwards",
            "",
            date("2024-05-02"),
            date("2024-05-01"),
            CurrencyCode::USD,
        );
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_add_and_remove_travelers() {
        let mut trip = lisbon();
        trip.add_traveler(Traveler::new("Ana", "").unwrap());
        trip.add_traveler(Traveler::new("Bo", "").unwrap());
        assert_eq!(trip.traveler("Bo").map(|t| t.name.as_str()), Some("Bo"));

        assert!(trip.remove_traveler("Ana"));
        assert!(!trip.remove_traveler("Ana"));
        assert_eq!(trip.travelers.len(), 1);
    }

    #[test]
    fn test_wire_shape() {
        let trip = lisbon();
        let json = serde_json::to_value(&trip).unwrap();
        for key in [
            "id",
            "name",
            "destination",
            "start_date",
            "end_date",
            "currency",
            "travelers",
            "created_at",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["start_date"], "2024-05-01");
        assert_eq!(json["currency"], "EUR");
    }

    #[test]
    fn test_deserialize_assigns_missing_id() {
        let trip: Trip = serde_json::from_str(
            r#"{"name": "Oslo", "destination": "Norway", "start_date": "2024-01-01",
                "end_date": "2024-01-03", "currency": "nok",
                "created_at": "2023-12-20 10:00:00"}"#,
        )
        .unwrap();
        assert!(!trip.id.as_str().is_empty());
        assert_eq!(trip.currency.as_str(), "NOK");
        assert_eq!(
            timestamp::format_timestamp(&trip.created_at),
            "2023-12-20 10:00:00"
        );
    }
}
