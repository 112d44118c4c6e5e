//! Traveler domain model.

use serde::{Deserialize, Serialize};

use super::ids::TravelerId;
use crate::error::DomainError;

/// A person taking part in a trip.
///
/// The display name doubles as the join key between expenses (`paid_by`)
/// and balances, so two travelers sharing a name share a balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traveler {
    /// Unique identifier
    #[serde(default)]
    pub id: TravelerId,
    /// Display name
    pub name: String,
    /// Optional contact address, empty when unknown
    #[serde(default)]
    pub email: String,
}

impl Traveler {
    /// Creates a new traveler.
    ///
    /// # Validation
    /// - Name cannot be empty
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::ValidationError(
                "Traveler name cannot be empty".into(),
            ));
        }

        Ok(Self {
            id: TravelerId::new(),
            name,
            email: email.into().trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_traveler_creation() {
        let traveler = Traveler::new("  Ana ", "ana@example.com").unwrap();
        assert_eq!(traveler.name, "Ana");
        assert_eq!(traveler.email, "ana@example.com");
    }

    #[test]
    fn test_empty_name_fails() {
        let result = Traveler::new(" ", "");
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let traveler: Traveler = serde_json::from_str(r#"{"name": "Bo"}"#).unwrap();
        assert_eq!(traveler.name, "Bo");
        assert_eq!(traveler.email, "");
        assert!(!traveler.id.as_str().is_empty());
    }
}
