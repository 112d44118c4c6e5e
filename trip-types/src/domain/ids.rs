//! Opaque identifiers for trips, travelers and expenses.
//!
//! Identities are plain string tokens. Fresh ones are UUID v4 strings, but
//! anything non-empty that arrives from storage or a client is kept as-is.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::ValidationError(
                        concat!($label, " cannot be empty").into(),
                    ));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for a Trip.
    TripId,
    "Trip ID"
);

define_id!(
    /// Unique identifier for a Traveler.
    TravelerId,
    "Traveler ID"
);

define_id!(
    /// Unique identifier for an Expense.
    ExpenseId,
    "Expense ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_unique_uuids() {
        let a = TripId::new();
        let b = TripId::new();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_any_non_empty_token_is_accepted() {
        let id: ExpenseId = " legacy-42 ".parse().unwrap();
        assert_eq!(id.as_str(), "legacy-42");
    }

    #[test]
    fn test_empty_id_is_rejected() {
        assert!(matches!(
            "   ".parse::<TravelerId>(),
            Err(DomainError::ValidationError(_))
        ));
        assert!(serde_json::from_str::<TripId>("\"\"").is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id: TripId = "trip-1".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"trip-1\"");
    }
}
