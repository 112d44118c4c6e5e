//! Error types for the trip ledger.

use exchange_rates::CurrencyError;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error(transparent)]
    InvalidCurrency(#[from] CurrencyError),

    #[error("No travelers to split expenses with")]
    NoParticipants,

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (storage failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Entity not found")]
    NotFound,
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::Serialization(err.to_string())
    }
}

/// Application-level errors (what the service hands to inbound adapters).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No travelers to split expenses with")]
    NoParticipants,

    #[error("External service degraded: {0}")]
    Degraded(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NoParticipants => AppError::NoParticipants,
            DomainError::ValidationError(msg) => AppError::BadRequest(msg),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) | RepoError::Storage(e) => AppError::Degraded(e),
            RepoError::Serialization(e) => AppError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(DomainError::NoParticipants),
            AppError::NoParticipants
        ));
        assert!(matches!(
            AppError::from(DomainError::ValidationError("name".into())),
            AppError::BadRequest(msg) if msg == "name"
        ));
        assert!(matches!(
            AppError::from(DomainError::NegativeAmount),
            AppError::BadRequest(_)
        ));
    }

    #[test]
    fn test_storage_failures_are_degraded() {
        assert!(matches!(
            AppError::from(RepoError::Database("locked".into())),
            AppError::Degraded(_)
        ));
        assert!(matches!(
            AppError::from(RepoError::NotFound),
            AppError::NotFound(_)
        ));
    }
}
