//! Error types for registry operations

use crate::EntityType;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: EntityType, id: String },

    #[error("Conflict on {entity_type}: {reason}")]
    Conflict { entity_type: EntityType, reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,

    #[error("Storage backend error: {reason}")]
    Backend { reason: String },
}

impl StorageError {
    pub fn not_found(entity_type: EntityType, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn conflict(entity_type: EntityType, reason: impl Into<String>) -> Self {
        StorageError::Conflict {
            entity_type,
            reason: reason.into(),
        }
    }
}

/// Input validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value of {field} must be between {min} and {max}")]
    OutOfRange { field: String, min: String, max: String },

    #[error("Cannot move request from {from} to {to}")]
    InvalidTransition { from: String, to: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        ValidationError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Master error type for all registry errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FoncierError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for registry operations.
pub type FoncierResult<T> = Result<T, FoncierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display_not_found() {
        let err = StorageError::not_found(EntityType::Parcel, "abc");
        let msg = err.to_string();
        assert!(msg.contains("Parcel"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_missing_field_message_names_the_field() {
        let err = ValidationError::missing("owner_name");
        assert_eq!(err.to_string(), "Missing field: owner_name");
    }

    #[test]
    fn test_master_error_wraps_sources() {
        let err: FoncierError = StorageError::LockPoisoned.into();
        assert!(matches!(err, FoncierError::Storage(StorageError::LockPoisoned)));
        let err: FoncierError = ValidationError::invalid("area", "must be positive").into();
        assert!(err.to_string().contains("area"));
    }
}
