//! Error Types for the e-Foncier API
//!
//! Every failure leaves the service as `{"error": "...", "code": "..."}`
//! with the status code implied by its [`ErrorCode`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use foncier_core::{EntityType, FoncierError, StorageError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400, 413)
    // ========================================================================
    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    /// Request body exceeds the configured limit
    PayloadTooLarge,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    EntityNotFound,
    ParcelNotFound,
    NoteNotFound,
    DocumentNotFound,
    RequestNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same unique key already exists
    EntityAlreadyExists,

    /// Operation conflicts with current state
    StateConflict,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    InternalError,
    DatabaseError,
    ServiceUnavailable,
    ConnectionPoolExhausted,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,

            ErrorCode::EntityNotFound
            | ErrorCode::ParcelNotFound
            | ErrorCode::NoteNotFound
            | ErrorCode::DocumentNotFound
            | ErrorCode::RequestNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists | ErrorCode::StateConflict => StatusCode::CONFLICT,

            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }


            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::PayloadTooLarge => "Request body too large",
            ErrorCode::EntityNotFound => "Not found",
            ErrorCode::ParcelNotFound => "Parcel not found",
            ErrorCode::NoteNotFound => "Note not found",
            ErrorCode::DocumentNotFound => "Document not found",
            ErrorCode::RequestNotFound => "Request not found",
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::StateConflict => "Operation conflicts with current state",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
        }
    }

    fn for_missing(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Parcel => ErrorCode::ParcelNotFound,
            EntityType::Note => ErrorCode::NoteNotFound,
            EntityType::Document => ErrorCode::DocumentNotFound,
            EntityType::Request => ErrorCode::RequestNotFound,
            EntityType::History => ErrorCode::EntityNotFound,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Human-readable error message
    #[serde(rename = "error")]
    pub message: String,

    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code, code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// `Missing field: <name>`, the message the registration form expects.
    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("Missing field: {}", field))
    }

    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            ErrorCode::PayloadTooLarge,
            format!("Request body exceeds {} bytes", limit),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::EntityNotFound, message)
    }

    pub fn parcel_not_found() -> Self {
        Self::from_code(ErrorCode::ParcelNotFound)
    }

    pub fn note_not_found() -> Self {
        Self::from_code(ErrorCode::NoteNotFound)
    }

    pub fn document_not_found() -> Self {
        Self::from_code(ErrorCode::DocumentNotFound)
    }

    pub fn request_not_found() -> Self {
        Self::from_code(ErrorCode::RequestNotFound)
    }

    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = %self.code, message = %self.message, "request failed");
        }
        (status, Json(self)).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { entity_type, .. } => {
                ApiError::from_code(ErrorCode::for_missing(entity_type))
            }
            StorageError::Conflict { reason, .. } => {
                ApiError::new(ErrorCode::EntityAlreadyExists, reason)
            }
            StorageError::TransactionFailed { reason } | StorageError::Backend { reason } => {
                tracing::error!(%reason, "storage failure");
                ApiError::database_error("Database operation failed")
                    .with_details(serde_json::json!({ "cause": storage_cause(&reason) }))
            }
            StorageError::LockPoisoned => ApiError::internal_error("Storage lock poisoned"),
        }
    }
}

/// First line of a storage failure, capped at [`MAX_CAUSE_CHARS`].
fn storage_cause(reason: &str) -> String {
    reason
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(MAX_CAUSE_CHARS)
        .collect()
}

const MAX_CAUSE_CHARS: usize = 160;

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::MissingField { field } => ApiError::missing_field(field),
            ValidationError::InvalidValue { .. } => ApiError::invalid_input(err.to_string()),
            ValidationError::OutOfRange { .. } => {
                ApiError::new(ErrorCode::InvalidRange, err.to_string())
            }
            ValidationError::InvalidTransition { .. } => ApiError::state_conflict(err.to_string()),
        }
    }
}

impl From<FoncierError> for ApiError {
    fn from(err: FoncierError) -> Self {
        match err {
            FoncierError::Storage(e) => e.into(),
            FoncierError::Validation(e) => e.into(),
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        // Log the full error, return a generic one
        tracing::error!("Database error: {:?}", err);
        ApiError::database_error("Database operation failed")
    }
}

impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {:?}", err);
        ApiError::internal_error(err.to_string())
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::MissingField.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::ParcelNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::EntityAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::StateConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::DatabaseError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::ServiceUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_body_uses_error_key() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ApiError::missing_field("province"))?;
        assert_eq!(json["error"], "Missing field: province");
        assert_eq!(json["code"], "MISSING_FIELD");
        assert!(json.get("details").is_none());
        assert!(json.get("message").is_none());
        Ok(())
    }

    #[test]
    fn test_storage_errors_map_to_statuses() {
        let err: ApiError = StorageError::not_found(EntityType::Note, "n1").into();
        assert_eq!(err.code, ErrorCode::NoteNotFound);

        let err: ApiError =
            StorageError::conflict(EntityType::Parcel, "Reference already exists").into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.message, "Reference already exists");

        let err: ApiError = StorageError::Backend {
            reason: "secret dsn".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_storage_failure_carries_short_cause() {
        let reason = format!(
            "db error: ERROR: could not determine data type of parameter $32\nDETAIL: {}",
            "x".repeat(400)
        );
        let err: ApiError = StorageError::TransactionFailed { reason }.into();
        assert_eq!(err.message, "Database operation failed");
        let cause = err.details.as_ref().unwrap()["cause"].as_str().unwrap();
        assert_eq!(
            cause,
            "db error: ERROR: could not determine data type of parameter $32"
        );

        let err: ApiError = StorageError::Backend {
            reason: "y".repeat(400),
        }
        .into();
        let cause = err.details.unwrap()["cause"].as_str().unwrap().to_string();
        assert_eq!(cause.chars().count(), MAX_CAUSE_CHARS);
    }

    #[test]
    fn test_validation_errors_map_to_statuses() {
        let err: ApiError = FoncierError::from(ValidationError::missing("avenue")).into();
        assert_eq!(err.message, "Missing field: avenue");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = ValidationError::InvalidTransition {
            from: "Approuvé".to_string(),
            to: "Rejeté".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
