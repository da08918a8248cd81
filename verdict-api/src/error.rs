//! Error Types for the VERDICT API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use verdict_core::{SessionTransitionError, StorageError, ValidationError, VerdictError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested approval does not exist
    ApprovalNotFound,

    /// Requested agent session does not exist
    SessionNotFound,

    /// Referenced entity does not exist
    EntityNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Operation conflicts with current lifecycle state
    StateConflict,

    /// Concurrent modification detected (compare-and-swap failure)
    ConcurrentModification,

    /// Record with the same identifier already exists
    AlreadyExists,

    // ========================================================================
    // Upstream Errors (502)
    // ========================================================================
    /// Executing an approved action against the entity store failed
    ExecutionFailed,

    // ========================================================================
    // Server Errors (500)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Storage operation failed
    StorageFailure,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Validation errors
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            // Not found errors
            ErrorCode::ApprovalNotFound
            | ErrorCode::SessionNotFound
            | ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            // Conflict errors
            ErrorCode::StateConflict
            | ErrorCode::ConcurrentModification
            | ErrorCode::AlreadyExists => StatusCode::CONFLICT,

            // Upstream errors
            ErrorCode::ExecutionFailed => StatusCode::BAD_GATEWAY,

            // Server errors
            ErrorCode::InternalError | ErrorCode::StorageFailure => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            // Validation
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidFormat => "Invalid format",

            // Not Found
            ErrorCode::ApprovalNotFound => "Approval not found",
            ErrorCode::SessionNotFound => "Session not found",
            ErrorCode::EntityNotFound => "Entity not found",

            // Conflict
            ErrorCode::StateConflict => "Operation conflicts with current state",
            ErrorCode::ConcurrentModification => "Concurrent modification detected",
            ErrorCode::AlreadyExists => "Record already exists",

            // Upstream
            ErrorCode::ExecutionFailed => "Downstream action execution failed",

            // Server
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageFailure => "Storage operation failed",
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

/// Structured error response for API operations.
///
/// This type is returned by all API endpoints when an error occurs.
/// It provides a consistent error format across REST and WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, conflicting status, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create a ValidationFailed error.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create an ApprovalNotFound error.
    pub fn approval_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ApprovalNotFound,
            format!("Approval {} not found", id),
        )
    }

    /// Create a SessionNotFound error.
    pub fn session_not_found(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::SessionNotFound,
            format!("Session {} not found", id),
        )
    }

    /// Create an EntityNotFound error.
    pub fn entity_not_found(kind: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", kind, id),
        )
    }

    /// Create a StateConflict error.
    pub fn state_conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StateConflict, message)
    }

    /// Create a ConcurrentModification error.
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConcurrentModification, message)
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyExists, message)
    }

    /// Create an ExecutionFailed error.
    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExecutionFailed,
            format!("Action execution failed: {}", reason.into()),
        )
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a StorageFailure error.
    pub fn storage_failure(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageFailure, message)
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

/// Implement IntoResponse for ApiError to enable automatic error handling in Axum.
///
/// This allows ApiError to be returned directly from Axum handlers:
/// ```ignore
/// async fn handler() -> Result<Json<Response>, ApiError> {
///     Err(ApiError::approval_not_found(id))
/// }
/// ```
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

/// Convert from VerdictError to ApiError.
///
/// Maps the domain error taxonomy onto HTTP semantics: missing records to
/// 404, compare-and-swap losses and terminal-state writes to 409, failed
/// downstream mutations to 502, everything else to 500.
impl From<VerdictError> for ApiError {
    fn from(err: VerdictError) -> Self {
        match err {
            VerdictError::Storage(storage) => match storage {
                StorageError::ApprovalNotFound { id } => ApiError::approval_not_found(id),
                StorageError::SessionNotFound { id } => ApiError::session_not_found(id),
                StorageError::EntityNotFound { kind, id } => ApiError::entity_not_found(kind, id),
                StorageError::StaleApprovalStatus {
                    id,
                    expected,
                    actual,
                } => ApiError::concurrent_modification(format!(
                    "Approval {} is in state {} but expected {}",
                    id, actual, expected
                ))
                .with_details(serde_json::json!({
                    "expected": expected,
                    "actual": actual,
                })),
                StorageError::SessionTerminal { id, status } => ApiError::state_conflict(format!(
                    "Session {} already reached terminal state {}",
                    id, status
                )),
                StorageError::InsertFailed { reason } => ApiError::already_exists(reason),
                StorageError::ActionFailed { kind, id, reason } => {
                    ApiError::execution_failed(format!("{} {}: {}", kind, id, reason))
                }
                StorageError::LockPoisoned => {
                    tracing::error!("Storage lock poisoned");
                    ApiError::storage_failure("Storage lock poisoned")
                }
            },
            VerdictError::Validation(validation) => match validation {
                ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
                ValidationError::InvalidValue { field, reason } => {
                    ApiError::invalid_input(format!("Invalid value for {}: {}", field, reason))
                }
            },
        }
    }
}

/// Convert from SessionTransitionError to ApiError.
///
/// Both variants are lifecycle conflicts (409).
impl From<SessionTransitionError> for ApiError {
    fn from(err: SessionTransitionError) -> Self {
        match err {
            SessionTransitionError::Terminal { session_id, status } => {
                ApiError::state_conflict(format!(
                    "Session {} is terminal ({}), no further updates accepted",
                    session_id, status
                ))
            }
            SessionTransitionError::InvalidTransition {
                session_id,
                from,
                to,
            } => ApiError::state_conflict(format!(
                "Session {} cannot transition from {} to {}",
                session_id, from, to
            )),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Convert from uuid::Error to ApiError.
impl From<uuid::Error> for ApiError {
    fn from(err: uuid::Error) -> Self {
        ApiError::invalid_format("id", &format!("valid UUID: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
///
/// This is the standard result type used throughout the API layer.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use verdict_core::ApprovalStatus;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(
            ErrorCode::ValidationFailed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::ApprovalNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ErrorCode::StateConflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::ConcurrentModification.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::ExecutionFailed.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_api_error_constructors() {
        let err = ApiError::approval_not_found("123");
        assert_eq!(err.code, ErrorCode::ApprovalNotFound);
        assert!(err.message.contains("123"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err = ApiError::missing_field("denial_reason");
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("denial_reason"));
    }

    #[test]
    fn test_stale_status_maps_to_conflict() {
        let domain: VerdictError = StorageError::StaleApprovalStatus {
            id: Uuid::nil(),
            expected: ApprovalStatus::Pending,
            actual: ApprovalStatus::Denied,
        }
        .into();
        let err = ApiError::from(domain);
        assert_eq!(err.code, ErrorCode::ConcurrentModification);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(err.details.is_some());
    }

    #[test]
    fn test_action_failed_maps_to_bad_gateway() {
        let domain: VerdictError = StorageError::ActionFailed {
            kind: verdict_core::EntityKind::Issue,
            id: Uuid::nil(),
            reason: "network error".to_string(),
        }
        .into();
        let err = ApiError::from(domain);
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert!(err.message.contains("network error"));
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::state_conflict("Approval is denied");
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("STATE_CONFLICT"));
        assert!(json.contains("Approval is denied"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::execution_failed("entity store unreachable");
        let display = format!("{}", err);

        assert!(display.contains("ExecutionFailed"));
        assert!(display.contains("entity store unreachable"));
    }
}
