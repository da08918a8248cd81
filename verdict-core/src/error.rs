//! Error types for VERDICT operations

use crate::{ApprovalStatus, EntityKind, SessionStatus};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Approval not found: {id}")]
    ApprovalNotFound { id: Uuid },

    #[error("Session not found: {id}")]
    SessionNotFound { id: Uuid },

    #[error("Entity not found: {kind} with id {id}")]
    EntityNotFound { kind: EntityKind, id: Uuid },

    /// Compare-and-swap failure: the record moved out of the expected status
    /// between read and write. Whichever request landed first won.
    #[error("Approval {id} is in state {actual} but expected {expected}")]
    StaleApprovalStatus {
        id: Uuid,
        expected: ApprovalStatus,
        actual: ApprovalStatus,
    },

    #[error("Session {id} is in terminal state {status}")]
    SessionTerminal { id: Uuid, status: SessionStatus },

    #[error("Insert failed: {reason}")]
    InsertFailed { reason: String },

    #[error("Action execution failed against {kind} {id}: {reason}")]
    ActionFailed {
        kind: EntityKind,
        id: Uuid,
        reason: String,
    },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Master error type for all VERDICT errors.
#[derive(Debug, Clone, Error)]
pub enum VerdictError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type alias for VERDICT operations.
pub type VerdictResult<T> = Result<T, VerdictError>;
