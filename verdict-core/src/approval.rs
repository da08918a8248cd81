//! Approval typestate for compile-time safety of the approval lifecycle.
//!
//! Uses the typestate pattern to make invalid state transitions uncompilable.
//!
//! # State Transition Diagram
//!
//! ```text
//! create() → Pending ──┬── approve() → Approved ──┬── mark_executed() → Executed (terminal)
//!                      │                          └── mark_failed() ──→ Failed   (terminal)
//!                      └── deny() ────→ Denied (terminal)
//! ```
//!
//! Approvals are an audit trail: records are never deleted, only
//! transitioned.

use crate::{ApprovalId, EntityRef, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

// ============================================================================
// APPROVAL STATUS ENUM
// ============================================================================

/// Status of an action approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting a human decision
    Pending,
    /// Approved but not yet executed
    Approved,
    /// Denied by a human reviewer
    Denied,
    /// Approved and the downstream action succeeded
    Executed,
    /// Approved but the downstream action failed
    Failed,
}

impl ApprovalStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Denied => "denied",
            ApprovalStatus::Executed => "executed",
            ApprovalStatus::Failed => "failed",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ApprovalStatusParseError> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "denied" => Ok(ApprovalStatus::Denied),
            "executed" => Ok(ApprovalStatus::Executed),
            "failed" | "failure" => Ok(ApprovalStatus::Failed),
            _ => Err(ApprovalStatusParseError(s.to_string())),
        }
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApprovalStatus::Denied | ApprovalStatus::Executed | ApprovalStatus::Failed
        )
    }

    /// Check if a human decision has been recorded.
    pub fn is_decided(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = ApprovalStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid approval status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalStatusParseError(pub String);

impl fmt::Display for ApprovalStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid approval status: {}", self.0)
    }
}

impl std::error::Error for ApprovalStatusParseError {}

// ============================================================================
// ACTION TYPE AND RISK LEVEL
// ============================================================================

/// Kind of side-effecting action an agent proposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    UpdateIssue,
    CloseIssue,
    UpdateMilestone,
    UpdateInitiative,
    CreateNote,
    SendMessage,
}

impl ActionType {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ActionType::UpdateIssue => "update_issue",
            ActionType::CloseIssue => "close_issue",
            ActionType::UpdateMilestone => "update_milestone",
            ActionType::UpdateInitiative => "update_initiative",
            ActionType::CreateNote => "create_note",
            ActionType::SendMessage => "send_message",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Risk classification assigned by the proposing agent at creation time.
///
/// Immutable after creation; affects review display/sorting only, never
/// lifecycle behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

// ============================================================================
// APPROVAL DATA (internal storage, state-independent)
// ============================================================================

/// Internal data storage for an approval, independent of typestate.
/// This is what gets persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApprovalData {
    pub approval_id: ApprovalId,
    pub action_type: ActionType,
    /// Human-readable description of what the action will do.
    pub description: String,
    /// Action parameters; shape is per action type.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub params: serde_json::Value,
    /// Target entity the action will mutate (weak reference).
    pub entity: EntityRef,
    pub risk_level: RiskLevel,
    pub ai_reasoning: Option<String>,
    /// Identifier of the agent/subsystem that proposed the action.
    pub requested_by: String,
    /// Reviewer whose decision is being requested. `None` means any
    /// reviewer; such approvals surface in every queue.
    pub requested_of: Option<String>,
    /// Human who approved or denied (only set once decided).
    pub decided_by: Option<String>,
    /// Denial reason (only set if denied)
    pub denial_reason: Option<String>,
    /// Downstream execution failure reason (only set if failed)
    pub failure_reason: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub decided_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub executed_at: Option<Timestamp>,
}

// ============================================================================
// TYPESTATE MARKERS
// ============================================================================

/// Marker trait for approval states.
pub trait ApprovalState: private::Sealed + Send + Sync {}

/// Approval is awaiting a human decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending;
impl ApprovalState for Pending {}

/// Approval was granted but not yet executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Approved;
impl ApprovalState for Approved {}

/// Approval was denied (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denied;
impl ApprovalState for Denied {}

/// Approved action executed successfully (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed;
impl ApprovalState for Executed {}

/// Approved action failed downstream (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionFailed;
impl ApprovalState for ExecutionFailed {}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Pending {}
    impl Sealed for super::Approved {}
    impl Sealed for super::Denied {}
    impl Sealed for super::Executed {}
    impl Sealed for super::ExecutionFailed {}
}

// ============================================================================
// APPROVAL TYPESTATE WRAPPER
// ============================================================================

/// An approval with compile-time state tracking.
///
/// The type parameter `S` indicates the current state:
/// - `Approval<Pending>`: can be approved or denied
/// - `Approval<Approved>`: can be marked executed or failed
/// - `Approval<Denied>`: terminal, has denial reason
/// - `Approval<Executed>`: terminal, has execution timestamp
/// - `Approval<ExecutionFailed>`: terminal, has failure reason
#[derive(Debug, Clone)]
pub struct Approval<S: ApprovalState> {
    data: ApprovalData,
    _state: PhantomData<S>,
}

impl<S: ApprovalState> Approval<S> {
    /// Access the underlying approval data (read-only).
    pub fn data(&self) -> &ApprovalData {
        &self.data
    }

    /// Get the approval ID.
    pub fn approval_id(&self) -> ApprovalId {
        self.data.approval_id
    }

    /// Get the proposed action type.
    pub fn action_type(&self) -> ActionType {
        self.data.action_type
    }

    /// Get the target entity reference.
    pub fn entity(&self) -> &EntityRef {
        &self.data.entity
    }

    /// Get the risk classification.
    pub fn risk_level(&self) -> RiskLevel {
        self.data.risk_level
    }

    /// Get when the approval was requested.
    pub fn created_at(&self) -> Timestamp {
        self.data.created_at
    }

    /// Consume and return the underlying data (for serialization).
    pub fn into_data(self) -> ApprovalData {
        self.data
    }
}

impl Approval<Pending> {
    /// Create a new pending approval.
    pub fn new(data: ApprovalData) -> Self {
        Approval {
            data,
            _state: PhantomData,
        }
    }

    /// Approve the proposed action.
    ///
    /// Transitions to `Approval<Approved>`. Consumes the current approval.
    pub fn approve(mut self, approved_by: String, decided_at: Timestamp) -> Approval<Approved> {
        self.data.decided_by = Some(approved_by);
        self.data.decided_at = Some(decided_at);
        Approval {
            data: self.data,
            _state: PhantomData,
        }
    }

    /// Deny the proposed action.
    ///
    /// Transitions to `Approval<Denied>` (terminal state).
    /// Consumes the current approval.
    pub fn deny(
        mut self,
        denied_by: String,
        reason: String,
        decided_at: Timestamp,
    ) -> Approval<Denied> {
        self.data.decided_by = Some(denied_by);
        self.data.denial_reason = Some(reason);
        self.data.decided_at = Some(decided_at);
        Approval {
            data: self.data,
            _state: PhantomData,
        }
    }
}

impl Approval<Approved> {
    /// Get who approved the action.
    pub fn approved_by(&self) -> &str {
        self.data
            .decided_by
            .as_deref()
            .unwrap_or("unknown reviewer")
    }

    /// Get when the decision was recorded.
    pub fn decided_at(&self) -> Timestamp {
        self.data
            .decided_at
            .expect("Approved approval must have decided_at")
    }

    /// Record that the downstream action executed successfully.
    ///
    /// Transitions to `Approval<Executed>` (terminal state).
    pub fn mark_executed(mut self, executed_at: Timestamp) -> Approval<Executed> {
        self.data.executed_at = Some(executed_at);
        Approval {
            data: self.data,
            _state: PhantomData,
        }
    }

    /// Record that the downstream action failed.
    ///
    /// Transitions to `Approval<ExecutionFailed>` (terminal state). The
    /// approval is never left ambiguously Approved after a failed side
    /// effect.
    pub fn mark_failed(mut self, reason: String) -> Approval<ExecutionFailed> {
        self.data.failure_reason = Some(reason);
        Approval {
            data: self.data,
            _state: PhantomData,
        }
    }
}

impl Approval<Denied> {
    /// Get the denial reason.
    pub fn denial_reason(&self) -> &str {
        self.data
            .denial_reason
            .as_deref()
            .unwrap_or("No reason provided")
    }

    /// Get who denied the action.
    pub fn denied_by(&self) -> &str {
        self.data
            .decided_by
            .as_deref()
            .unwrap_or("unknown reviewer")
    }
}

impl Approval<Executed> {
    /// Get when the action was executed.
    pub fn executed_at(&self) -> Timestamp {
        self.data
            .executed_at
            .expect("Executed approval must have executed_at")
    }
}

impl Approval<ExecutionFailed> {
    /// Get the downstream failure reason.
    pub fn failure_reason(&self) -> &str {
        self.data
            .failure_reason
            .as_deref()
            .unwrap_or("No reason provided")
    }
}

// ============================================================================
// APPROVAL COUNTS
// ============================================================================

/// Per-status tally over the approval table.
///
/// `total` always equals the sum of the five buckets; every approval is in
/// exactly one status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApprovalCounts {
    pub pending: u64,
    pub approved: u64,
    pub denied: u64,
    pub executed: u64,
    pub failed: u64,
    pub total: u64,
}

impl ApprovalCounts {
    /// Add one approval in the given status to the tally.
    pub fn record(&mut self, status: ApprovalStatus) {
        match status {
            ApprovalStatus::Pending => self.pending += 1,
            ApprovalStatus::Approved => self.approved += 1,
            ApprovalStatus::Denied => self.denied += 1,
            ApprovalStatus::Executed => self.executed += 1,
            ApprovalStatus::Failed => self.failed += 1,
        }
        self.total += 1;
    }

    /// Tally an iterator of statuses.
    pub fn from_statuses(statuses: impl IntoIterator<Item = ApprovalStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.record(status);
        }
        counts
    }
}

// ============================================================================
// DATABASE BOUNDARY: STORED APPROVAL
// ============================================================================

/// An approval as stored in the database (status-agnostic).
///
/// When loading from storage, the state is unknown at compile time.
/// Use the `into_*` methods to validate and convert to a typed approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredApproval {
    pub data: ApprovalData,
    pub status: ApprovalStatus,
}

/// Enum representing all possible runtime states of an approval.
#[derive(Debug, Clone)]
pub enum TypedApproval {
    Pending(Approval<Pending>),
    Approved(Approval<Approved>),
    Denied(Approval<Denied>),
    Executed(Approval<Executed>),
    Failed(Approval<ExecutionFailed>),
}

impl StoredApproval {
    /// Convert to a typed approval based on the stored status.
    pub fn into_typed(self) -> TypedApproval {
        match self.status {
            ApprovalStatus::Pending => TypedApproval::Pending(Approval {
                data: self.data,
                _state: PhantomData,
            }),
            ApprovalStatus::Approved => TypedApproval::Approved(Approval {
                data: self.data,
                _state: PhantomData,
            }),
            ApprovalStatus::Denied => TypedApproval::Denied(Approval {
                data: self.data,
                _state: PhantomData,
            }),
            ApprovalStatus::Executed => TypedApproval::Executed(Approval {
                data: self.data,
                _state: PhantomData,
            }),
            ApprovalStatus::Failed => TypedApproval::Failed(Approval {
                data: self.data,
                _state: PhantomData,
            }),
        }
    }

    /// Try to convert to a pending approval.
    pub fn into_pending(self) -> Result<Approval<Pending>, ApprovalStateError> {
        if self.status != ApprovalStatus::Pending {
            return Err(ApprovalStateError::WrongState {
                approval_id: self.data.approval_id,
                expected: ApprovalStatus::Pending,
                actual: self.status,
            });
        }
        Ok(Approval {
            data: self.data,
            _state: PhantomData,
        })
    }

    /// Try to convert to an approved (not yet executed) approval.
    pub fn into_approved(self) -> Result<Approval<Approved>, ApprovalStateError> {
        if self.status != ApprovalStatus::Approved {
            return Err(ApprovalStateError::WrongState {
                approval_id: self.data.approval_id,
                expected: ApprovalStatus::Approved,
                actual: self.status,
            });
        }
        Ok(Approval {
            data: self.data,
            _state: PhantomData,
        })
    }

    /// Get the underlying data without state validation.
    pub fn data(&self) -> &ApprovalData {
        &self.data
    }

    /// Get the current status.
    pub fn status(&self) -> ApprovalStatus {
        self.status
    }
}

/// Errors when transitioning approval states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalStateError {
    /// Approval is not in the expected state.
    WrongState {
        approval_id: ApprovalId,
        expected: ApprovalStatus,
        actual: ApprovalStatus,
    },
}

impl fmt::Display for ApprovalStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStateError::WrongState {
                approval_id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Approval {} is in state {} but expected {}",
                    approval_id, actual, expected
                )
            }
        }
    }
}

impl std::error::Error for ApprovalStateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApprovalId, EntityKind, EntityRef};
    use chrono::Utc;
    use uuid::Uuid;

    fn make_approval_data() -> ApprovalData {
        ApprovalData {
            approval_id: ApprovalId::now_v7(),
            action_type: ActionType::UpdateIssue,
            description: "Set issue priority to high".to_string(),
            params: serde_json::json!({ "priority": "high" }),
            entity: EntityRef::new(EntityKind::Issue, Uuid::now_v7()).with_title("Login bug"),
            risk_level: RiskLevel::Low,
            ai_reasoning: Some("User asked for prioritization".to_string()),
            requested_by: "triage-agent".to_string(),
            requested_of: None,
            decided_by: None,
            denial_reason: None,
            failure_reason: None,
            created_at: Utc::now(),
            decided_at: None,
            executed_at: None,
        }
    }

    #[test]
    fn test_approval_status_roundtrip() {
        for status in [
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Denied,
            ApprovalStatus::Executed,
            ApprovalStatus::Failed,
        ] {
            let db_str = status.as_db_str();
            let parsed = ApprovalStatus::from_db_str(db_str).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(!ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Denied.is_terminal());
        assert!(ApprovalStatus::Executed.is_terminal());
        assert!(ApprovalStatus::Failed.is_terminal());
    }

    #[test]
    fn test_approval_happy_path() {
        let now = Utc::now();
        let data = make_approval_data();
        let approval = Approval::<Pending>::new(data);

        let approved = approval.approve("alice".to_string(), now);
        assert_eq!(approved.approved_by(), "alice");
        assert_eq!(approved.decided_at(), now);

        let executed = approved.mark_executed(now);
        assert_eq!(executed.executed_at(), now);
        assert_eq!(executed.data().decided_by.as_deref(), Some("alice"));
    }

    #[test]
    fn test_approval_deny() {
        let now = Utc::now();
        let data = make_approval_data();
        let approval = Approval::<Pending>::new(data);

        let denied = approval.deny("bob".to_string(), "Too risky".to_string(), now);
        assert_eq!(denied.denied_by(), "bob");
        assert_eq!(denied.denial_reason(), "Too risky");
        assert_eq!(denied.data().decided_at, Some(now));
    }

    #[test]
    fn test_approval_execution_failure() {
        let now = Utc::now();
        let data = make_approval_data();
        let approval = Approval::<Pending>::new(data);

        let approved = approval.approve("carol".to_string(), now);
        let failed = approved.mark_failed("entity store rejected update".to_string());
        assert_eq!(failed.failure_reason(), "entity store rejected update");
        assert!(failed.data().executed_at.is_none());
    }

    #[test]
    fn test_stored_approval_conversion() {
        let data = make_approval_data();
        let stored = StoredApproval {
            data: data.clone(),
            status: ApprovalStatus::Pending,
        };

        let pending = stored.into_pending().unwrap();
        assert_eq!(pending.approval_id(), data.approval_id);
    }

    #[test]
    fn test_stored_approval_wrong_state() {
        let data = make_approval_data();
        let stored = StoredApproval {
            data,
            status: ApprovalStatus::Denied,
        };

        assert!(matches!(
            stored.into_pending(),
            Err(ApprovalStateError::WrongState { .. })
        ));
    }

    #[test]
    fn test_counts_sum_to_total() {
        let counts = ApprovalCounts::from_statuses([
            ApprovalStatus::Pending,
            ApprovalStatus::Pending,
            ApprovalStatus::Approved,
            ApprovalStatus::Executed,
            ApprovalStatus::Failed,
        ]);
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.approved, 1);
        assert_eq!(counts.denied, 0);
        assert_eq!(counts.executed, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(
            counts.total,
            counts.pending + counts.approved + counts.denied + counts.executed + counts.failed
        );
    }

    #[test]
    fn test_stored_approval_into_typed() {
        let data = make_approval_data();
        let stored = StoredApproval {
            data,
            status: ApprovalStatus::Approved,
        };
        assert!(matches!(stored.into_typed(), TypedApproval::Approved(_)));
    }

    proptest::proptest! {
        #[test]
        fn prop_counts_always_sum_to_total(raw in proptest::collection::vec(0u8..5, 0..64)) {
            let statuses: Vec<ApprovalStatus> = raw
                .into_iter()
                .map(|n| match n {
                    0 => ApprovalStatus::Pending,
                    1 => ApprovalStatus::Approved,
                    2 => ApprovalStatus::Denied,
                    3 => ApprovalStatus::Executed,
                    _ => ApprovalStatus::Failed,
                })
                .collect();
            let counts = ApprovalCounts::from_statuses(statuses.iter().copied());
            proptest::prop_assert_eq!(counts.total, statuses.len() as u64);
            proptest::prop_assert_eq!(
                counts.total,
                counts.pending + counts.approved + counts.denied + counts.executed + counts.failed
            );
        }
    }
}
