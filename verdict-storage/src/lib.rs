//! VERDICT Storage - Store Traits and In-Memory Backend
//!
//! Components never talk to a global store; each takes the store handles it
//! needs at construction (capability-style injection). The traits here are
//! the contract; [`InMemoryStore`] is the reference backend used by the API
//! server and the test suites.
//!
//! The one piece of cross-process coordination lives in
//! [`ApprovalStore::decide_approval`] and
//! [`ApprovalStore::record_execution`]: both are compare-and-swap writes
//! that fail with `StaleApprovalStatus` when the record has already moved
//! out of the expected status. First writer wins; losers observe the
//! conflict instead of overwriting it.

use async_trait::async_trait;
use verdict_core::{
    ActionType, ApprovalCounts, ApprovalId, ApprovalStatus, EntityRef, ReviewRequest, SessionData,
    SessionId, StoredApproval, Timestamp, VerdictResult, WorkItem, WorkItemKind,
};

pub mod memory;

pub use memory::InMemoryStore;

// ============================================================================
// DECISION AND OUTCOME TYPES
// ============================================================================

/// A human decision applied to a pending approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve { approved_by: String },
    Deny { denied_by: String, reason: String },
}

/// Result of executing an approved action against the entity store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    Failed { reason: String },
}

// ============================================================================
// APPROVAL STORE
// ============================================================================

/// Persistence contract for the action approval queue.
///
/// Approvals are an audit trail: there is no delete operation.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    /// Persist a new approval. Fails if the ID already exists.
    async fn insert_approval(&self, approval: &StoredApproval) -> VerdictResult<()>;

    /// Fetch an approval by ID.
    async fn get_approval(&self, approval_id: ApprovalId) -> VerdictResult<Option<StoredApproval>>;

    /// List approvals, optionally filtered by status, newest first.
    async fn list_approvals(
        &self,
        status: Option<ApprovalStatus>,
        limit: usize,
    ) -> VerdictResult<Vec<StoredApproval>>;

    /// Per-status tally over the whole approval table.
    async fn approval_counts(&self) -> VerdictResult<ApprovalCounts>;

    /// Pending approvals awaiting `user`'s decision, newest first.
    ///
    /// Includes approvals with no designated reviewer.
    async fn list_pending_for(&self, user: &str, limit: usize)
        -> VerdictResult<Vec<StoredApproval>>;

    /// Apply a human decision to a pending approval (compare-and-swap).
    ///
    /// Fails with `StaleApprovalStatus` when the approval is no longer
    /// pending, and with `ApprovalNotFound` when the ID is unknown. Returns
    /// the updated record on success.
    async fn decide_approval(
        &self,
        approval_id: ApprovalId,
        decision: ApprovalDecision,
        decided_at: Timestamp,
    ) -> VerdictResult<StoredApproval>;

    /// Record the downstream execution outcome of an approved action
    /// (compare-and-swap on status = approved).
    ///
    /// Success moves the approval to `executed` with `executed_at = now`;
    /// failure moves it to `failed` with the reason recorded. Either way the
    /// approval is never left ambiguously approved.
    async fn record_execution(
        &self,
        approval_id: ApprovalId,
        outcome: ExecutionOutcome,
        now: Timestamp,
    ) -> VerdictResult<StoredApproval>;
}

// ============================================================================
// SESSION STORE
// ============================================================================

/// Persistence contract for agent session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session. Fails if the ID already exists.
    async fn insert_session(&self, session: &SessionData) -> VerdictResult<()>;

    /// Fetch a session by ID.
    async fn get_session(&self, session_id: SessionId) -> VerdictResult<Option<SessionData>>;

    /// Overwrite a session record.
    ///
    /// Rejects the write with `SessionTerminal` when the stored row has
    /// already reached a terminal status; the lifecycle rules in
    /// `verdict-core` validate transitions, the store is the arbiter under
    /// concurrent writers.
    async fn update_session(&self, session: &SessionData) -> VerdictResult<()>;

    /// Sessions not yet terminal, newest first.
    async fn list_active_sessions(&self) -> VerdictResult<Vec<SessionData>>;

    /// Most recent sessions by started_at descending, bounded by limit.
    async fn list_recent_sessions(&self, limit: usize) -> VerdictResult<Vec<SessionData>>;

    /// Sessions with started_at >= since, newest first.
    async fn list_sessions_started_since(
        &self,
        since: Timestamp,
    ) -> VerdictResult<Vec<SessionData>>;
}

// ============================================================================
// WORK ITEM STORE
// ============================================================================

/// Read-side contract for the queue aggregator's non-approval categories.
///
/// Work items and review requests are written by upstream subsystems; the
/// insert methods exist so those feeds (and fixtures) have somewhere to
/// land.
#[async_trait]
pub trait WorkItemStore: Send + Sync {
    async fn insert_work_item(&self, item: &WorkItem) -> VerdictResult<()>;

    async fn insert_review_request(&self, request: &ReviewRequest) -> VerdictResult<()>;

    /// Non-closed items of one kind assigned to `user`, newest first.
    async fn list_assigned_work_items(
        &self,
        user: &str,
        kind: WorkItemKind,
        limit: usize,
    ) -> VerdictResult<Vec<WorkItem>>;

    /// Open review requests where `user` is the reviewer, newest first.
    async fn list_review_requests_for(
        &self,
        user: &str,
        limit: usize,
    ) -> VerdictResult<Vec<ReviewRequest>>;
}

// ============================================================================
// ENTITY STORE
// ============================================================================

/// Capability handle onto the external entity tables.
///
/// Approved actions are executed through this interface; the mutation is
/// outside the approval queue's consistency boundary, which is why
/// execution failures surface as a distinct outcome instead of rolling the
/// decision back.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Check that the referenced entity exists.
    async fn entity_exists(&self, entity: &EntityRef) -> VerdictResult<bool>;

    /// Apply an approved action's parameters to the referenced entity.
    async fn apply_action(
        &self,
        entity: &EntityRef,
        action_type: ActionType,
        params: &serde_json::Value,
    ) -> VerdictResult<()>;
}
