//! In-memory store backed by `RwLock`-guarded maps.
//!
//! Backs the API server in development and the test suites everywhere.
//! Compare-and-swap semantics hold because status checks and writes happen
//! under the same write guard.

use crate::{
    ApprovalDecision, ApprovalStore, EntityStore, ExecutionOutcome, SessionStore, WorkItemStore,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;
use verdict_core::{
    ActionType, Approval, ApprovalCounts, ApprovalId, ApprovalStateError, ApprovalStatus,
    EntityKind, EntityRef, ReviewRequest, ReviewStatus, SessionData, SessionId, StorageError,
    StoredApproval, Timestamp, VerdictError, VerdictResult, WorkItem, WorkItemKind,
};

/// In-memory implementation of all four store traits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    approvals: RwLock<HashMap<Uuid, StoredApproval>>,
    sessions: RwLock<HashMap<Uuid, SessionData>>,
    work_items: RwLock<Vec<WorkItem>>,
    review_requests: RwLock<Vec<ReviewRequest>>,
    entities: RwLock<HashMap<(EntityKind, Uuid), serde_json::Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an entity document. Keys are (kind, id); the document shape is
    /// whatever the upstream table row serializes to.
    pub fn put_entity(&self, entity: &EntityRef, doc: serde_json::Value) -> VerdictResult<()> {
        let mut entities = write_guard(&self.entities)?;
        entities.insert((entity.kind, entity.id), doc);
        Ok(())
    }

    /// Fetch a seeded entity document (test/demo introspection).
    pub fn get_entity(&self, entity: &EntityRef) -> VerdictResult<Option<serde_json::Value>> {
        let entities = read_guard(&self.entities)?;
        Ok(entities.get(&(entity.kind, entity.id)).cloned())
    }
}

fn read_guard<T>(lock: &RwLock<T>) -> VerdictResult<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::LockPoisoned.into())
}

fn write_guard<T>(lock: &RwLock<T>) -> VerdictResult<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::LockPoisoned.into())
}

fn stale(err: ApprovalStateError) -> VerdictError {
    match err {
        ApprovalStateError::WrongState {
            approval_id,
            expected,
            actual,
        } => StorageError::StaleApprovalStatus {
            id: approval_id.as_uuid(),
            expected,
            actual,
        }
        .into(),
    }
}

// ============================================================================
// APPROVAL STORE
// ============================================================================

#[async_trait]
impl ApprovalStore for InMemoryStore {
    async fn insert_approval(&self, approval: &StoredApproval) -> VerdictResult<()> {
        let mut approvals = write_guard(&self.approvals)?;
        let key = approval.data.approval_id.as_uuid();
        if approvals.contains_key(&key) {
            return Err(StorageError::InsertFailed {
                reason: format!("approval {} already exists", approval.data.approval_id),
            }
            .into());
        }
        approvals.insert(key, approval.clone());
        Ok(())
    }

    async fn get_approval(&self, approval_id: ApprovalId) -> VerdictResult<Option<StoredApproval>> {
        let approvals = read_guard(&self.approvals)?;
        Ok(approvals.get(&approval_id.as_uuid()).cloned())
    }

    async fn list_approvals(
        &self,
        status: Option<ApprovalStatus>,
        limit: usize,
    ) -> VerdictResult<Vec<StoredApproval>> {
        let approvals = read_guard(&self.approvals)?;
        let mut matching: Vec<StoredApproval> = approvals
            .values()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.data.created_at.cmp(&a.data.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn approval_counts(&self) -> VerdictResult<ApprovalCounts> {
        let approvals = read_guard(&self.approvals)?;
        Ok(ApprovalCounts::from_statuses(
            approvals.values().map(|a| a.status),
        ))
    }

    async fn list_pending_for(
        &self,
        user: &str,
        limit: usize,
    ) -> VerdictResult<Vec<StoredApproval>> {
        let approvals = read_guard(&self.approvals)?;
        let mut matching: Vec<StoredApproval> = approvals
            .values()
            .filter(|a| a.status == ApprovalStatus::Pending)
            .filter(|a| {
                a.data
                    .requested_of
                    .as_deref()
                    .map_or(true, |reviewer| reviewer == user)
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.data.created_at.cmp(&a.data.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn decide_approval(
        &self,
        approval_id: ApprovalId,
        decision: ApprovalDecision,
        decided_at: Timestamp,
    ) -> VerdictResult<StoredApproval> {
        let mut approvals = write_guard(&self.approvals)?;
        let entry = approvals
            .get_mut(&approval_id.as_uuid())
            .ok_or(StorageError::ApprovalNotFound {
                id: approval_id.as_uuid(),
            })?;

        // CAS: the typed conversion fails unless the row is still pending.
        let pending = entry.clone().into_pending().map_err(stale)?;
        let updated = match decision {
            ApprovalDecision::Approve { approved_by } => StoredApproval {
                data: pending.approve(approved_by, decided_at).into_data(),
                status: ApprovalStatus::Approved,
            },
            ApprovalDecision::Deny { denied_by, reason } => StoredApproval {
                data: pending.deny(denied_by, reason, decided_at).into_data(),
                status: ApprovalStatus::Denied,
            },
        };
        *entry = updated.clone();
        Ok(updated)
    }

    async fn record_execution(
        &self,
        approval_id: ApprovalId,
        outcome: ExecutionOutcome,
        now: Timestamp,
    ) -> VerdictResult<StoredApproval> {
        let mut approvals = write_guard(&self.approvals)?;
        let entry = approvals
            .get_mut(&approval_id.as_uuid())
            .ok_or(StorageError::ApprovalNotFound {
                id: approval_id.as_uuid(),
            })?;

        let approved = entry.clone().into_approved().map_err(stale)?;
        let updated = match outcome {
            ExecutionOutcome::Succeeded => StoredApproval {
                data: approved.mark_executed(now).into_data(),
                status: ApprovalStatus::Executed,
            },
            ExecutionOutcome::Failed { reason } => StoredApproval {
                data: approved.mark_failed(reason).into_data(),
                status: ApprovalStatus::Failed,
            },
        };
        *entry = updated.clone();
        Ok(updated)
    }
}

// ============================================================================
// SESSION STORE
// ============================================================================

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn insert_session(&self, session: &SessionData) -> VerdictResult<()> {
        let mut sessions = write_guard(&self.sessions)?;
        let key = session.session_id.as_uuid();
        if sessions.contains_key(&key) {
            return Err(StorageError::InsertFailed {
                reason: format!("session {} already exists", session.session_id),
            }
            .into());
        }
        sessions.insert(key, session.clone());
        Ok(())
    }

    async fn get_session(&self, session_id: SessionId) -> VerdictResult<Option<SessionData>> {
        let sessions = read_guard(&self.sessions)?;
        Ok(sessions.get(&session_id.as_uuid()).cloned())
    }

    async fn update_session(&self, session: &SessionData) -> VerdictResult<()> {
        let mut sessions = write_guard(&self.sessions)?;
        let key = session.session_id.as_uuid();
        let entry = sessions
            .get_mut(&key)
            .ok_or(StorageError::SessionNotFound { id: key })?;
        if entry.status.is_terminal() {
            return Err(StorageError::SessionTerminal {
                id: key,
                status: entry.status,
            }
            .into());
        }
        *entry = session.clone();
        Ok(())
    }

    async fn list_active_sessions(&self) -> VerdictResult<Vec<SessionData>> {
        let sessions = read_guard(&self.sessions)?;
        let mut active: Vec<SessionData> = sessions
            .values()
            .filter(|s| !s.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(active)
    }

    async fn list_recent_sessions(&self, limit: usize) -> VerdictResult<Vec<SessionData>> {
        let sessions = read_guard(&self.sessions)?;
        let mut recent: Vec<SessionData> = sessions.values().cloned().collect();
        recent.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        recent.truncate(limit);
        Ok(recent)
    }

    async fn list_sessions_started_since(
        &self,
        since: Timestamp,
    ) -> VerdictResult<Vec<SessionData>> {
        let sessions = read_guard(&self.sessions)?;
        let mut matching: Vec<SessionData> = sessions
            .values()
            .filter(|s| s.started_at >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(matching)
    }
}

// ============================================================================
// WORK ITEM STORE
// ============================================================================

#[async_trait]
impl WorkItemStore for InMemoryStore {
    async fn insert_work_item(&self, item: &WorkItem) -> VerdictResult<()> {
        let mut items = write_guard(&self.work_items)?;
        items.push(item.clone());
        Ok(())
    }

    async fn insert_review_request(&self, request: &ReviewRequest) -> VerdictResult<()> {
        let mut requests = write_guard(&self.review_requests)?;
        requests.push(request.clone());
        Ok(())
    }

    async fn list_assigned_work_items(
        &self,
        user: &str,
        kind: WorkItemKind,
        limit: usize,
    ) -> VerdictResult<Vec<WorkItem>> {
        let items = read_guard(&self.work_items)?;
        let mut matching: Vec<WorkItem> = items
            .iter()
            .filter(|item| item.kind == kind && !item.status.is_closed())
            .filter(|item| item.assignee.as_deref() == Some(user))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn list_review_requests_for(
        &self,
        user: &str,
        limit: usize,
    ) -> VerdictResult<Vec<ReviewRequest>> {
        let requests = read_guard(&self.review_requests)?;
        let mut matching: Vec<ReviewRequest> = requests
            .iter()
            .filter(|r| r.status == ReviewStatus::Open && r.reviewer == user)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

// ============================================================================
// ENTITY STORE
// ============================================================================

/// Entity kind an action type is allowed to target. `None` means any kind.
fn applicable_kind(action_type: ActionType) -> Option<EntityKind> {
    match action_type {
        ActionType::UpdateIssue | ActionType::CloseIssue => Some(EntityKind::Issue),
        ActionType::UpdateMilestone => Some(EntityKind::Milestone),
        ActionType::UpdateInitiative => Some(EntityKind::Initiative),
        ActionType::CreateNote | ActionType::SendMessage => None,
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn entity_exists(&self, entity: &EntityRef) -> VerdictResult<bool> {
        let entities = read_guard(&self.entities)?;
        Ok(entities.contains_key(&(entity.kind, entity.id)))
    }

    async fn apply_action(
        &self,
        entity: &EntityRef,
        action_type: ActionType,
        params: &serde_json::Value,
    ) -> VerdictResult<()> {
        if let Some(kind) = applicable_kind(action_type) {
            if entity.kind != kind {
                return Err(StorageError::ActionFailed {
                    kind: entity.kind,
                    id: entity.id,
                    reason: format!("action {} does not apply to a {}", action_type, entity.kind),
                }
                .into());
            }
        }

        let mut entities = write_guard(&self.entities)?;
        let doc = entities
            .get_mut(&(entity.kind, entity.id))
            .ok_or(StorageError::EntityNotFound {
                kind: entity.kind,
                id: entity.id,
            })?;
        let fields = doc
            .as_object_mut()
            .ok_or_else(|| StorageError::ActionFailed {
                kind: entity.kind,
                id: entity.id,
                reason: "stored entity document is not an object".to_string(),
            })?;

        match action_type {
            ActionType::UpdateIssue | ActionType::UpdateMilestone | ActionType::UpdateInitiative => {
                let updates = params.as_object().ok_or_else(|| StorageError::ActionFailed {
                    kind: entity.kind,
                    id: entity.id,
                    reason: "update params must be an object".to_string(),
                })?;
                for (key, value) in updates {
                    fields.insert(key.clone(), value.clone());
                }
            }
            ActionType::CloseIssue => {
                fields.insert("status".to_string(), serde_json::json!("closed"));
            }
            ActionType::CreateNote => {
                append_to(fields, "notes", params.clone());
            }
            ActionType::SendMessage => {
                append_to(fields, "messages", params.clone());
            }
        }
        Ok(())
    }
}

/// Push onto a JSON array field, creating it if absent. A non-array value
/// under the key is replaced.
fn append_to(
    fields: &mut serde_json::Map<String, serde_json::Value>,
    key: &str,
    value: serde_json::Value,
) {
    match fields.get_mut(key).and_then(|v| v.as_array_mut()) {
        Some(array) => array.push(value),
        None => {
            fields.insert(key.to_string(), serde_json::Value::Array(vec![value]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use verdict_core::{ApprovalData, EntityKind, ModelRates, RiskLevel, SessionStatus, TokenDelta};

    fn pending_approval(requested_of: Option<&str>) -> StoredApproval {
        let entity = EntityRef::new(EntityKind::Issue, Uuid::now_v7()).with_title("Login bug");
        StoredApproval {
            data: ApprovalData {
                approval_id: ApprovalId::now_v7(),
                action_type: ActionType::UpdateIssue,
                description: "Raise priority".to_string(),
                params: serde_json::json!({ "priority": "high" }),
                entity,
                risk_level: RiskLevel::Low,
                ai_reasoning: None,
                requested_by: "triage-agent".to_string(),
                requested_of: requested_of.map(str::to_string),
                decided_by: None,
                denial_reason: None,
                failure_reason: None,
                created_at: Utc::now(),
                decided_at: None,
                executed_at: None,
            },
            status: ApprovalStatus::Pending,
        }
    }

    fn work_item(assignee: &str, kind: WorkItemKind, status: verdict_core::WorkItemStatus) -> WorkItem {
        WorkItem {
            id: Uuid::now_v7(),
            kind,
            title: "item".to_string(),
            assignee: Some(assignee.to_string()),
            status,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_approval_insert_and_get() {
        let store = InMemoryStore::new();
        let approval = pending_approval(None);
        let id = approval.data.approval_id;

        store.insert_approval(&approval).await.unwrap();
        let fetched = store.get_approval(id).await.unwrap().unwrap();
        assert_eq!(fetched, approval);

        // Duplicate insert is rejected.
        let err = store.insert_approval(&approval).await.unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::InsertFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_decide_approve_then_deny_conflicts() {
        let store = InMemoryStore::new();
        let approval = pending_approval(None);
        let id = approval.data.approval_id;
        store.insert_approval(&approval).await.unwrap();

        let now = Utc::now();
        let approved = store
            .decide_approval(
                id,
                ApprovalDecision::Approve {
                    approved_by: "alice".to_string(),
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(approved.status, ApprovalStatus::Approved);
        assert_eq!(approved.data.decided_by.as_deref(), Some("alice"));
        assert_eq!(approved.data.decided_at, Some(now));

        // Second writer loses: the row already left pending.
        let err = store
            .decide_approval(
                id,
                ApprovalDecision::Deny {
                    denied_by: "bob".to_string(),
                    reason: "no".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::StaleApprovalStatus {
                expected: ApprovalStatus::Pending,
                actual: ApprovalStatus::Approved,
                ..
            })
        ));

        // The losing write mutated nothing.
        let fetched = store.get_approval(id).await.unwrap().unwrap();
        assert_eq!(fetched.status, ApprovalStatus::Approved);
        assert_eq!(fetched.data.decided_by.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_decide_unknown_id() {
        let store = InMemoryStore::new();
        let err = store
            .decide_approval(
                ApprovalId::now_v7(),
                ApprovalDecision::Approve {
                    approved_by: "alice".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::ApprovalNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_record_execution_success_and_failure() {
        let store = InMemoryStore::new();
        let first = pending_approval(None);
        let second = pending_approval(None);
        store.insert_approval(&first).await.unwrap();
        store.insert_approval(&second).await.unwrap();

        let now = Utc::now();
        for approval in [&first, &second] {
            store
                .decide_approval(
                    approval.data.approval_id,
                    ApprovalDecision::Approve {
                        approved_by: "alice".to_string(),
                    },
                    now,
                )
                .await
                .unwrap();
        }

        let executed = store
            .record_execution(first.data.approval_id, ExecutionOutcome::Succeeded, now)
            .await
            .unwrap();
        assert_eq!(executed.status, ApprovalStatus::Executed);
        assert_eq!(executed.data.executed_at, Some(now));

        let failed = store
            .record_execution(
                second.data.approval_id,
                ExecutionOutcome::Failed {
                    reason: "entity store rejected update".to_string(),
                },
                now,
            )
            .await
            .unwrap();
        assert_eq!(failed.status, ApprovalStatus::Failed);
        assert_eq!(
            failed.data.failure_reason.as_deref(),
            Some("entity store rejected update")
        );
        assert!(failed.data.executed_at.is_none());

        // Executed is terminal; a second outcome is stale.
        let err = store
            .record_execution(first.data.approval_id, ExecutionOutcome::Succeeded, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::StaleApprovalStatus { .. })
        ));
    }

    #[tokio::test]
    async fn test_counts_track_statuses() {
        let store = InMemoryStore::new();
        let kept_pending = pending_approval(None);
        let denied = pending_approval(None);
        store.insert_approval(&kept_pending).await.unwrap();
        store.insert_approval(&denied).await.unwrap();
        store
            .decide_approval(
                denied.data.approval_id,
                ApprovalDecision::Deny {
                    denied_by: "bob".to_string(),
                    reason: "too risky".to_string(),
                },
                Utc::now(),
            )
            .await
            .unwrap();

        let counts = store.approval_counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.denied, 1);
        assert_eq!(counts.total, 2);
    }

    #[tokio::test]
    async fn test_pending_for_honors_reviewer_scope() {
        let store = InMemoryStore::new();
        store
            .insert_approval(&pending_approval(Some("carol")))
            .await
            .unwrap();
        store
            .insert_approval(&pending_approval(Some("dave")))
            .await
            .unwrap();
        store.insert_approval(&pending_approval(None)).await.unwrap();

        // Carol sees her own plus the unscoped one.
        let for_carol = store.list_pending_for("carol", 50).await.unwrap();
        assert_eq!(for_carol.len(), 2);

        let for_erin = store.list_pending_for("erin", 50).await.unwrap();
        assert_eq!(for_erin.len(), 1);
    }

    #[tokio::test]
    async fn test_list_approvals_newest_first() {
        let store = InMemoryStore::new();
        let mut older = pending_approval(None);
        older.data.created_at = Utc::now() - Duration::minutes(5);
        let newer = pending_approval(None);
        store.insert_approval(&older).await.unwrap();
        store.insert_approval(&newer).await.unwrap();

        let listed = store
            .list_approvals(Some(ApprovalStatus::Pending), 10)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].data.approval_id, newer.data.approval_id);

        let limited = store.list_approvals(None, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_session_update_rejected_after_terminal() {
        let store = InMemoryStore::new();
        let rates = ModelRates::default();
        let entity = EntityRef::new(EntityKind::Issue, Uuid::now_v7());
        let mut session = SessionData::start(entity, Utc::now());
        store.insert_session(&session).await.unwrap();

        session
            .transition(
                SessionStatus::Processing,
                TokenDelta::default(),
                &rates,
                Utc::now(),
            )
            .unwrap();
        store.update_session(&session).await.unwrap();

        session.complete(&rates, Utc::now()).unwrap();
        store.update_session(&session).await.unwrap();

        // The stored row is terminal now; further writes bounce.
        let err = store.update_session(&session).await.unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::SessionTerminal { .. })
        ));
    }

    #[tokio::test]
    async fn test_session_listings() {
        let store = InMemoryStore::new();
        let rates = ModelRates::default();
        let start = Utc::now() - Duration::minutes(10);

        let mut finished =
            SessionData::start(EntityRef::new(EntityKind::Issue, Uuid::now_v7()), start);
        finished
            .transition(SessionStatus::Processing, TokenDelta::default(), &rates, start)
            .unwrap();
        finished.complete(&rates, Utc::now()).unwrap();

        let running = SessionData::start(
            EntityRef::new(EntityKind::Project, Uuid::now_v7()),
            Utc::now(),
        );

        store.insert_session(&finished).await.unwrap();
        store.insert_session(&running).await.unwrap();

        let active = store.list_active_sessions().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].session_id, running.session_id);

        let recent = store.list_recent_sessions(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].session_id, running.session_id);

        let windowed = store
            .list_sessions_started_since(Utc::now() - Duration::minutes(5))
            .await
            .unwrap();
        assert_eq!(windowed.len(), 1);
        assert_eq!(windowed[0].session_id, running.session_id);
    }

    #[tokio::test]
    async fn test_work_item_filters() {
        use verdict_core::WorkItemStatus;

        let store = InMemoryStore::new();
        store
            .insert_work_item(&work_item("carol", WorkItemKind::Issue, WorkItemStatus::Open))
            .await
            .unwrap();
        store
            .insert_work_item(&work_item(
                "carol",
                WorkItemKind::Issue,
                WorkItemStatus::Closed,
            ))
            .await
            .unwrap();
        store
            .insert_work_item(&work_item(
                "carol",
                WorkItemKind::Milestone,
                WorkItemStatus::InProgress,
            ))
            .await
            .unwrap();
        store
            .insert_work_item(&work_item("dave", WorkItemKind::Issue, WorkItemStatus::Open))
            .await
            .unwrap();

        let issues = store
            .list_assigned_work_items("carol", WorkItemKind::Issue, 50)
            .await
            .unwrap();
        assert_eq!(issues.len(), 1);

        let milestones = store
            .list_assigned_work_items("carol", WorkItemKind::Milestone, 50)
            .await
            .unwrap();
        assert_eq!(milestones.len(), 1);
    }

    #[tokio::test]
    async fn test_review_request_filters() {
        let store = InMemoryStore::new();
        let open = ReviewRequest {
            id: Uuid::now_v7(),
            subject: "Resume draft".to_string(),
            requested_by: "resume-agent".to_string(),
            reviewer: "carol".to_string(),
            target: None,
            status: ReviewStatus::Open,
            created_at: Utc::now(),
        };
        let mut done = open.clone();
        done.id = Uuid::now_v7();
        done.status = ReviewStatus::Done;
        store.insert_review_request(&open).await.unwrap();
        store.insert_review_request(&done).await.unwrap();

        let for_carol = store.list_review_requests_for("carol", 50).await.unwrap();
        assert_eq!(for_carol.len(), 1);
        assert_eq!(for_carol[0].id, open.id);
    }

    #[tokio::test]
    async fn test_apply_action_updates_entity() {
        let store = InMemoryStore::new();
        let entity = EntityRef::new(EntityKind::Issue, Uuid::now_v7());
        store
            .put_entity(&entity, serde_json::json!({ "title": "Login bug", "priority": "low" }))
            .unwrap();

        store
            .apply_action(
                &entity,
                ActionType::UpdateIssue,
                &serde_json::json!({ "priority": "high" }),
            )
            .await
            .unwrap();
        let doc = store.get_entity(&entity).unwrap().unwrap();
        assert_eq!(doc["priority"], "high");
        assert_eq!(doc["title"], "Login bug");

        store
            .apply_action(&entity, ActionType::CloseIssue, &serde_json::json!({}))
            .await
            .unwrap();
        let doc = store.get_entity(&entity).unwrap().unwrap();
        assert_eq!(doc["status"], "closed");
    }

    #[tokio::test]
    async fn test_apply_action_appends_notes() {
        let store = InMemoryStore::new();
        let entity = EntityRef::new(EntityKind::Project, Uuid::now_v7());
        store.put_entity(&entity, serde_json::json!({})).unwrap();

        store
            .apply_action(
                &entity,
                ActionType::CreateNote,
                &serde_json::json!({ "body": "first" }),
            )
            .await
            .unwrap();
        store
            .apply_action(
                &entity,
                ActionType::CreateNote,
                &serde_json::json!({ "body": "second" }),
            )
            .await
            .unwrap();

        let doc = store.get_entity(&entity).unwrap().unwrap();
        assert_eq!(doc["notes"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_apply_action_kind_mismatch() {
        let store = InMemoryStore::new();
        let entity = EntityRef::new(EntityKind::Project, Uuid::now_v7());
        store.put_entity(&entity, serde_json::json!({})).unwrap();

        let err = store
            .apply_action(&entity, ActionType::CloseIssue, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::ActionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_apply_action_missing_entity() {
        let store = InMemoryStore::new();
        let entity = EntityRef::new(EntityKind::Issue, Uuid::now_v7());

        assert!(!store.entity_exists(&entity).await.unwrap());
        let err = store
            .apply_action(&entity, ActionType::UpdateIssue, &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            VerdictError::Storage(StorageError::EntityNotFound { .. })
        ));
    }
}
