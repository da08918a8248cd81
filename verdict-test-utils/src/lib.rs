//! VERDICT Test Utilities
//!
//! Centralized test infrastructure for the VERDICT workspace:
//! - Fixture builders for approvals, sessions, and queue inputs
//! - A failing entity store for exercising the post-approval failure path
//! - Proptest generators for the domain types

// Re-export the in-memory backend for convenience
pub use verdict_storage::InMemoryStore;

// Re-export core types for convenience
pub use verdict_core::{
    ActionType, ApprovalData, ApprovalId, ApprovalStatus, EntityKind, EntityRef, ModelRates,
    ReviewRequest, ReviewStatus, RiskLevel, SessionData, SessionId, SessionStatus, StoredApproval,
    Timestamp, TokenDelta, VerdictError, VerdictResult, WorkItem, WorkItemKind, WorkItemStatus,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;
use verdict_storage::EntityStore;

// ============================================================================
// FIXTURE BUILDERS
// ============================================================================

/// Builder for approval fixtures.
///
/// Defaults to a pending, low-risk issue update proposed by `test-agent`
/// with no designated reviewer.
#[derive(Debug, Clone)]
pub struct ApprovalFixture {
    action_type: ActionType,
    description: String,
    params: serde_json::Value,
    entity: EntityRef,
    risk_level: RiskLevel,
    requested_by: String,
    requested_of: Option<String>,
    status: ApprovalStatus,
    created_at: Timestamp,
}

impl Default for ApprovalFixture {
    fn default() -> Self {
        Self {
            action_type: ActionType::UpdateIssue,
            description: "Update issue title".to_string(),
            params: serde_json::json!({"title": "clearer title"}),
            entity: EntityRef::new(EntityKind::Issue, Uuid::now_v7()),
            risk_level: RiskLevel::Low,
            requested_by: "test-agent".to_string(),
            requested_of: None,
            status: ApprovalStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

impl ApprovalFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action_type(mut self, action_type: ActionType) -> Self {
        self.action_type = action_type;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.params = params;
        self
    }

    pub fn entity(mut self, entity: EntityRef) -> Self {
        self.entity = entity;
        self
    }

    pub fn risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    pub fn requested_by(mut self, requested_by: impl Into<String>) -> Self {
        self.requested_by = requested_by.into();
        self
    }

    pub fn requested_of(mut self, requested_of: impl Into<String>) -> Self {
        self.requested_of = Some(requested_of.into());
        self
    }

    pub fn status(mut self, status: ApprovalStatus) -> Self {
        self.status = status;
        self
    }

    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn build(self) -> StoredApproval {
        StoredApproval {
            data: ApprovalData {
                approval_id: ApprovalId::now_v7(),
                action_type: self.action_type,
                description: self.description,
                params: self.params,
                entity: self.entity,
                risk_level: self.risk_level,
                ai_reasoning: None,
                requested_by: self.requested_by,
                requested_of: self.requested_of,
                decided_by: None,
                denial_reason: None,
                failure_reason: None,
                created_at: self.created_at,
                decided_at: None,
                executed_at: None,
            },
            status: self.status,
        }
    }
}

/// A session fixture in the Starting state against a fresh issue.
pub fn starting_session() -> SessionData {
    SessionData::start(
        EntityRef::new(EntityKind::Issue, Uuid::now_v7()).with_title("Fixture issue"),
        Utc::now(),
    )
}

/// A work item fixture, open and assigned to `assignee`.
pub fn assigned_work_item(kind: WorkItemKind, assignee: &str) -> WorkItem {
    WorkItem {
        id: Uuid::now_v7(),
        kind,
        title: format!("{} for {}", kind, assignee),
        assignee: Some(assignee.to_string()),
        status: WorkItemStatus::Open,
        created_at: Utc::now(),
    }
}

/// An open review request fixture for `reviewer`.
pub fn open_review_request(reviewer: &str) -> ReviewRequest {
    ReviewRequest {
        id: Uuid::now_v7(),
        subject: format!("Review requested of {}", reviewer),
        requested_by: "test-agent".to_string(),
        reviewer: reviewer.to_string(),
        target: None,
        status: ReviewStatus::Open,
        created_at: Utc::now(),
    }
}

// ============================================================================
// FAILING ENTITY STORE
// ============================================================================

/// Entity store whose mutations always fail.
///
/// Lets tests drive an approved action into the `failed` terminal state
/// without depending on a particular downstream error.
#[derive(Debug, Clone)]
pub struct FailingEntityStore {
    reason: String,
}

impl FailingEntityStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Default for FailingEntityStore {
    fn default() -> Self {
        Self::new("entity backend unavailable")
    }
}

#[async_trait]
impl EntityStore for FailingEntityStore {
    async fn entity_exists(&self, _entity: &EntityRef) -> VerdictResult<bool> {
        // Entities "exist" so approvals can be created against them.
        Ok(true)
    }

    async fn apply_action(
        &self,
        entity: &EntityRef,
        _action_type: ActionType,
        _params: &serde_json::Value,
    ) -> VerdictResult<()> {
        Err(verdict_core::StorageError::ActionFailed {
            kind: entity.kind,
            id: entity.id,
            reason: self.reason.clone(),
        }
        .into())
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<u128>().prop_map(Uuid::from_u128)
    }

    pub fn arb_approval_id() -> impl Strategy<Value = ApprovalId> {
        arb_uuid().prop_map(ApprovalId::new)
    }

    pub fn arb_session_id() -> impl Strategy<Value = SessionId> {
        arb_uuid().prop_map(SessionId::new)
    }

    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // 2020-01-01 through ~2033
        (1_577_836_800i64..2_000_000_000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
        })
    }

    pub fn arb_action_type() -> impl Strategy<Value = ActionType> {
        prop_oneof![
            Just(ActionType::UpdateIssue),
            Just(ActionType::CloseIssue),
            Just(ActionType::UpdateMilestone),
            Just(ActionType::UpdateInitiative),
            Just(ActionType::CreateNote),
            Just(ActionType::SendMessage),
        ]
    }

    pub fn arb_risk_level() -> impl Strategy<Value = RiskLevel> {
        prop_oneof![
            Just(RiskLevel::Safe),
            Just(RiskLevel::Low),
            Just(RiskLevel::Medium),
            Just(RiskLevel::High),
            Just(RiskLevel::Critical),
        ]
    }

    pub fn arb_approval_status() -> impl Strategy<Value = ApprovalStatus> {
        prop_oneof![
            Just(ApprovalStatus::Pending),
            Just(ApprovalStatus::Approved),
            Just(ApprovalStatus::Denied),
            Just(ApprovalStatus::Executed),
            Just(ApprovalStatus::Failed),
        ]
    }

    pub fn arb_session_status() -> impl Strategy<Value = SessionStatus> {
        prop_oneof![
            Just(SessionStatus::Idle),
            Just(SessionStatus::Starting),
            Just(SessionStatus::Processing),
            Just(SessionStatus::Typing),
            Just(SessionStatus::Completed),
            Just(SessionStatus::Error),
        ]
    }

    pub fn arb_entity_kind() -> impl Strategy<Value = EntityKind> {
        prop_oneof![
            Just(EntityKind::Issue),
            Just(EntityKind::Initiative),
            Just(EntityKind::Milestone),
            Just(EntityKind::Project),
        ]
    }

    pub fn arb_entity_ref() -> impl Strategy<Value = EntityRef> {
        (arb_entity_kind(), arb_uuid(), proptest::option::of("[a-z ]{1,24}")).prop_map(
            |(kind, id, title)| {
                let entity = EntityRef::new(kind, id);
                match title {
                    Some(title) => entity.with_title(title),
                    None => entity,
                }
            },
        )
    }

    pub fn arb_token_delta() -> impl Strategy<Value = TokenDelta> {
        (0u64..100_000, 0u64..100_000).prop_map(|(input, output)| TokenDelta { input, output })
    }

    pub fn arb_pending_approval() -> impl Strategy<Value = StoredApproval> {
        (
            arb_action_type(),
            arb_risk_level(),
            arb_entity_ref(),
            "[a-z ]{1,40}",
            proptest::option::of("[a-z]{1,12}"),
            arb_timestamp(),
        )
            .prop_map(
                |(action_type, risk_level, entity, description, requested_of, created_at)| {
                    let mut fixture = ApprovalFixture::new()
                        .action_type(action_type)
                        .risk_level(risk_level)
                        .entity(entity)
                        .description(description)
                        .created_at(created_at);
                    if let Some(reviewer) = requested_of {
                        fixture = fixture.requested_of(reviewer);
                    }
                    fixture.build()
                },
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_defaults_are_pending() {
        let approval = ApprovalFixture::new().build();
        assert_eq!(approval.status, ApprovalStatus::Pending);
        assert!(approval.data.decided_by.is_none());
    }

    #[test]
    fn test_fixture_builder_overrides() {
        let approval = ApprovalFixture::new()
            .risk_level(RiskLevel::Critical)
            .requested_of("carol")
            .build();
        assert_eq!(approval.data.risk_level, RiskLevel::Critical);
        assert_eq!(approval.data.requested_of.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn test_failing_entity_store_fails_mutations() {
        let store = FailingEntityStore::default();
        let entity = EntityRef::new(EntityKind::Issue, Uuid::now_v7());
        assert!(store.entity_exists(&entity).await.unwrap());
        assert!(store
            .apply_action(&entity, ActionType::CloseIssue, &serde_json::json!({}))
            .await
            .is_err());
    }
}
