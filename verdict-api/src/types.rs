//! Request/Response Types for the VERDICT API
//!
//! Wire DTOs for approvals, agent sessions, and the personal queue. These
//! are the JSON shapes served over REST and embedded in WebSocket events;
//! conversions from the domain records live here too.

use serde::{Deserialize, Serialize};
use verdict_core::{
    ActionType, ApprovalCounts, ApprovalData, ApprovalId, ApprovalStatus, EntityId, EntityKind,
    EntityRef, ReviewRequest, RiskLevel, SessionData, SessionId, SessionStatus, StoredApproval,
    Timestamp, TokenDelta, WorkItem,
};

// ============================================================================
// APPROVAL TYPES
// ============================================================================

/// Request to create an action approval.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateApprovalRequest {
    pub action_type: ActionType,
    /// Human-readable description of what the action will do.
    pub description: String,
    /// Action parameters; shape is per action type.
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub params: serde_json::Value,
    pub entity_type: EntityKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub entity_title: Option<String>,
    pub risk_level: RiskLevel,
    pub ai_reasoning: Option<String>,
    /// Agent/subsystem proposing the action.
    pub requested_by: String,
    /// Reviewer the decision is requested of; omit to surface in every queue.
    pub requested_of: Option<String>,
}

/// Request to approve a pending action.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApproveRequest {
    pub approved_by: String,
    /// Execute the action against its target entity in the same call.
    #[serde(default)]
    pub execute_immediately: bool,
}

/// Request to deny a pending action.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DenyRequest {
    pub denied_by: String,
    pub denial_reason: String,
}

/// An action approval as served over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApprovalResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: ApprovalId,
    pub action_type: ActionType,
    pub description: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub params: serde_json::Value,
    pub entity_type: EntityKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub entity_title: Option<String>,
    pub risk_level: RiskLevel,
    pub ai_reasoning: Option<String>,
    pub status: ApprovalStatus,
    pub requested_by: String,
    pub requested_of: Option<String>,
    pub decided_by: Option<String>,
    pub denial_reason: Option<String>,
    pub failure_reason: Option<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub decided_at: Option<Timestamp>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub executed_at: Option<Timestamp>,
}

impl From<StoredApproval> for ApprovalResponse {
    fn from(stored: StoredApproval) -> Self {
        let status = stored.status;
        let ApprovalData {
            approval_id,
            action_type,
            description,
            params,
            entity,
            risk_level,
            ai_reasoning,
            requested_by,
            requested_of,
            decided_by,
            denial_reason,
            failure_reason,
            created_at,
            decided_at,
            executed_at,
        } = stored.data;
        Self {
            id: approval_id,
            action_type,
            description,
            params,
            entity_type: entity.kind,
            entity_id: entity.id,
            entity_title: entity.title,
            risk_level,
            ai_reasoning,
            status,
            requested_by,
            requested_of,
            decided_by,
            denial_reason,
            failure_reason,
            created_at,
            decided_at,
            executed_at,
        }
    }
}

/// Approval list with per-status counts over the whole table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApprovalListResponse {
    pub approvals: Vec<ApprovalResponse>,
    pub pending_count: u64,
    pub approved_count: u64,
    pub denied_count: u64,
    pub executed_count: u64,
    pub failed_count: u64,
    pub total: u64,
}

impl ApprovalListResponse {
    pub fn new(approvals: Vec<StoredApproval>, counts: ApprovalCounts) -> Self {
        Self {
            approvals: approvals.into_iter().map(ApprovalResponse::from).collect(),
            pending_count: counts.pending,
            approved_count: counts.approved,
            denied_count: counts.denied,
            executed_count: counts.executed,
            failed_count: counts.failed,
            total: counts.total,
        }
    }
}

// ============================================================================
// SESSION TYPES
// ============================================================================

/// Request to start an agent session against an entity.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StartSessionRequest {
    pub entity_type: EntityKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub entity_title: Option<String>,
}

/// Status update reported by a running agent process.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateSessionStatusRequest {
    pub status: SessionStatus,
    /// Token counter increments since the last report.
    #[serde(default)]
    pub delta_tokens: TokenDelta,
    /// Error text to record alongside a transition into `error`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Request to close a session with an error.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FailSessionRequest {
    pub error: String,
}

/// Request to record a comment on a session's activity feed.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateCommentRequest {
    pub body: String,
    pub author: Option<String>,
}

/// An agent session as served over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub session_id: SessionId,
    pub entity_type: EntityKind,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub entity_id: EntityId,
    pub entity_title: Option<String>,
    pub status: SessionStatus,
    pub error: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_usd: f64,
    pub duration_seconds: f64,
    pub comment_count: u32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub started_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub completed_at: Option<Timestamp>,
}

impl From<SessionData> for SessionResponse {
    fn from(session: SessionData) -> Self {
        let SessionData {
            session_id,
            entity,
            status,
            error,
            input_tokens,
            output_tokens,
            cost_usd,
            duration_seconds,
            comment_count,
            started_at,
            updated_at,
            completed_at,
        } = session;
        Self {
            session_id,
            entity_type: entity.kind,
            entity_id: entity.id,
            entity_title: entity.title,
            status,
            error,
            input_tokens,
            output_tokens,
            cost_usd,
            duration_seconds,
            comment_count,
            started_at,
            updated_at,
            completed_at,
        }
    }
}

/// Sessions not yet terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ActiveSessionsResponse {
    pub active_sessions: Vec<SessionResponse>,
}

/// Most recent sessions, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RecentSessionsResponse {
    pub recent_sessions: Vec<SessionResponse>,
}

/// Aggregate stats over active and recently started sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionStatsResponse {
    pub active_count: u64,
    /// Sessions started inside the configured stats window.
    pub recent_count: u64,
    /// Total cost over sessions in the window.
    pub total_cost_usd: f64,
    /// Mean duration over terminal sessions in the window.
    pub avg_duration_seconds: f64,
}

// ============================================================================
// MY QUEUE TYPES
// ============================================================================

/// Per-category lengths of the queue, plus their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MyQueueCounts {
    pub action_approvals: u64,
    pub assigned_issues: u64,
    pub assigned_initiatives: u64,
    pub assigned_milestones: u64,
    pub review_requests: u64,
    pub total: u64,
}

/// Everything requiring one user's attention, merged across components.
///
/// Categories are not interleaved; each keeps its own created_at-descending
/// order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MyQueueResponse {
    pub action_approvals: Vec<ApprovalResponse>,
    pub assigned_issues: Vec<WorkItem>,
    pub assigned_initiatives: Vec<WorkItem>,
    pub assigned_milestones: Vec<WorkItem>,
    pub review_requests: Vec<ReviewRequest>,
    pub counts: MyQueueCounts,
}

impl MyQueueResponse {
    /// Assemble the response, deriving counts from the category lengths.
    pub fn new(
        action_approvals: Vec<StoredApproval>,
        assigned_issues: Vec<WorkItem>,
        assigned_initiatives: Vec<WorkItem>,
        assigned_milestones: Vec<WorkItem>,
        review_requests: Vec<ReviewRequest>,
    ) -> Self {
        let action_approvals: Vec<ApprovalResponse> = action_approvals
            .into_iter()
            .map(ApprovalResponse::from)
            .collect();
        let counts = MyQueueCounts {
            action_approvals: action_approvals.len() as u64,
            assigned_issues: assigned_issues.len() as u64,
            assigned_initiatives: assigned_initiatives.len() as u64,
            assigned_milestones: assigned_milestones.len() as u64,
            review_requests: review_requests.len() as u64,
            total: (action_approvals.len()
                + assigned_issues.len()
                + assigned_initiatives.len()
                + assigned_milestones.len()
                + review_requests.len()) as u64,
        };
        Self {
            action_approvals,
            assigned_issues,
            assigned_initiatives,
            assigned_milestones,
            review_requests,
            counts,
        }
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Build the weak entity reference carried by approvals and sessions.
pub(crate) fn entity_ref_from_parts(
    kind: EntityKind,
    id: EntityId,
    title: Option<String>,
) -> EntityRef {
    let entity = EntityRef::new(kind, id);
    match title {
        Some(title) => entity.with_title(title),
        None => entity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_stored(status: ApprovalStatus) -> StoredApproval {
        StoredApproval {
            data: ApprovalData {
                approval_id: ApprovalId::now_v7(),
                action_type: ActionType::CloseIssue,
                description: "Close stale issue".to_string(),
                params: serde_json::json!({}),
                entity: EntityRef::new(EntityKind::Issue, Uuid::now_v7()).with_title("Stale"),
                risk_level: RiskLevel::Medium,
                ai_reasoning: None,
                requested_by: "janitor-agent".to_string(),
                requested_of: Some("carol".to_string()),
                decided_by: None,
                denial_reason: None,
                failure_reason: None,
                created_at: Utc::now(),
                decided_at: None,
                executed_at: None,
            },
            status,
        }
    }

    #[test]
    fn test_approval_response_from_stored() {
        let stored = sample_stored(ApprovalStatus::Pending);
        let id = stored.data.approval_id;
        let response = ApprovalResponse::from(stored);
        assert_eq!(response.id, id);
        assert_eq!(response.status, ApprovalStatus::Pending);
        assert_eq!(response.entity_type, EntityKind::Issue);
        assert_eq!(response.entity_title.as_deref(), Some("Stale"));
    }

    #[test]
    fn test_list_response_counts_passthrough() {
        let counts = ApprovalCounts::from_statuses([
            ApprovalStatus::Pending,
            ApprovalStatus::Executed,
            ApprovalStatus::Failed,
        ]);
        let response = ApprovalListResponse::new(vec![sample_stored(ApprovalStatus::Pending)], counts);
        assert_eq!(response.approvals.len(), 1);
        assert_eq!(response.pending_count, 1);
        assert_eq!(response.executed_count, 1);
        assert_eq!(response.failed_count, 1);
        assert_eq!(response.total, 3);
    }

    #[test]
    fn test_my_queue_counts_sum() {
        let response = MyQueueResponse::new(
            vec![sample_stored(ApprovalStatus::Pending)],
            vec![],
            vec![],
            vec![],
            vec![],
        );
        assert_eq!(response.counts.action_approvals, 1);
        assert_eq!(response.counts.total, 1);
    }

    #[test]
    fn test_update_status_request_defaults() {
        let req: UpdateSessionStatusRequest =
            serde_json::from_str(r#"{ "status": "processing" }"#).unwrap();
        assert_eq!(req.status, SessionStatus::Processing);
        assert_eq!(req.delta_tokens, TokenDelta::default());
        assert_eq!(req.error, None);
    }
}
