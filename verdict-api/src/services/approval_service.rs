//! Approval Queue Service
//!
//! Gates AI-proposed actions behind human review. Decisions are
//! compare-and-swap writes through [`ApprovalStore`], so concurrent
//! reviewers cannot both win; the loser gets a 409.
//!
//! Approve-and-execute is deliberately not atomic across the two stores:
//! the decision is recorded first, then the action is applied through the
//! injected [`EntityStore`]. A downstream failure moves the approval to
//! `failed` with the reason recorded, never back to pending.

use crate::error::{ApiError, ApiResult};
use crate::events::WsEvent;
use crate::types::{
    entity_ref_from_parts, ApproveRequest, CreateApprovalRequest, DenyRequest,
};
use crate::ws::WsState;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use verdict_core::{
    ApprovalCounts, ApprovalData, ApprovalId, ApprovalStatus, StoredApproval,
};
use verdict_storage::{ApprovalDecision, ApprovalStore, EntityStore, ExecutionOutcome};

/// Service for the action approval queue.
#[derive(Clone)]
pub struct ApprovalService {
    approvals: Arc<dyn ApprovalStore>,
    entities: Arc<dyn EntityStore>,
    ws: Arc<WsState>,
}

impl ApprovalService {
    pub fn new(
        approvals: Arc<dyn ApprovalStore>,
        entities: Arc<dyn EntityStore>,
        ws: Arc<WsState>,
    ) -> Self {
        Self {
            approvals,
            entities,
            ws,
        }
    }

    /// Queue a new action for human review.
    ///
    /// The target entity must exist; params must be a JSON object.
    pub async fn create(&self, request: CreateApprovalRequest) -> ApiResult<StoredApproval> {
        if request.description.trim().is_empty() {
            return Err(ApiError::missing_field("description"));
        }
        if request.requested_by.trim().is_empty() {
            return Err(ApiError::missing_field("requested_by"));
        }
        if !request.params.is_object() {
            return Err(ApiError::invalid_input("params must be a JSON object"));
        }

        let entity = entity_ref_from_parts(
            request.entity_type,
            request.entity_id,
            request.entity_title,
        );
        if !self.entities.entity_exists(&entity).await? {
            return Err(ApiError::entity_not_found(entity.kind, entity.id));
        }

        let stored = StoredApproval {
            data: ApprovalData {
                approval_id: ApprovalId::now_v7(),
                action_type: request.action_type,
                description: request.description,
                params: request.params,
                entity,
                risk_level: request.risk_level,
                ai_reasoning: request.ai_reasoning,
                requested_by: request.requested_by,
                requested_of: request.requested_of,
                decided_by: None,
                denial_reason: None,
                failure_reason: None,
                created_at: Utc::now(),
                decided_at: None,
                executed_at: None,
            },
            status: ApprovalStatus::Pending,
        };
        self.approvals.insert_approval(&stored).await?;

        info!(
            approval_id = %stored.data.approval_id,
            action_type = %stored.data.action_type,
            risk_level = %stored.data.risk_level,
            "Approval queued"
        );
        self.ws.broadcast(WsEvent::ApprovalCreated {
            approval: stored.clone().into(),
        });

        Ok(stored)
    }

    /// Fetch a single approval.
    pub async fn get(&self, approval_id: ApprovalId) -> ApiResult<StoredApproval> {
        self.approvals
            .get_approval(approval_id)
            .await?
            .ok_or_else(|| ApiError::approval_not_found(approval_id))
    }

    /// List approvals (optionally by status) together with the per-status
    /// tally over the whole table.
    pub async fn list(
        &self,
        status: Option<ApprovalStatus>,
        limit: usize,
    ) -> ApiResult<(Vec<StoredApproval>, ApprovalCounts)> {
        let approvals = self.approvals.list_approvals(status, limit).await?;
        let counts = self.approvals.approval_counts().await?;
        Ok((approvals, counts))
    }

    /// Approve a pending action, optionally executing it in the same call.
    pub async fn approve(
        &self,
        approval_id: ApprovalId,
        request: ApproveRequest,
    ) -> ApiResult<StoredApproval> {
        if request.approved_by.trim().is_empty() {
            return Err(ApiError::missing_field("approved_by"));
        }

        let approved = self
            .approvals
            .decide_approval(
                approval_id,
                ApprovalDecision::Approve {
                    approved_by: request.approved_by,
                },
                Utc::now(),
            )
            .await?;

        info!(approval_id = %approval_id, "Approval approved");
        self.ws.broadcast(WsEvent::ApprovalApproved {
            approval: approved.clone().into(),
        });

        if !request.execute_immediately {
            return Ok(approved);
        }
        self.execute(approved).await
    }

    /// Deny a pending action with a required reason.
    pub async fn deny(
        &self,
        approval_id: ApprovalId,
        request: DenyRequest,
    ) -> ApiResult<StoredApproval> {
        if request.denied_by.trim().is_empty() {
            return Err(ApiError::missing_field("denied_by"));
        }
        if request.denial_reason.trim().is_empty() {
            return Err(ApiError::missing_field("denial_reason"));
        }

        let denied = self
            .approvals
            .decide_approval(
                approval_id,
                ApprovalDecision::Deny {
                    denied_by: request.denied_by,
                    reason: request.denial_reason,
                },
                Utc::now(),
            )
            .await?;

        info!(approval_id = %approval_id, "Approval denied");
        self.ws.broadcast(WsEvent::ApprovalDenied {
            approval: denied.clone().into(),
        });

        Ok(denied)
    }

    /// Apply an approved action to its target entity and record the outcome.
    ///
    /// The approval always leaves `approved`: to `executed` on success, to
    /// `failed` with the reason on error. Execution failures surface as 502.
    async fn execute(&self, approved: StoredApproval) -> ApiResult<StoredApproval> {
        let approval_id = approved.data.approval_id;
        let result = self
            .entities
            .apply_action(
                &approved.data.entity,
                approved.data.action_type,
                &approved.data.params,
            )
            .await;

        match result {
            Ok(()) => {
                let executed = self
                    .approvals
                    .record_execution(approval_id, ExecutionOutcome::Succeeded, Utc::now())
                    .await?;
                info!(approval_id = %approval_id, "Approved action executed");
                self.ws.broadcast(WsEvent::ApprovalExecuted {
                    approval: executed.clone().into(),
                });
                Ok(executed)
            }
            Err(e) => {
                let reason = e.to_string();
                warn!(
                    approval_id = %approval_id,
                    reason = %reason,
                    "Approved action failed to execute"
                );
                let failed = self
                    .approvals
                    .record_execution(
                        approval_id,
                        ExecutionOutcome::Failed {
                            reason: reason.clone(),
                        },
                        Utc::now(),
                    )
                    .await?;
                self.ws.broadcast(WsEvent::ApprovalFailed {
                    approval: failed.into(),
                });
                Err(ApiError::execution_failed(reason))
            }
        }
    }
}
