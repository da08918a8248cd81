//! My Queue Service
//!
//! Read-only fan-in over the other components: one call assembles
//! everything waiting on a user. The queue owns no state and performs no
//! writes; each category keeps its own newest-first order and the counts
//! are derived from the returned lists, so they always agree.

use crate::error::ApiResult;
use crate::types::MyQueueResponse;
use std::sync::Arc;
use verdict_core::WorkItemKind;
use verdict_storage::{ApprovalStore, WorkItemStore};

/// Service assembling a user's personal work queue.
#[derive(Clone)]
pub struct QueueService {
    approvals: Arc<dyn ApprovalStore>,
    work_items: Arc<dyn WorkItemStore>,
}

impl QueueService {
    pub fn new(approvals: Arc<dyn ApprovalStore>, work_items: Arc<dyn WorkItemStore>) -> Self {
        Self {
            approvals,
            work_items,
        }
    }

    /// Everything requiring `user`'s attention, each category bounded by
    /// `limit` independently.
    pub async fn get_queue(&self, user: &str, limit: usize) -> ApiResult<MyQueueResponse> {
        let action_approvals = self.approvals.list_pending_for(user, limit).await?;
        let assigned_issues = self
            .work_items
            .list_assigned_work_items(user, WorkItemKind::Issue, limit)
            .await?;
        let assigned_initiatives = self
            .work_items
            .list_assigned_work_items(user, WorkItemKind::Initiative, limit)
            .await?;
        let assigned_milestones = self
            .work_items
            .list_assigned_work_items(user, WorkItemKind::Milestone, limit)
            .await?;
        let review_requests = self
            .work_items
            .list_review_requests_for(user, limit)
            .await?;

        Ok(MyQueueResponse::new(
            action_approvals,
            assigned_issues,
            assigned_initiatives,
            assigned_milestones,
            review_requests,
        ))
    }
}
