//! Read models surfaced by the personal queue.
//!
//! Work items and review requests are owned by the entity store; VERDICT
//! only projects them into the aggregated queue view. These types carry the
//! subset of fields the queue renders, not the full upstream records.

use crate::{EntityId, EntityRef, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// WORK ITEM
// ============================================================================

/// Kind discriminator for queue-visible work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    Issue,
    Initiative,
    Milestone,
}

impl WorkItemKind {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            WorkItemKind::Issue => "issue",
            WorkItemKind::Initiative => "initiative",
            WorkItemKind::Milestone => "milestone",
        }
    }
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// Workflow status of a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl WorkItemStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            WorkItemStatus::Open => "open",
            WorkItemStatus::InProgress => "in_progress",
            WorkItemStatus::Blocked => "blocked",
            WorkItemStatus::Closed => "closed",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, WorkItemStatusParseError> {
        match s.to_lowercase().as_str() {
            "open" => Ok(WorkItemStatus::Open),
            "in_progress" | "in-progress" => Ok(WorkItemStatus::InProgress),
            "blocked" => Ok(WorkItemStatus::Blocked),
            "closed" | "done" => Ok(WorkItemStatus::Closed),
            _ => Err(WorkItemStatusParseError(s.to_string())),
        }
    }

    /// Closed items drop out of the queue.
    pub fn is_closed(&self) -> bool {
        matches!(self, WorkItemStatus::Closed)
    }
}

impl fmt::Display for WorkItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for WorkItemStatus {
    type Err = WorkItemStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid work item status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItemStatusParseError(pub String);

impl fmt::Display for WorkItemStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid work item status: {}", self.0)
    }
}

impl std::error::Error for WorkItemStatusParseError {}

/// A queue-visible unit of assigned work (issue, initiative, or milestone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct WorkItem {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    pub kind: WorkItemKind,
    pub title: String,
    /// User the item is assigned to; unassigned items never enter a queue.
    pub assignee: Option<String>,
    pub status: WorkItemStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

// ============================================================================
// REVIEW REQUEST
// ============================================================================

/// Status of a review request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Open,
    Done,
}

impl ReviewStatus {
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ReviewStatus::Open => "open",
            ReviewStatus::Done => "done",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

/// A request for a human to review something (a document, a draft, an
/// entity change). Surfaces in the reviewer's queue while open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReviewRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub id: EntityId,
    /// What is being reviewed, in display form.
    pub subject: String,
    pub requested_by: String,
    /// User whose sign-off is being asked for.
    pub reviewer: String,
    /// Entity the review concerns, when one exists.
    pub target: Option<EntityRef>,
    pub status: ReviewStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}
