//! WebSocket Event Types
//!
//! This module defines all event types that are broadcast via WebSocket
//! to connected clients for real-time updates.

use crate::types::{ApprovalResponse, SessionResponse};
use serde::{Deserialize, Serialize};
use verdict_core::{EntityId, EntityKind, SessionId};

/// WebSocket event types for real-time updates.
///
/// Every lifecycle transition on approvals and agent sessions triggers a
/// corresponding event that is broadcast to subscribed clients. The `type`
/// tag uses the snake_case event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsEvent {
    // ========================================================================
    // APPROVAL EVENTS
    // ========================================================================
    /// A new approval entered the queue.
    ApprovalCreated {
        /// The created approval
        approval: ApprovalResponse,
    },

    /// A pending approval was approved.
    ApprovalApproved {
        /// The updated approval
        approval: ApprovalResponse,
    },

    /// A pending approval was denied.
    ApprovalDenied {
        /// The updated approval
        approval: ApprovalResponse,
    },

    /// An approved action executed successfully.
    ApprovalExecuted {
        /// The updated approval
        approval: ApprovalResponse,
    },

    /// An approved action failed downstream.
    ApprovalFailed {
        /// The updated approval
        approval: ApprovalResponse,
    },

    // ========================================================================
    // SESSION EVENTS
    // ========================================================================
    /// An agent session was started.
    SessionStarted {
        /// The new session
        session: SessionResponse,
    },

    /// A session's status or counters changed.
    SessionStatusChanged {
        /// The updated session
        session: SessionResponse,
    },

    /// A session finished successfully.
    SessionCompleted {
        /// The terminal session
        session: SessionResponse,
    },

    /// A session exited with an error.
    SessionFailed {
        /// The terminal session
        session: SessionResponse,
    },

    /// An agent started streaming a response (typing indicator).
    Typing {
        session_id: SessionId,
        entity_type: EntityKind,
        entity_id: EntityId,
    },

    /// A comment landed on a session's activity feed.
    CommentCreated {
        session_id: SessionId,
        entity_type: EntityKind,
        entity_id: EntityId,
        body: String,
        author: Option<String>,
    },

    // ========================================================================
    // CONNECTION EVENTS
    // ========================================================================
    /// Client successfully connected.
    Connected {
        /// Entity scope the client subscribed to, if any.
        entity_type: Option<EntityKind>,
        entity_id: Option<EntityId>,
    },

    /// Client disconnected.
    Disconnected {
        /// Reason for disconnection
        reason: String,
    },

    /// An error occurred.
    Error {
        /// Error message
        message: String,
    },
}

impl WsEvent {
    /// Get the event type as a string for logging/debugging.
    pub fn event_type(&self) -> &'static str {
        match self {
            WsEvent::ApprovalCreated { .. } => "approval_created",
            WsEvent::ApprovalApproved { .. } => "approval_approved",
            WsEvent::ApprovalDenied { .. } => "approval_denied",
            WsEvent::ApprovalExecuted { .. } => "approval_executed",
            WsEvent::ApprovalFailed { .. } => "approval_failed",
            WsEvent::SessionStarted { .. } => "session_started",
            WsEvent::SessionStatusChanged { .. } => "session_status_changed",
            WsEvent::SessionCompleted { .. } => "session_completed",
            WsEvent::SessionFailed { .. } => "session_failed",
            WsEvent::Typing { .. } => "typing",
            WsEvent::CommentCreated { .. } => "comment_created",
            WsEvent::Connected { .. } => "connected",
            WsEvent::Disconnected { .. } => "disconnected",
            WsEvent::Error { .. } => "error",
        }
    }

    /// Connection events bypass entity-scope filtering.
    pub fn is_connection_event(&self) -> bool {
        matches!(
            self,
            WsEvent::Connected { .. } | WsEvent::Disconnected { .. } | WsEvent::Error { .. }
        )
    }

    /// The entity this event concerns, used for per-scope subscriptions.
    pub fn entity_scope(&self) -> Option<(EntityKind, EntityId)> {
        match self {
            WsEvent::ApprovalCreated { approval }
            | WsEvent::ApprovalApproved { approval }
            | WsEvent::ApprovalDenied { approval }
            | WsEvent::ApprovalExecuted { approval }
            | WsEvent::ApprovalFailed { approval } => {
                Some((approval.entity_type, approval.entity_id))
            }
            WsEvent::SessionStarted { session }
            | WsEvent::SessionStatusChanged { session }
            | WsEvent::SessionCompleted { session }
            | WsEvent::SessionFailed { session } => Some((session.entity_type, session.entity_id)),
            WsEvent::Typing {
                entity_type,
                entity_id,
                ..
            }
            | WsEvent::CommentCreated {
                entity_type,
                entity_id,
                ..
            } => Some((*entity_type, *entity_id)),
            WsEvent::Connected { .. } | WsEvent::Disconnected { .. } | WsEvent::Error { .. } => {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_type_names() {
        let event = WsEvent::Typing {
            session_id: SessionId::now_v7(),
            entity_type: EntityKind::Issue,
            entity_id: Uuid::now_v7(),
        };
        assert_eq!(event.event_type(), "typing");

        let event = WsEvent::CommentCreated {
            session_id: SessionId::now_v7(),
            entity_type: EntityKind::Issue,
            entity_id: Uuid::now_v7(),
            body: "hello".to_string(),
            author: None,
        };
        assert_eq!(event.event_type(), "comment_created");
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = WsEvent::Disconnected {
            reason: "bye".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"disconnected\""));
    }

    #[test]
    fn test_connection_events_have_no_scope() {
        let event = WsEvent::Error {
            message: "oops".to_string(),
        };
        assert!(event.is_connection_event());
        assert!(event.entity_scope().is_none());
    }

    #[test]
    fn test_entity_scope_extraction() {
        let entity_id = Uuid::now_v7();
        let event = WsEvent::Typing {
            session_id: SessionId::now_v7(),
            entity_type: EntityKind::Project,
            entity_id,
        };
        assert_eq!(event.entity_scope(), Some((EntityKind::Project, entity_id)));
    }
}
