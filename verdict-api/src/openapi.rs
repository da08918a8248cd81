//! OpenAPI Specification for the VERDICT API
//!
//! Generates the OpenAPI document from the route annotations and schema
//! derives via utoipa. Served at `/openapi.json`.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::{agent, approval, health, my_queue};
use crate::types::*;

use verdict_core::{
    ActionType, ApprovalStatus, EntityKind, ModelRates, ReviewRequest, ReviewStatus, RiskLevel,
    SessionStatus, TokenDelta, WorkItem, WorkItemKind, WorkItemStatus,
};

/// OpenAPI document for the VERDICT API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "VERDICT API",
        version = "0.1.0",
        description = "Human-in-the-loop gating for AI-proposed actions: approval queue, agent session tracking, and the personal work queue"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local Development")
    ),
    tags(
        (name = "Approvals", description = "Action approval queue - AI-proposed actions gated by human review"),
        (name = "Agent Sessions", description = "Agent invocation tracking - lifecycle, token counters, cost"),
        (name = "My Queue", description = "Personal work queue - everything waiting on one user"),
        (name = "Health", description = "Liveness and readiness probes")
    ),
    paths(
        approval::create_approval,
        approval::list_approvals,
        approval::get_approval,
        approval::approve_approval,
        approval::deny_approval,
        agent::start_session,
        agent::get_session,
        agent::update_session_status,
        agent::complete_session,
        agent::fail_session,
        agent::create_comment,
        agent::list_active_sessions,
        agent::list_recent_sessions,
        agent::session_stats,
        my_queue::get_my_queue,
        health::ping,
        health::live,
        health::ready,
    ),
    components(schemas(
        // Error envelope
        ApiError,
        ErrorCode,
        // Approval queue
        CreateApprovalRequest,
        ApproveRequest,
        DenyRequest,
        ApprovalResponse,
        ApprovalListResponse,
        ApprovalStatus,
        ActionType,
        RiskLevel,
        // Agent sessions
        StartSessionRequest,
        UpdateSessionStatusRequest,
        FailSessionRequest,
        CreateCommentRequest,
        SessionResponse,
        ActiveSessionsResponse,
        RecentSessionsResponse,
        SessionStatsResponse,
        SessionStatus,
        TokenDelta,
        ModelRates,
        // My queue
        MyQueueResponse,
        MyQueueCounts,
        WorkItem,
        WorkItemKind,
        WorkItemStatus,
        ReviewRequest,
        ReviewStatus,
        // Shared
        EntityKind,
        // Health
        health::HealthResponse,
        health::HealthStatus,
        health::ComponentHealth,
    ))
)]
pub struct ApiDoc;
