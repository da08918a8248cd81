//! Agent Session Routes
//!
//! REST endpoints for agent session tracking:
//! - `POST /sessions` - start tracking an agent invocation
//! - `GET /sessions/:id` - fetch a session
//! - `POST /sessions/:id/status` - report a transition plus token deltas
//! - `POST /sessions/:id/complete` - close a session successfully
//! - `POST /sessions/:id/fail` - close a session with an error
//! - `POST /sessions/:id/comments` - record a comment on the session feed
//! - `GET /active` - sessions not yet terminal
//! - `GET /recent` - most recent sessions, newest first
//! - `GET /stats` - aggregate counts, cost, and duration

use crate::error::ApiResult;
use crate::services::SessionService;
use crate::types::{
    ActiveSessionsResponse, CreateCommentRequest, FailSessionRequest, RecentSessionsResponse,
    SessionResponse, SessionStatsResponse, StartSessionRequest, UpdateSessionStatusRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use verdict_core::SessionId;

/// State for agent session routes.
pub struct AgentRoutesState {
    pub service: SessionService,
    /// Applied when the request carries no `limit`.
    pub default_limit: usize,
    /// Window for the "recent" bucket in stats.
    pub stats_window: Duration,
}

/// Query parameters for listing recent sessions.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct RecentSessionsQuery {
    /// Maximum number of sessions to return.
    pub limit: Option<usize>,
}

/// Query parameters for the stats endpoint.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct StatsQuery {
    /// Window in seconds for the "recent" bucket; overrides the configured
    /// default.
    pub window_secs: Option<u64>,
}

/// Start tracking a new agent invocation.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/agents/sessions",
    tag = "Agent Sessions",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionResponse),
    )
))]
pub async fn start_session(
    State(state): State<Arc<AgentRoutesState>>,
    Json(request): Json<StartSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let session = state.service.start(request).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// Fetch a session by ID.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents/sessions/{id}",
    tag = "Agent Sessions",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "The session", body = SessionResponse),
        (status = 404, description = "Session not found"),
    )
))]
pub async fn get_session(
    State(state): State<Arc<AgentRoutesState>>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.service.get(id).await?;
    Ok(Json(session.into()))
}

/// Report a status transition plus token counter deltas.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/agents/sessions/{id}/status",
    tag = "Agent Sessions",
    params(("id" = String, Path, description = "Session ID")),
    request_body = UpdateSessionStatusRequest,
    responses(
        (status = 200, description = "Session updated", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Transition not allowed"),
    )
))]
pub async fn update_session_status(
    State(state): State<Arc<AgentRoutesState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<UpdateSessionStatusRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.service.update_status(id, request).await?;
    Ok(Json(session.into()))
}

/// Close a session successfully.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/agents/sessions/{id}/complete",
    tag = "Agent Sessions",
    params(("id" = String, Path, description = "Session ID")),
    responses(
        (status = 200, description = "Session completed", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already terminal"),
    )
))]
pub async fn complete_session(
    State(state): State<Arc<AgentRoutesState>>,
    Path(id): Path<SessionId>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.service.complete(id).await?;
    Ok(Json(session.into()))
}

/// Close a session with an error.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/agents/sessions/{id}/fail",
    tag = "Agent Sessions",
    params(("id" = String, Path, description = "Session ID")),
    request_body = FailSessionRequest,
    responses(
        (status = 200, description = "Session failed", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already terminal"),
    )
))]
pub async fn fail_session(
    State(state): State<Arc<AgentRoutesState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<FailSessionRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.service.fail(id, request).await?;
    Ok(Json(session.into()))
}

/// Record a comment on a session's activity feed.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/agents/sessions/{id}/comments",
    tag = "Agent Sessions",
    params(("id" = String, Path, description = "Session ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment recorded", body = SessionResponse),
        (status = 404, description = "Session not found"),
        (status = 409, description = "Session already terminal"),
    )
))]
pub async fn create_comment(
    State(state): State<Arc<AgentRoutesState>>,
    Path(id): Path<SessionId>,
    Json(request): Json<CreateCommentRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let session = state.service.record_comment(id, request).await?;
    Ok(Json(session.into()))
}

/// List sessions not yet terminal.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents/active",
    tag = "Agent Sessions",
    responses(
        (status = 200, description = "Active sessions", body = ActiveSessionsResponse),
    )
))]
pub async fn list_active_sessions(
    State(state): State<Arc<AgentRoutesState>>,
) -> ApiResult<Json<ActiveSessionsResponse>> {
    let sessions = state.service.list_active().await?;
    Ok(Json(ActiveSessionsResponse {
        active_sessions: sessions.into_iter().map(SessionResponse::from).collect(),
    }))
}

/// List the most recent sessions, newest first.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents/recent",
    tag = "Agent Sessions",
    params(RecentSessionsQuery),
    responses(
        (status = 200, description = "Recent sessions", body = RecentSessionsResponse),
    )
))]
pub async fn list_recent_sessions(
    State(state): State<Arc<AgentRoutesState>>,
    Query(query): Query<RecentSessionsQuery>,
) -> ApiResult<Json<RecentSessionsResponse>> {
    let limit = query.limit.unwrap_or(state.default_limit);
    let sessions = state.service.list_recent(limit).await?;
    Ok(Json(RecentSessionsResponse {
        recent_sessions: sessions.into_iter().map(SessionResponse::from).collect(),
    }))
}

/// Aggregate session stats over a window.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/agents/stats",
    tag = "Agent Sessions",
    params(StatsQuery),
    responses(
        (status = 200, description = "Session stats", body = SessionStatsResponse),
    )
))]
pub async fn session_stats(
    State(state): State<Arc<AgentRoutesState>>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<SessionStatsResponse>> {
    let window = query
        .window_secs
        .map(Duration::from_secs)
        .unwrap_or(state.stats_window);
    let stats = state.service.stats(window).await?;
    Ok(Json(stats))
}

/// Create the agent session routes router.
pub fn create_router(state: Arc<AgentRoutesState>) -> Router {
    Router::new()
        .route("/sessions", post(start_session))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/status", post(update_session_status))
        .route("/sessions/:id/complete", post(complete_session))
        .route("/sessions/:id/fail", post(fail_session))
        .route("/sessions/:id/comments", post(create_comment))
        .route("/active", get(list_active_sessions))
        .route("/recent", get(list_recent_sessions))
        .route("/stats", get(session_stats))
        .with_state(state)
}
