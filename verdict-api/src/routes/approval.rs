//! Approval Queue Routes
//!
//! REST endpoints for the action approval queue:
//! - `POST /` - queue a proposed action for review
//! - `GET /` - list approvals with per-status counts
//! - `GET /:id` - fetch a single approval
//! - `POST /:id/approve` - approve (optionally execute) a pending action
//! - `POST /:id/deny` - deny a pending action with a reason

use crate::error::ApiResult;
use crate::services::ApprovalService;
use crate::types::{
    ApprovalListResponse, ApprovalResponse, ApproveRequest, CreateApprovalRequest, DenyRequest,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use verdict_core::{ApprovalId, ApprovalStatus};

/// State for approval routes.
pub struct ApprovalRoutesState {
    pub service: ApprovalService,
    /// Applied when the request carries no `limit`.
    pub default_limit: usize,
}

/// Query parameters for listing approvals.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct ListApprovalsQuery {
    /// Filter to one status (e.g. `pending`).
    pub status: Option<ApprovalStatus>,
    /// Maximum number of approvals to return.
    pub limit: Option<usize>,
}

/// Queue a proposed action for human review.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/approvals",
    tag = "Approvals",
    request_body = CreateApprovalRequest,
    responses(
        (status = 201, description = "Approval queued", body = ApprovalResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Target entity not found"),
    )
))]
pub async fn create_approval(
    State(state): State<Arc<ApprovalRoutesState>>,
    Json(request): Json<CreateApprovalRequest>,
) -> ApiResult<(StatusCode, Json<ApprovalResponse>)> {
    let stored = state.service.create(request).await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// List approvals with per-status counts over the whole queue.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/approvals",
    tag = "Approvals",
    params(ListApprovalsQuery),
    responses(
        (status = 200, description = "Approvals with counts", body = ApprovalListResponse),
    )
))]
pub async fn list_approvals(
    State(state): State<Arc<ApprovalRoutesState>>,
    Query(query): Query<ListApprovalsQuery>,
) -> ApiResult<Json<ApprovalListResponse>> {
    let limit = query.limit.unwrap_or(state.default_limit);
    let (approvals, counts) = state.service.list(query.status, limit).await?;
    Ok(Json(ApprovalListResponse::new(approvals, counts)))
}

/// Fetch a single approval by ID.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/approvals/{id}",
    tag = "Approvals",
    params(("id" = String, Path, description = "Approval ID")),
    responses(
        (status = 200, description = "The approval", body = ApprovalResponse),
        (status = 404, description = "Approval not found"),
    )
))]
pub async fn get_approval(
    State(state): State<Arc<ApprovalRoutesState>>,
    Path(id): Path<ApprovalId>,
) -> ApiResult<Json<ApprovalResponse>> {
    let stored = state.service.get(id).await?;
    Ok(Json(stored.into()))
}

/// Approve a pending action, optionally executing it in the same call.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/approvals/{id}/approve",
    tag = "Approvals",
    params(("id" = String, Path, description = "Approval ID")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Approval approved (and possibly executed)", body = ApprovalResponse),
        (status = 404, description = "Approval not found"),
        (status = 409, description = "Approval already decided"),
        (status = 502, description = "Approved action failed downstream"),
    )
))]
pub async fn approve_approval(
    State(state): State<Arc<ApprovalRoutesState>>,
    Path(id): Path<ApprovalId>,
    Json(request): Json<ApproveRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    let stored = state.service.approve(id, request).await?;
    Ok(Json(stored.into()))
}

/// Deny a pending action with a required reason.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/api/v1/approvals/{id}/deny",
    tag = "Approvals",
    params(("id" = String, Path, description = "Approval ID")),
    request_body = DenyRequest,
    responses(
        (status = 200, description = "Approval denied", body = ApprovalResponse),
        (status = 404, description = "Approval not found"),
        (status = 409, description = "Approval already decided"),
    )
))]
pub async fn deny_approval(
    State(state): State<Arc<ApprovalRoutesState>>,
    Path(id): Path<ApprovalId>,
    Json(request): Json<DenyRequest>,
) -> ApiResult<Json<ApprovalResponse>> {
    let stored = state.service.deny(id, request).await?;
    Ok(Json(stored.into()))
}

/// Create the approval routes router.
pub fn create_router(state: Arc<ApprovalRoutesState>) -> Router {
    Router::new()
        .route("/", post(create_approval).get(list_approvals))
        .route("/:id", get(get_approval))
        .route("/:id/approve", post(approve_approval))
        .route("/:id/deny", post(deny_approval))
        .with_state(state)
}
