//! My Queue Routes
//!
//! Single endpoint assembling everything waiting on one user:
//! - `GET /` - pending approvals, assigned work, and open review requests

use crate::error::ApiResult;
use crate::services::QueueService;
use crate::types::MyQueueResponse;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// State for my-queue routes.
pub struct MyQueueRoutesState {
    pub service: QueueService,
    /// Served when the request carries no `user_id`.
    pub default_user: String,
    /// Applied per category when the request carries no `limit`.
    pub default_limit: usize,
}

/// Query parameters for the queue endpoint.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct MyQueueQuery {
    /// User whose queue to assemble.
    pub user_id: Option<String>,
    /// Maximum number of entries per category.
    pub limit: Option<usize>,
}

/// Assemble one user's personal work queue.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/api/v1/my-queue",
    tag = "My Queue",
    params(MyQueueQuery),
    responses(
        (status = 200, description = "The user's queue", body = MyQueueResponse),
    )
))]
pub async fn get_my_queue(
    State(state): State<Arc<MyQueueRoutesState>>,
    Query(query): Query<MyQueueQuery>,
) -> ApiResult<Json<MyQueueResponse>> {
    let user = query.user_id.as_deref().unwrap_or(&state.default_user);
    let limit = query.limit.unwrap_or(state.default_limit);
    let queue = state.service.get_queue(user, limit).await?;
    Ok(Json(queue))
}

/// Create the my-queue routes router.
pub fn create_router(state: Arc<MyQueueRoutesState>) -> Router {
    Router::new().route("/", get(get_my_queue)).with_state(state)
}
