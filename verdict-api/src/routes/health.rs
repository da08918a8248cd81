//! Health Check Routes
//!
//! - `GET /ping` - trivial liveness probe
//! - `GET /live` - process liveness with uptime
//! - `GET /ready` - readiness, exercising the backing store

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;
use verdict_storage::ApprovalStore;

/// State for health routes.
pub struct HealthState {
    pub approvals: Arc<dyn ApprovalStore>,
    pub start_time: Instant,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Health of a single component.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Health check response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub uptime_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<ComponentHealth>,
}

/// Trivial liveness probe.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ping",
    tag = "Health",
    responses((status = 200, description = "Pong"))
))]
pub async fn ping() -> &'static str {
    "pong"
}

/// Process liveness with uptime.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is live", body = HealthResponse))
))]
pub async fn live(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        uptime_seconds: state.start_time.elapsed().as_secs(),
        store: None,
    })
}

/// Readiness: the store must answer a cheap query.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready to serve", body = HealthResponse),
        (status = 503, description = "Store unavailable", body = HealthResponse),
    )
))]
pub async fn ready(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    let uptime_seconds = state.start_time.elapsed().as_secs();
    match state.approvals.approval_counts().await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: HealthStatus::Healthy,
                uptime_seconds,
                store: Some(ComponentHealth {
                    status: HealthStatus::Healthy,
                    message: None,
                }),
            }),
        ),
        Err(e) => {
            error!(error = %e, "Store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: HealthStatus::Unhealthy,
                    uptime_seconds,
                    store: Some(ComponentHealth {
                        status: HealthStatus::Unhealthy,
                        message: Some(e.to_string()),
                    }),
                }),
            )
        }
    }
}

/// Create the health routes router.
pub fn create_router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(live))
        .route("/ready", get(ready))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serializes_lowercase() {
        let json = serde_json::to_string(&HealthStatus::Healthy).unwrap();
        assert_eq!(json, "\"healthy\"");
    }

    #[test]
    fn test_health_response_omits_absent_store() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            uptime_seconds: 7,
            store: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("store"));
    }
}
