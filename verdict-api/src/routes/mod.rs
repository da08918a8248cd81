//! API Route Handlers
//!
//! Assembles the REST surface:
//! - `/api/v1/approvals` - action approval queue
//! - `/api/v1/agents` - agent session tracking
//! - `/api/v1/my-queue` - personal work queue
//! - `/api/v1/ws` - WebSocket event stream
//! - `/health` - liveness and readiness probes
//! - `/openapi.json` - OpenAPI document (feature-gated)

pub mod agent;
pub mod approval;
pub mod health;
pub mod my_queue;

use crate::config::ApiConfig;
use crate::services::{ApprovalService, QueueService, SessionService};
use crate::ws::{ws_handler, WsState};
use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use verdict_storage::{ApprovalStore, EntityStore, SessionStore, WorkItemStore};

/// Build the CORS layer from configuration.
///
/// With no configured origins every origin is allowed (development); with
/// origins configured only those are admitted, and credentials/max-age
/// follow the config.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping unparseable CORS origin");
                None
            }
        })
        .collect();

    let mut layer = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .max_age(std::time::Duration::from_secs(config.cors_max_age_secs));

    if config.cors_allow_credentials {
        layer = layer.allow_credentials(true);
    }

    layer
}

/// Serve the OpenAPI document.
#[cfg(feature = "openapi")]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

/// Create the complete API router.
///
/// Services are assembled here from the injected store capabilities; the
/// same backend may satisfy several of them.
pub fn create_api_router(
    config: &ApiConfig,
    approvals: Arc<dyn ApprovalStore>,
    sessions: Arc<dyn SessionStore>,
    work_items: Arc<dyn WorkItemStore>,
    entities: Arc<dyn EntityStore>,
    ws_state: Arc<WsState>,
) -> Router {
    let approval_service =
        ApprovalService::new(approvals.clone(), entities, ws_state.clone());
    let session_service =
        SessionService::new(sessions, ws_state.clone(), config.model_rates());
    let queue_service = QueueService::new(approvals.clone(), work_items);

    let approval_routes = approval::create_router(Arc::new(approval::ApprovalRoutesState {
        service: approval_service,
        default_limit: config.default_list_limit,
    }));
    let agent_routes = agent::create_router(Arc::new(agent::AgentRoutesState {
        service: session_service,
        default_limit: config.default_list_limit,
        stats_window: config.stats_window,
    }));
    let my_queue_routes = my_queue::create_router(Arc::new(my_queue::MyQueueRoutesState {
        service: queue_service,
        default_user: config.default_queue_user.clone(),
        default_limit: config.default_list_limit,
    }));
    let health_routes = health::create_router(Arc::new(health::HealthState {
        approvals,
        start_time: Instant::now(),
    }));
    let ws_routes = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(ws_state);

    let router = Router::new()
        .nest("/api/v1/approvals", approval_routes)
        .nest("/api/v1/agents", agent_routes)
        .nest("/api/v1/my-queue", my_queue_routes)
        .nest("/api/v1", ws_routes)
        .nest("/health", health_routes);

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", get(openapi_json));

    router
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_storage::InMemoryStore;

    #[test]
    fn test_router_assembles() {
        let config = ApiConfig::default();
        let store = Arc::new(InMemoryStore::new());
        let ws = Arc::new(WsState::new(16));
        let _router = create_api_router(
            &config,
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            ws,
        );
    }

    #[test]
    fn test_cors_layer_with_origins() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["https://dashboard.example.com".to_string()];
        // Builds without panicking; exact behavior is covered by tower-http.
        let _layer = build_cors_layer(&config);
    }
}
