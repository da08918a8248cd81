//! VERDICT API - REST and WebSocket surface
//!
//! Axum-based HTTP server over the approval queue, agent session tracker,
//! and personal work queue. Store backends are injected as capabilities
//! from `verdict-storage`; this crate owns the wire types, the error
//! envelope, and the event broadcast.

pub mod config;
pub mod error;
pub mod events;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod types;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use events::WsEvent;
pub use routes::create_api_router;
pub use services::{ApprovalService, QueueService, SessionService};
pub use types::*;
pub use ws::WsState;
