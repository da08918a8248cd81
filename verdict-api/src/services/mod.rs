//! Business Logic Services
//!
//! Services sit between route handlers and the store traits. Each service
//! takes the store capabilities it needs at construction plus the shared
//! WebSocket state, and broadcasts lifecycle events itself so that
//! multi-step operations (approve + execute) emit one event per transition.

pub mod approval_service;
pub mod queue_service;
pub mod session_service;

pub use approval_service::ApprovalService;
pub use queue_service::QueueService;
pub use session_service::SessionService;
