//! Agent Session Service
//!
//! Tracks agent invocations against entities: lifecycle transitions, token
//! counters, and the cost/duration fields derived from them. Model pricing
//! is injected at construction; the tracker never owns the rate card.

use crate::error::{ApiError, ApiResult};
use crate::events::WsEvent;
use crate::types::{
    entity_ref_from_parts, CreateCommentRequest, FailSessionRequest, SessionStatsResponse,
    StartSessionRequest, UpdateSessionStatusRequest,
};
use crate::ws::WsState;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use verdict_core::{ModelRates, SessionData, SessionId, SessionStatus};
use verdict_storage::SessionStore;

/// Service for agent session tracking.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    ws: Arc<WsState>,
    rates: ModelRates,
}

impl SessionService {
    pub fn new(sessions: Arc<dyn SessionStore>, ws: Arc<WsState>, rates: ModelRates) -> Self {
        Self {
            sessions,
            ws,
            rates,
        }
    }

    /// Start tracking a new agent invocation.
    ///
    /// The record enters `starting` with zeroed counters.
    pub async fn start(&self, request: StartSessionRequest) -> ApiResult<SessionData> {
        let entity = entity_ref_from_parts(
            request.entity_type,
            request.entity_id,
            request.entity_title,
        );
        let session = SessionData::start(entity, Utc::now());
        self.sessions.insert_session(&session).await?;

        info!(
            session_id = %session.session_id,
            entity = %session.entity,
            "Agent session started"
        );
        self.ws.broadcast(WsEvent::SessionStarted {
            session: session.clone().into(),
        });

        Ok(session)
    }

    /// Fetch a single session.
    pub async fn get(&self, session_id: SessionId) -> ApiResult<SessionData> {
        self.sessions
            .get_session(session_id)
            .await?
            .ok_or_else(|| ApiError::session_not_found(session_id))
    }

    /// Apply a status transition plus token deltas reported by the agent.
    ///
    /// An error string in the request is recorded on the session, which is
    /// how a report of `status: error` carries its cause. A transition into
    /// `typing` additionally emits the typing indicator event for the
    /// session's entity.
    pub async fn update_status(
        &self,
        session_id: SessionId,
        request: UpdateSessionStatusRequest,
    ) -> ApiResult<SessionData> {
        let mut session = self.get(session_id).await?;
        session.transition(request.status, request.delta_tokens, &self.rates, Utc::now())?;
        if let Some(error) = request.error {
            session.error = Some(error);
        }
        self.sessions.update_session(&session).await?;

        self.ws.broadcast(WsEvent::SessionStatusChanged {
            session: session.clone().into(),
        });
        if request.status == SessionStatus::Typing {
            self.ws.broadcast(WsEvent::Typing {
                session_id: session.session_id,
                entity_type: session.entity.kind,
                entity_id: session.entity.id,
            });
        }

        Ok(session)
    }

    /// Close a session successfully.
    pub async fn complete(&self, session_id: SessionId) -> ApiResult<SessionData> {
        let mut session = self.get(session_id).await?;
        session.complete(&self.rates, Utc::now())?;
        self.sessions.update_session(&session).await?;

        info!(
            session_id = %session_id,
            cost_usd = session.cost_usd,
            duration_seconds = session.duration_seconds,
            "Agent session completed"
        );
        self.ws.broadcast(WsEvent::SessionCompleted {
            session: session.clone().into(),
        });

        Ok(session)
    }

    /// Close a session with an error.
    pub async fn fail(
        &self,
        session_id: SessionId,
        request: FailSessionRequest,
    ) -> ApiResult<SessionData> {
        if request.error.trim().is_empty() {
            return Err(ApiError::missing_field("error"));
        }

        let mut session = self.get(session_id).await?;
        session.fail(request.error, &self.rates, Utc::now())?;
        self.sessions.update_session(&session).await?;

        info!(session_id = %session_id, "Agent session failed");
        self.ws.broadcast(WsEvent::SessionFailed {
            session: session.clone().into(),
        });

        Ok(session)
    }

    /// Record a comment landing on the session's activity feed.
    ///
    /// Bumps the session's comment counter and broadcasts the comment to
    /// clients watching the entity. Terminal sessions reject this like any
    /// other mutation.
    pub async fn record_comment(
        &self,
        session_id: SessionId,
        request: CreateCommentRequest,
    ) -> ApiResult<SessionData> {
        if request.body.trim().is_empty() {
            return Err(ApiError::missing_field("body"));
        }

        let mut session = self.get(session_id).await?;
        session.record_comment();
        self.sessions.update_session(&session).await?;

        self.ws.broadcast(WsEvent::CommentCreated {
            session_id: session.session_id,
            entity_type: session.entity.kind,
            entity_id: session.entity.id,
            body: request.body,
            author: request.author,
        });

        Ok(session)
    }

    /// Sessions not yet terminal, newest first.
    pub async fn list_active(&self) -> ApiResult<Vec<SessionData>> {
        Ok(self.sessions.list_active_sessions().await?)
    }

    /// Most recent sessions, newest first, bounded by limit.
    pub async fn list_recent(&self, limit: usize) -> ApiResult<Vec<SessionData>> {
        Ok(self.sessions.list_recent_sessions(limit).await?)
    }

    /// Aggregate stats: active count plus cost/duration over sessions
    /// started inside `window`.
    pub async fn stats(&self, window: std::time::Duration) -> ApiResult<SessionStatsResponse> {
        let active = self.sessions.list_active_sessions().await?;
        let since = Utc::now() - Duration::seconds(window.as_secs() as i64);
        let windowed = self.sessions.list_sessions_started_since(since).await?;

        let total_cost_usd = windowed.iter().map(|s| s.cost_usd).sum();
        let terminal: Vec<&SessionData> =
            windowed.iter().filter(|s| s.status.is_terminal()).collect();
        let avg_duration_seconds = if terminal.is_empty() {
            0.0
        } else {
            terminal.iter().map(|s| s.duration_seconds).sum::<f64>() / terminal.len() as f64
        };

        Ok(SessionStatsResponse {
            active_count: active.len() as u64,
            recent_count: windowed.len() as u64,
            total_cost_usd,
            avg_duration_seconds,
        })
    }
}
