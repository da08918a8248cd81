//! Agent session tracking: a runtime-validated state machine.
//!
//! Unlike approvals, sessions loop between streaming states
//! (`Processing ⇄ Typing`) an arbitrary number of times, so the lifecycle is
//! enforced at runtime via [`SessionStatus::can_transition_to`] instead of
//! the typestate pattern.
//!
//! ```text
//! Idle → Starting → Processing ⇄ Typing → Completed | Error
//! ```
//!
//! A session never returns to Idle once started. Token counters and the
//! derived cost/duration only increase until a terminal status is reached.

use crate::{EntityRef, SessionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// SESSION STATUS ENUM
// ============================================================================

/// Status of an agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session record exists but the agent has not been invoked
    Idle,
    /// Agent process is being launched
    Starting,
    /// Agent is working (tool calls, retrieval, reasoning)
    Processing,
    /// Agent is streaming a response
    Typing,
    /// Agent finished successfully (terminal)
    Completed,
    /// Agent exited with an error (terminal)
    Error,
}

impl SessionStatus {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Starting => "starting",
            SessionStatus::Processing => "processing",
            SessionStatus::Typing => "typing",
            SessionStatus::Completed => "completed",
            SessionStatus::Error => "error",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, SessionStatusParseError> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SessionStatus::Idle),
            "starting" => Ok(SessionStatus::Starting),
            "processing" => Ok(SessionStatus::Processing),
            "typing" => Ok(SessionStatus::Typing),
            "completed" | "complete" => Ok(SessionStatus::Completed),
            "error" | "failed" => Ok(SessionStatus::Error),
            _ => Err(SessionStatusParseError(s.to_string())),
        }
    }

    /// Check if this is a terminal state (no further mutation accepted).
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Error)
    }

    /// Check whether a transition to `next` is allowed.
    ///
    /// Self-transitions are allowed for the streaming states so that token
    /// deltas can be applied without a status change.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match self {
            Idle => matches!(next, Starting),
            Starting => matches!(next, Processing | Error),
            Processing => matches!(next, Processing | Typing | Completed | Error),
            Typing => matches!(next, Typing | Processing | Completed | Error),
            Completed | Error => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for SessionStatus {
    type Err = SessionStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid session status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatusParseError(pub String);

impl fmt::Display for SessionStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid session status: {}", self.0)
    }
}

impl std::error::Error for SessionStatusParseError {}

// ============================================================================
// COST MODEL
// ============================================================================

/// Per-token USD rates for the model driving a session.
///
/// Externally configured; injected into the tracker rather than owned by it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ModelRates {
    pub input_per_token: f64,
    pub output_per_token: f64,
}

impl ModelRates {
    /// Build rates from USD-per-million-token pricing.
    pub fn per_million(input_usd: f64, output_usd: f64) -> Self {
        Self {
            input_per_token: input_usd / 1_000_000.0,
            output_per_token: output_usd / 1_000_000.0,
        }
    }

    /// Derive the cost of a token total under these rates.
    pub fn cost_usd(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        input_tokens as f64 * self.input_per_token + output_tokens as f64 * self.output_per_token
    }
}

impl Default for ModelRates {
    fn default() -> Self {
        // Development default; production rates come from configuration.
        Self::per_million(3.0, 15.0)
    }
}

/// Token counter increments reported by a running agent.
///
/// Deltas are unsigned: counters can only grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TokenDelta {
    #[serde(default)]
    pub input: u64,
    #[serde(default)]
    pub output: u64,
}

// ============================================================================
// SESSION DATA
// ============================================================================

/// Observability record for an in-flight or completed agent invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionData {
    pub session_id: SessionId,
    /// Entity the agent is acting on (weak reference).
    pub entity: EntityRef,
    pub status: SessionStatus,
    /// Error text (only set once the session reaches Error)
    pub error: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Derived: tokens x model rates. Recomputed on every counter update.
    pub cost_usd: f64,
    /// Derived: wall time since started_at. Recomputed on every update.
    pub duration_seconds: f64,
    pub comment_count: u32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub started_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date-time"))]
    pub completed_at: Option<Timestamp>,
}

impl SessionData {
    /// Create a session entering the Starting state with zeroed counters.
    pub fn start(entity: EntityRef, started_at: Timestamp) -> Self {
        Self {
            session_id: SessionId::now_v7(),
            entity,
            status: SessionStatus::Starting,
            error: None,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: 0.0,
            duration_seconds: 0.0,
            comment_count: 0,
            started_at,
            updated_at: started_at,
            completed_at: None,
        }
    }

    /// Apply a status transition plus optional token deltas.
    ///
    /// Fails without mutating anything when the session is terminal or the
    /// transition is not allowed by [`SessionStatus::can_transition_to`].
    pub fn transition(
        &mut self,
        next: SessionStatus,
        delta: TokenDelta,
        rates: &ModelRates,
        now: Timestamp,
    ) -> Result<(), SessionTransitionError> {
        if self.status.is_terminal() {
            return Err(SessionTransitionError::Terminal {
                session_id: self.session_id,
                status: self.status,
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(SessionTransitionError::InvalidTransition {
                session_id: self.session_id,
                from: self.status,
                to: next,
            });
        }

        self.status = next;
        self.input_tokens = self.input_tokens.saturating_add(delta.input);
        self.output_tokens = self.output_tokens.saturating_add(delta.output);
        self.cost_usd = rates.cost_usd(self.input_tokens, self.output_tokens);
        self.updated_at = now;
        self.duration_seconds = self.elapsed_seconds(now);
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        Ok(())
    }

    /// Close the session successfully.
    pub fn complete(
        &mut self,
        rates: &ModelRates,
        now: Timestamp,
    ) -> Result<(), SessionTransitionError> {
        self.transition(SessionStatus::Completed, TokenDelta::default(), rates, now)
    }

    /// Close the session with an error.
    pub fn fail(
        &mut self,
        error: String,
        rates: &ModelRates,
        now: Timestamp,
    ) -> Result<(), SessionTransitionError> {
        self.transition(SessionStatus::Error, TokenDelta::default(), rates, now)?;
        self.error = Some(error);
        Ok(())
    }

    /// Record activity on the comment feed attached to this session.
    pub fn record_comment(&mut self) {
        self.comment_count = self.comment_count.saturating_add(1);
    }

    /// Wall-clock seconds between started_at and `now`, clamped at zero.
    fn elapsed_seconds(&self, now: Timestamp) -> f64 {
        let millis = now.signed_duration_since(self.started_at).num_milliseconds();
        (millis.max(0) as f64) / 1000.0
    }
}

/// Errors when mutating a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransitionError {
    /// Session already reached a terminal status; no further mutation.
    Terminal {
        session_id: SessionId,
        status: SessionStatus,
    },
    /// The requested transition is not in the lifecycle graph.
    InvalidTransition {
        session_id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },
}

impl fmt::Display for SessionTransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionTransitionError::Terminal { session_id, status } => {
                write!(f, "Session {} is terminal ({})", session_id, status)
            }
            SessionTransitionError::InvalidTransition {
                session_id,
                from,
                to,
            } => {
                write!(
                    f,
                    "Session {} cannot transition from {} to {}",
                    session_id, from, to
                )
            }
        }
    }
}

impl std::error::Error for SessionTransitionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EntityKind, EntityRef};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn make_session() -> SessionData {
        let entity = EntityRef::new(EntityKind::Issue, Uuid::now_v7()).with_title("Flaky test");
        SessionData::start(entity, Utc::now())
    }

    #[test]
    fn test_session_status_roundtrip() {
        for status in [
            SessionStatus::Idle,
            SessionStatus::Starting,
            SessionStatus::Processing,
            SessionStatus::Typing,
            SessionStatus::Completed,
            SessionStatus::Error,
        ] {
            let parsed = SessionStatus::from_db_str(status.as_db_str()).unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn test_transition_graph() {
        use SessionStatus::*;
        assert!(Idle.can_transition_to(Starting));
        assert!(!Idle.can_transition_to(Processing));
        assert!(Starting.can_transition_to(Processing));
        assert!(Starting.can_transition_to(Error));
        assert!(!Starting.can_transition_to(Typing));
        assert!(Processing.can_transition_to(Typing));
        assert!(Typing.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Error.can_transition_to(Starting));
        // No way back to Idle once started.
        for status in [Starting, Processing, Typing, Completed, Error] {
            assert!(!status.can_transition_to(Idle));
        }
    }

    #[test]
    fn test_token_accounting_and_cost() {
        let rates = ModelRates::per_million(1.0, 2.0);
        let mut session = make_session();
        let now = session.started_at + Duration::seconds(1);

        session
            .transition(
                SessionStatus::Processing,
                TokenDelta {
                    input: 50,
                    output: 0,
                },
                &rates,
                now,
            )
            .unwrap();
        assert_eq!(session.input_tokens, 50);

        let later = now + Duration::seconds(1);
        session
            .transition(
                SessionStatus::Typing,
                TokenDelta {
                    input: 0,
                    output: 100,
                },
                &rates,
                later,
            )
            .unwrap();
        assert_eq!(session.output_tokens, 100);

        let expected = rates.cost_usd(50, 100);
        assert!((session.cost_usd - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_complete_sets_terminal_fields() {
        let rates = ModelRates::default();
        let mut session = make_session();
        let now = session.started_at + Duration::seconds(3);

        session
            .transition(SessionStatus::Processing, TokenDelta::default(), &rates, now)
            .unwrap();
        let end = now + Duration::seconds(2);
        session.complete(&rates, end).unwrap();

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.completed_at, Some(end));
        assert!((session.duration_seconds - 5.0).abs() < 0.001);
    }

    #[test]
    fn test_terminal_sessions_reject_mutation() {
        let rates = ModelRates::default();
        let mut session = make_session();
        let now = session.started_at;

        session
            .transition(SessionStatus::Processing, TokenDelta::default(), &rates, now)
            .unwrap();
        session.complete(&rates, now).unwrap();

        let snapshot = session.clone();
        let err = session
            .transition(
                SessionStatus::Processing,
                TokenDelta {
                    input: 10,
                    output: 10,
                },
                &rates,
                now,
            )
            .unwrap_err();
        assert!(matches!(err, SessionTransitionError::Terminal { .. }));
        // No observable mutation on failure.
        assert_eq!(session, snapshot);
    }

    #[test]
    fn test_fail_records_error() {
        let rates = ModelRates::default();
        let mut session = make_session();
        let now = session.started_at;

        session
            .fail("model overloaded".to_string(), &rates, now)
            .unwrap();
        assert_eq!(session.status, SessionStatus::Error);
        assert_eq!(session.error.as_deref(), Some("model overloaded"));
        assert!(session.completed_at.is_some());
    }

    #[test]
    fn test_invalid_transition_rejected() {
        let rates = ModelRates::default();
        let mut session = make_session();
        let now = session.started_at;

        let err = session
            .transition(SessionStatus::Typing, TokenDelta::default(), &rates, now)
            .unwrap_err();
        assert!(matches!(
            err,
            SessionTransitionError::InvalidTransition { .. }
        ));
        assert_eq!(session.status, SessionStatus::Starting);
    }
}
