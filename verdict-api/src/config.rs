//! API Configuration Module
//!
//! Configuration for CORS, WebSocket capacity, model pricing, and stats
//! aggregation. Loaded from environment variables with sensible defaults
//! for development.

use std::time::Duration;
use verdict_core::ModelRates;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// API configuration for CORS and runtime tuning.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    // ========================================================================
    // WebSocket Configuration
    // ========================================================================
    /// Broadcast channel capacity. Slow consumers past this buffer lag and
    /// drop events.
    pub ws_capacity: usize,

    // ========================================================================
    // Session Cost Configuration
    // ========================================================================
    /// USD per million input tokens for the model driving agent sessions.
    pub model_input_usd_per_mtok: f64,

    /// USD per million output tokens.
    pub model_output_usd_per_mtok: f64,

    // ========================================================================
    // Aggregation Configuration
    // ========================================================================
    /// Window for the "recent" bucket in session stats.
    pub stats_window: Duration,

    /// User the queue endpoint serves when no `user_id` query param is given.
    pub default_queue_user: String,

    /// Default bound on list endpoints when no `limit` is given.
    pub default_list_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            // CORS defaults: permissive for development
            cors_origins: Vec::new(), // Empty = allow all
            cors_allow_credentials: false,
            cors_max_age_secs: 86400, // 24 hours

            ws_capacity: 1000,

            // Development pricing; production rates come from env
            model_input_usd_per_mtok: 3.0,
            model_output_usd_per_mtok: 15.0,

            stats_window: Duration::from_secs(24 * 3600),
            default_queue_user: "me".to_string(),
            default_list_limit: 50,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VERDICT_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `VERDICT_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `VERDICT_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `VERDICT_WS_CAPACITY`: Broadcast buffer size (default: 1000)
    /// - `VERDICT_MODEL_INPUT_USD_PER_MTOK`: Input token pricing (default: 3.0)
    /// - `VERDICT_MODEL_OUTPUT_USD_PER_MTOK`: Output token pricing (default: 15.0)
    /// - `VERDICT_STATS_WINDOW_SECS`: Recent-session window (default: 86400)
    /// - `VERDICT_DEFAULT_QUEUE_USER`: Fallback queue user (default: "me")
    /// - `VERDICT_DEFAULT_LIST_LIMIT`: Default list bound (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_origins = std::env::var("VERDICT_CORS_ORIGINS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("VERDICT_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.to_lowercase() == "true")
            .unwrap_or(defaults.cors_allow_credentials);

        let cors_max_age_secs = std::env::var("VERDICT_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        let ws_capacity = std::env::var("VERDICT_WS_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.ws_capacity);

        let model_input_usd_per_mtok = std::env::var("VERDICT_MODEL_INPUT_USD_PER_MTOK")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.model_input_usd_per_mtok);

        let model_output_usd_per_mtok = std::env::var("VERDICT_MODEL_OUTPUT_USD_PER_MTOK")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.model_output_usd_per_mtok);

        let stats_window = std::env::var("VERDICT_STATS_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.stats_window);

        let default_queue_user = std::env::var("VERDICT_DEFAULT_QUEUE_USER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.default_queue_user);

        let default_list_limit = std::env::var("VERDICT_DEFAULT_LIST_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.default_list_limit);

        Self {
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            ws_capacity,
            model_input_usd_per_mtok,
            model_output_usd_per_mtok,
            stats_window,
            default_queue_user,
            default_list_limit,
        }
    }

    /// Per-token rates derived from the configured per-million pricing.
    pub fn model_rates(&self) -> ModelRates {
        ModelRates::per_million(self.model_input_usd_per_mtok, self.model_output_usd_per_mtok)
    }

    /// Check if running in production mode (strict CORS).
    pub fn is_production(&self) -> bool {
        !self.cors_origins.is_empty()
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.cors_origins.is_empty() {
            // Dev mode: allow all
            return true;
        }

        self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}
