//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can run with zero
//! configuration against a local development backend.

use std::time::Duration;

use viewcast_net::LiveConfig;
use viewcast_shared::constants::{
    DEFAULT_API_BASE, DEFAULT_LIVE_BACKOFF_MAX_MS, DEFAULT_LIVE_BACKOFF_MS,
    DEFAULT_LIVE_MAX_RETRIES, DEFAULT_WS_BASE,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    /// Env: `VIEWCAST_API_BASE`
    /// Default: `http://127.0.0.1:8000`
    pub api_base: String,

    /// Base URL of the live WebSocket host.
    /// Env: `VIEWCAST_WS_BASE`
    /// Default: `ws://127.0.0.1:8000`
    pub ws_base: String,

    /// Consecutive failed live connection attempts before giving up.
    /// Env: `VIEWCAST_LIVE_MAX_RETRIES`
    /// Default: `5`
    pub live_max_retries: u32,

    /// First reconnect delay for the live channel.
    /// Env: `VIEWCAST_LIVE_BACKOFF_MS`
    /// Default: `500`
    pub live_initial_backoff: Duration,

    /// Upper bound on the reconnect delay.
    /// Env: `VIEWCAST_LIVE_BACKOFF_MAX_MS`
    /// Default: `30000`
    pub live_max_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_base: DEFAULT_WS_BASE.to_string(),
            live_max_retries: DEFAULT_LIVE_MAX_RETRIES,
            live_initial_backoff: Duration::from_millis(DEFAULT_LIVE_BACKOFF_MS),
            live_max_backoff: Duration::from_millis(DEFAULT_LIVE_BACKOFF_MAX_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var("VIEWCAST_API_BASE") {
            config.api_base = base;
        }

        if let Ok(base) = std::env::var("VIEWCAST_WS_BASE") {
            config.ws_base = base;
        }

        if let Ok(val) = std::env::var("VIEWCAST_LIVE_MAX_RETRIES") {
            match val.parse::<u32>() {
                Ok(n) => config.live_max_retries = n,
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid VIEWCAST_LIVE_MAX_RETRIES, using default")
                }
            }
        }

        if let Ok(val) = std::env::var("VIEWCAST_LIVE_BACKOFF_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.live_initial_backoff = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid VIEWCAST_LIVE_BACKOFF_MS, using default")
                }
            }
        }

        if let Ok(val) = std::env::var("VIEWCAST_LIVE_BACKOFF_MAX_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.live_max_backoff = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid VIEWCAST_LIVE_BACKOFF_MAX_MS, using default")
                }
            }
        }

        config
    }

    /// Live channel settings derived from this configuration.
    pub fn live_config(&self) -> LiveConfig {
        LiveConfig {
            ws_base: self.ws_base.clone(),
            max_retries: self.live_max_retries,
            initial_backoff: self.live_initial_backoff,
            max_backoff: self.live_max_backoff,
        }
    }
}
