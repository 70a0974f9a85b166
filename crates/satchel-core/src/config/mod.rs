//! Engine configuration

use std::time::Duration;

use crate::util::normalize_text_option;

/// Default pause between a reconnect event and the sync pass it triggers,
/// so the pass is not fired against a connection still negotiating.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Remote API connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiConfig {
    /// Backend base URL (e.g. `https://api.example.com`)
    pub base_url: Option<String>,
    /// Bearer token for authenticated calls
    pub auth_token: Option<String>,
}

impl ApiConfig {
    /// Create a configuration from raw values, trimming and rejecting
    /// empty strings.
    #[must_use]
    pub fn new(base_url: Option<String>, auth_token: Option<String>) -> Self {
        Self {
            base_url: normalize_text_option(base_url),
            auth_token: normalize_text_option(auth_token),
        }
    }

    /// Read `SATCHEL_API_URL` / `SATCHEL_API_TOKEN` from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("SATCHEL_API_URL").ok(),
            std::env::var("SATCHEL_API_TOKEN").ok(),
        )
    }

    /// Whether enough is configured to reach the backend.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.base_url.is_some()
    }
}

/// Tunables for the sync engine and connectivity monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Delay between a reconnect and the triggered sync pass.
    pub settle_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

impl SyncOptions {
    /// Override the settle delay (tests use [`Duration::ZERO`]).
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }
}
