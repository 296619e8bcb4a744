use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Share sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Longest session TTL accepted by validation (30 days).
pub const MAX_SESSION_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Rules for sharing sessions: how long they live, how often status
/// watchers poll, and where the receiver-facing link points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Base URL of the browser front end.  Shareable links are built as
    /// `<frontend_url>/receive/<sessionId>`.
    #[serde(default = "d_frontend_url")]
    pub frontend_url: String,

    /// Session time-to-live.  Every write resets the countdown to this value.
    #[serde(default = "d_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Interval between status snapshots pushed to watchers.
    #[serde(default = "d_poll_ms")]
    pub status_poll_ms: u64,

    /// Store key namespace; the full key is `<key_prefix><sessionId>`.
    #[serde(default = "d_key_prefix")]
    pub key_prefix: String,
}

impl ShareConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_ms)
    }
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            frontend_url: d_frontend_url(),
            session_ttl_secs: d_ttl_secs(),
            status_poll_ms: d_poll_ms(),
            key_prefix: d_key_prefix(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_frontend_url() -> String {
    "http://localhost:3000".into()
}
fn d_ttl_secs() -> u64 {
    24 * 60 * 60
}
fn d_poll_ms() -> u64 {
    2000
}
fn d_key_prefix() -> String {
    "session:".into()
}
