use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory for the `file` backend (`<state_path>/sessions/sessions.json`).
    #[serde(default = "d_state_path")]
    pub state_path: PathBuf,

    /// How often the background sweeper drops expired entries.
    #[serde(default = "d_sweep_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            state_path: d_state_path(),
            sweep_interval_secs: d_sweep_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local map.  Sessions vanish on restart.
    #[default]
    Memory,
    /// JSON snapshot written through on every put.
    File,
}

fn d_state_path() -> PathBuf {
    PathBuf::from("./data")
}
fn d_sweep_secs() -> u64 {
    60
}
