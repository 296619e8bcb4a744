use serde::Serialize;

/// Structured trace events emitted across all peerbeacon crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    SessionCreated {
        session_id: String,
        file_size: u64,
        expires_at: i64,
    },
    TorrentDescriptorUpdated {
        session_id: String,
        previous_status: String,
    },
    StatusUpdated {
        session_id: String,
        from: String,
        to: String,
        peers: Option<u32>,
        progress: Option<u32>,
    },
    WatchStarted {
        session_id: String,
        interval_ms: u64,
    },
    WatchEnded {
        session_id: String,
        reason: String,
        ticks: u64,
    },
    StoreSwept {
        backend: String,
        removed: usize,
        elapsed_ms: u64,
    },
}

impl TraceEvent {
    /// Log the event as one JSON `trace_event` field.
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "pb_event");
    }
}
