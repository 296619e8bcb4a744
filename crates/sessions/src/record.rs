//! Session record schema and its canonical encoding.
//!
//! The stored document and the JSON exchanged with browsers use the same
//! camelCase field names.  `encode`/`decode` are the only way a record goes
//! into or comes out of a store.

use serde::{Deserialize, Serialize};

use pb_domain::error::{Error, Result};

/// Version tag written into every stored record.
pub const RECORD_VERSION: u32 = 1;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Status
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Initiated,
    Ready,
    Connected,
    Completed,
    Error,
}

impl SessionStatus {
    pub const ALL: [SessionStatus; 5] = [
        Self::Initiated,
        Self::Ready,
        Self::Connected,
        Self::Completed,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initiated => "initiated",
            Self::Ready => "ready",
            Self::Connected => "connected",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::invalid(format!("unknown session status {s:?}")))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Record
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// File description declared by the initiator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl FileMetadata {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("fileMetadata.name must not be empty"));
        }
        if self.size == 0 {
            return Err(Error::invalid("fileMetadata.size must be positive"));
        }
        Ok(())
    }
}

/// One sharing attempt, from creation to expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub public_key: String,
    pub private_key: String,
    pub torrent_info_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_uri: Option<String>,
    pub file_metadata: FileMetadata,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds; moved forward on every write.
    pub expires_at: i64,
}

impl SessionRecord {
    /// What a receiver may see: no private key, no creation time.
    pub fn view(&self) -> SessionView {
        SessionView {
            session_id: self.session_id.clone(),
            public_key: self.public_key.clone(),
            torrent_info_hash: self.torrent_info_hash.clone(),
            magnet_uri: self.magnet_uri.clone(),
            file_metadata: self.file_metadata.clone(),
            status: self.status,
            peers: self.peers,
            progress: self.progress,
            expires_at: self.expires_at,
        }
    }

    pub fn is_live_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

/// Read-only projection returned by `GetSessionInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub public_key: String,
    pub torrent_info_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnet_uri: Option<String>,
    pub file_metadata: FileMetadata,
    pub status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    pub expires_at: i64,
}

/// What the initiator gets back from `CreateSession`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub public_key: String,
    pub torrent_info_hash: String,
    pub shareable_link: String,
    pub expires_at: i64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Codec
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    v: u32,
    #[serde(flatten)]
    record: &'a SessionRecord,
}

#[derive(Deserialize)]
struct Envelope {
    v: u32,
    #[serde(flatten)]
    record: SessionRecord,
}

pub fn encode(record: &SessionRecord) -> Result<String> {
    serde_json::to_string(&EnvelopeRef {
        v: RECORD_VERSION,
        record,
    })
    .map_err(|e| Error::Codec(format!("encoding {}: {e}", record.session_id)))
}

pub fn decode(raw: &str) -> Result<SessionRecord> {
    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|e| Error::Codec(format!("decoding record: {e}")))?;
    if envelope.v != RECORD_VERSION {
        return Err(Error::Codec(format!(
            "unsupported record version {} (expected {RECORD_VERSION})",
            envelope.v
        )));
    }
    Ok(envelope.record)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
