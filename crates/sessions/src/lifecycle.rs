//! Session lifecycle: create, describe, advance and read sharing sessions.
//!
//! Every operation is a read-modify-write of the whole record against the
//! injected [`SessionStore`].  There is no locking: two concurrent updates to
//! the same session race in the store and the last write wins.

use std::sync::Arc;
use std::time::Duration;

use pb_domain::config::ShareConfig;
use pb_domain::error::{Error, Result};
use pb_domain::trace::TraceEvent;

use crate::clock::{deadline_ms, Clock, SystemClock};
use crate::identity;
use crate::keys::{KeyPairGenerator, X25519KeyGenerator};
use crate::record::{
    self, FileMetadata, SessionRecord, SessionStatus, SessionSummary, SessionView,
};
use crate::store::SessionStore;

/// Status report from either peer.  Absent counters keep their stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: SessionStatus,
    pub peers: Option<u32>,
    pub progress: Option<u32>,
}

impl StatusUpdate {
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status,
            peers: None,
            progress: None,
        }
    }
}

/// Gate for every status change.
///
/// Clients self-report their state, so any move is accepted today, including
/// moves out of `completed`/`error`.  A stricter table belongs here.
pub fn permit_transition(_from: SessionStatus, _to: SessionStatus) -> Result<()> {
    Ok(())
}

pub struct LifecycleManager {
    config: ShareConfig,
    store: Arc<dyn SessionStore>,
    keys: Arc<dyn KeyPairGenerator>,
    clock: Arc<dyn Clock>,
}

impl LifecycleManager {
    pub fn new(config: ShareConfig, store: Arc<dyn SessionStore>) -> Self {
        Self {
            config,
            store,
            keys: Arc::new(X25519KeyGenerator),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for record timestamps.  Give the store the same clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_key_generator(mut self, keys: Arc<dyn KeyPairGenerator>) -> Self {
        self.keys = keys;
        self
    }

    pub fn config(&self) -> &ShareConfig {
        &self.config
    }

    fn ttl(&self) -> Duration {
        self.config.session_ttl()
    }

    pub(crate) fn key(&self, session_id: &str) -> String {
        format!("{}{session_id}", self.config.key_prefix)
    }

    // ── Store access ──────────────────────────────────────────────────

    /// Fetch a live record.  Expired and missing look the same.
    pub(crate) async fn load(&self, session_id: &str) -> Result<SessionRecord> {
        if session_id.is_empty() {
            return Err(Error::invalid("sessionId must not be empty"));
        }
        let raw = self
            .store
            .get(&self.key(session_id))
            .await?
            .ok_or(Error::NotFound)?;
        let record = record::decode(&raw)?;
        if !record.is_live_at(self.clock.now_ms()) {
            return Err(Error::NotFound);
        }
        Ok(record)
    }

    /// Replace the whole record and restart its TTL.
    async fn save(&self, record: &mut SessionRecord) -> Result<()> {
        record.expires_at = deadline_ms(self.clock.now_ms(), self.ttl());
        let raw = record::encode(record)?;
        self.store
            .put(&self.key(&record.session_id), raw, self.ttl())
            .await
    }

    // ── Operations ────────────────────────────────────────────────────

    /// Start a sharing session for the client identified by `fingerprint`.
    pub async fn create_session(
        &self,
        fingerprint: &str,
        file_metadata: FileMetadata,
    ) -> Result<SessionSummary> {
        file_metadata.validate()?;

        let now = self.clock.now_ms();
        let session_id = identity::session_id(fingerprint, now, &identity::random_salt());
        let key_pair = self.keys.generate();
        let torrent_info_hash =
            identity::placeholder_info_hash(&session_id, &file_metadata.name, now);

        let mut record = SessionRecord {
            session_id: session_id.clone(),
            public_key: key_pair.public_hex,
            private_key: key_pair.private_hex,
            torrent_info_hash,
            magnet_uri: None,
            file_metadata,
            status: SessionStatus::Initiated,
            peers: None,
            progress: None,
            created_at: now,
            expires_at: now,
        };
        self.save(&mut record).await?;

        TraceEvent::SessionCreated {
            session_id: session_id.clone(),
            file_size: record.file_metadata.size,
            expires_at: record.expires_at,
        }
        .emit();

        Ok(SessionSummary {
            shareable_link: format!(
                "{}/receive/{session_id}",
                self.config.frontend_url.trim_end_matches('/')
            ),
            session_id,
            public_key: record.public_key,
            torrent_info_hash: record.torrent_info_hash,
            expires_at: record.expires_at,
        })
    }

    /// Record the real torrent descriptor and mark the session `ready`.
    ///
    /// The move to `ready` happens whatever the current status is, so a
    /// `connected` or `completed` session goes back to `ready`.
    pub async fn update_torrent(
        &self,
        session_id: &str,
        torrent_info_hash: &str,
        magnet_uri: &str,
    ) -> Result<()> {
        if torrent_info_hash.is_empty() {
            return Err(Error::invalid("torrentInfoHash must not be empty"));
        }
        if magnet_uri.is_empty() {
            return Err(Error::invalid("magnetUri must not be empty"));
        }

        let mut record = self.load(session_id).await?;
        let previous = record.status;
        permit_transition(previous, SessionStatus::Ready)?;

        record.torrent_info_hash = torrent_info_hash.to_owned();
        record.magnet_uri = Some(magnet_uri.to_owned());
        record.status = SessionStatus::Ready;
        self.save(&mut record).await?;

        TraceEvent::TorrentDescriptorUpdated {
            session_id: session_id.to_owned(),
            previous_status: previous.to_string(),
        }
        .emit();
        Ok(())
    }

    /// Receiver-facing view of a session.
    pub async fn get_session_info(&self, session_id: &str) -> Result<SessionView> {
        Ok(self.load(session_id).await?.view())
    }

    /// Overwrite the status and whichever counters are present.
    pub async fn update_status(&self, session_id: &str, update: StatusUpdate) -> Result<()> {
        let mut record = self.load(session_id).await?;
        let previous = record.status;
        permit_transition(previous, update.status)?;

        record.status = update.status;
        if let Some(peers) = update.peers {
            record.peers = Some(peers);
        }
        if let Some(progress) = update.progress {
            record.progress = Some(progress);
        }
        self.save(&mut record).await?;

        TraceEvent::StatusUpdated {
            session_id: session_id.to_owned(),
            from: previous.to_string(),
            to: update.status.to_string(),
            peers: update.peers,
            progress: update.progress,
        }
        .emit();
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
