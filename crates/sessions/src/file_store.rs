//! File-backed session store.
//!
//! Keeps the live map in memory and writes a JSON snapshot to
//! `sessions/sessions.json` under the configured state path on every put
//! (temp file + rename).  Expired entries are dropped when the snapshot is
//! loaded, so a restart never resurrects a dead session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use pb_domain::error::{Error, Result};

use crate::clock::{Clock, SystemClock};
use crate::store::{get_live, retain_live, SessionStore, TtlEntry};

pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, TtlEntry>>,
    /// Serializes snapshot writes so the file never goes backwards.
    write_lock: tokio::sync::Mutex<()>,
    clock: Arc<dyn Clock>,
}

impl FileStore {
    /// Load or create the store at `state_path/sessions/sessions.json`.
    pub fn open(state_path: &Path) -> Result<Self> {
        Self::open_with_clock(state_path, Arc::new(SystemClock))
    }

    pub fn open_with_clock(state_path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let dir = state_path.join("sessions");
        std::fs::create_dir_all(&dir).map_err(unavailable)?;

        let path = dir.join("sessions.json");
        let mut entries: HashMap<String, TtlEntry> = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(unavailable)?;
            serde_json::from_str(&raw).map_err(|e| {
                Error::StorageUnavailable(format!("parsing {}: {e}", path.display()))
            })?
        } else {
            HashMap::new()
        };
        let dropped = retain_live(&mut entries, clock.now_ms());

        tracing::info!(
            sessions = entries.len(),
            dropped_expired = dropped,
            path = %path.display(),
            "file session store loaded"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
            write_lock: tokio::sync::Mutex::new(()),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot` to disk, off the async executor.
    async fn persist(&self, snapshot: HashMap<String, TtlEntry>) -> Result<()> {
        let json = serde_json::to_string(&snapshot)
            .map_err(|e| Error::StorageUnavailable(format!("serializing sessions: {e}")))?;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomic(&path, json.as_bytes()))
            .await
            .map_err(|e| Error::StorageUnavailable(format!("persist task failed: {e}")))?
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    if let Err(e) = std::fs::write(&tmp, bytes) {
        let _ = std::fs::remove_file(&tmp);
        return Err(unavailable(e));
    }
    std::fs::rename(&tmp, path).map_err(unavailable)
}

fn unavailable(e: std::io::Error) -> Error {
    Error::StorageUnavailable(e.to_string())
}

#[async_trait]
impl SessionStore for FileStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let now = self.clock.now_ms();

        let mut next = self.entries.read().clone();
        retain_live(&mut next, now);
        next.insert(key.to_owned(), TtlEntry::new(value, now, ttl));

        // Disk first: a failed write leaves the visible state untouched.
        self.persist(next.clone()).await?;
        *self.entries.write() = next;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(get_live(&self.entries, key, self.clock.now_ms()))
    }

    async fn purge_expired(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let mut next = self.entries.read().clone();
        let removed = retain_live(&mut next, self.clock.now_ms());
        if removed > 0 {
            self.persist(next.clone()).await?;
            *self.entries.write() = next;
        }
        Ok(removed)
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        {
            let store = FileStore::open_with_clock(dir.path(), clock.clone()).unwrap();
            store.put("session:a", "{}".into(), TTL).await.unwrap();
        }
        let reopened = FileStore::open_with_clock(dir.path(), clock).unwrap();
        assert_eq!(reopened.get("session:a").await.unwrap().as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn expired_entries_are_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        {
            let store = FileStore::open_with_clock(dir.path(), clock.clone()).unwrap();
            store.put("session:a", "{}".into(), TTL).await.unwrap();
        }
        clock.advance(TTL);
        let reopened = FileStore::open_with_clock(dir.path(), clock).unwrap();
        assert_eq!(reopened.get("session:a").await.unwrap(), None);
        assert!(reopened.entries.read().is_empty());
    }

    #[tokio::test]
    async fn purge_rewrites_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(ManualClock::new(0));
        let store = FileStore::open_with_clock(dir.path(), clock.clone()).unwrap();
        store.put("gone", "x".into(), Duration::from_secs(1)).await.unwrap();
        store.put("kept", "y".into(), TTL).await.unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("gone"));
        assert!(raw.contains("kept"));
    }

    #[tokio::test]
    async fn unwritable_directory_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        // Replace the sessions directory with a plain file so writes fail.
        let sessions_dir = dir.path().join("sessions");
        std::fs::remove_dir_all(&sessions_dir).unwrap();
        std::fs::write(&sessions_dir, b"not a dir").unwrap();

        let err = store.put("k", "v".into(), TTL).await.unwrap_err();
        assert!(matches!(err, Error::StorageUnavailable(_)));
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[test]
    fn corrupt_snapshot_refuses_to_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sessions")).unwrap();
        std::fs::write(dir.path().join("sessions/sessions.json"), b"{not json").unwrap();
        assert!(matches!(
            FileStore::open(dir.path()),
            Err(Error::StorageUnavailable(_))
        ));
    }
}
