//! TTL-bounded key-value storage for encoded session records.
//!
//! The lifecycle manager only ever needs `put` and `get`.  Expired keys are
//! removed by the store itself (on access and by `purge_expired`), so a
//! reader never sees a record past its deadline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use pb_domain::error::Result;

use crate::clock::{deadline_ms, Clock, SystemClock};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert `value` under `key`, replacing any running TTL with `ttl`.
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// The live value under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Drop every expired entry and return how many went.  Backends that
    /// expire natively can keep the default.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Shared TTL map
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A stored value with its absolute deadline (epoch milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TtlEntry {
    pub value: String,
    pub expires_at: i64,
}

impl TtlEntry {
    pub fn new(value: String, now_ms: i64, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: deadline_ms(now_ms, ttl),
        }
    }

    pub fn is_live_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at
    }
}

/// Look up `key`, evicting it first if its deadline has passed.
pub(crate) fn get_live(
    map: &RwLock<HashMap<String, TtlEntry>>,
    key: &str,
    now_ms: i64,
) -> Option<String> {
    {
        let entries = map.read();
        match entries.get(key) {
            Some(entry) if entry.is_live_at(now_ms) => return Some(entry.value.clone()),
            Some(_) => {}
            None => return None,
        }
    }
    // Re-check under the write lock: a concurrent put may have refreshed it.
    let mut entries = map.write();
    match entries.get(key) {
        Some(entry) if entry.is_live_at(now_ms) => Some(entry.value.clone()),
        Some(_) => {
            entries.remove(key);
            None
        }
        None => None,
    }
}

pub(crate) fn retain_live(map: &mut HashMap<String, TtlEntry>, now_ms: i64) -> usize {
    let before = map.len();
    map.retain(|_, entry| entry.is_live_at(now_ms));
    before - map.len()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory store
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local store.  Never fails; loses everything on restart.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, TtlEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Number of entries held, expired ones included until swept.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let entry = TtlEntry::new(value, self.clock.now_ms(), ttl);
        self.entries.write().insert(key.to_owned(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(get_live(&self.entries, key, self.clock.now_ms()))
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now_ms();
        Ok(retain_live(&mut self.entries.write(), now))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
