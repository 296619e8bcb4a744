//! Session lifecycle for peerbeacon.
//!
//! A sharing session is created by the initiator, advanced through
//! `initiated → ready → connected → completed` (or `error`) by both peers,
//! watched by polling, and dropped when its TTL runs out.  The store is the
//! only shared state; every mutation is a whole-record rewrite that refreshes
//! the TTL.

pub mod clock;
pub mod file_store;
pub mod identity;
pub mod keys;
pub mod lifecycle;
pub mod record;
pub mod store;
pub mod watch;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file_store::FileStore;
pub use keys::{KeyPair, KeyPairGenerator, X25519KeyGenerator};
pub use lifecycle::{LifecycleManager, StatusUpdate};
pub use record::{FileMetadata, SessionRecord, SessionStatus, SessionSummary, SessionView};
pub use store::{MemoryStore, SessionStore};
pub use watch::{StatusSnapshot, StatusSubscription, WatchEvent};
