//! Identifier derivation: session ids, placeholder info hashes and client
//! fingerprints.
//!
//! Everything here is a SHA-256 digest over concatenated seed parts,
//! truncated to the width the caller needs.  Session ids are therefore
//! unique only with high probability (64 bits of digest).

use sha2::{Digest, Sha256};

/// Hex characters kept for a session id.
pub const SESSION_ID_LEN: usize = 16;

/// Hex characters in a BitTorrent v1 info hash.
pub const INFO_HASH_LEN: usize = 40;

/// Hex characters of the hashed client address folded into a fingerprint.
const ADDR_HASH_LEN: usize = 8;

/// Deterministic hex digest over `parts`, fed in order with no separator.
pub fn derive(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Opaque per-client fingerprint: the user agent followed by a short hash of
/// the client address.  The raw address never ends up in a session id seed.
pub fn client_fingerprint(user_agent: &str, client_addr: &str) -> String {
    let addr_hash = derive(&[client_addr]);
    format!("{user_agent}{}", &addr_hash[..ADDR_HASH_LEN])
}

/// Session id from `(fingerprint, timestamp, salt)`.
pub fn session_id(fingerprint: &str, now_ms: i64, salt: &str) -> String {
    let mut id = derive(&[fingerprint, &now_ms.to_string(), salt]);
    id.truncate(SESSION_ID_LEN);
    id
}

/// Placeholder torrent info hash handed out until the initiator reports the
/// real one.
pub fn placeholder_info_hash(session_id: &str, file_name: &str, now_ms: i64) -> String {
    let mut hash = derive(&[&format!("{session_id}:{file_name}:{now_ms}")]);
    hash.truncate(INFO_HASH_LEN);
    hash
}

/// Fresh random salt for [`session_id`].
pub fn random_salt() -> String {
    hex::encode(rand::random::<[u8; 8]>())
}
