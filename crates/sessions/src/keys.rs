//! Key-pair generation for the initiator side of a session.
//!
//! The service never encrypts anything itself; it only mints a key pair per
//! session and hands the public half to both peers.

use x25519_dalek::{PublicKey, StaticSecret};

/// Hex-encoded asymmetric key pair.
#[derive(Clone)]
pub struct KeyPair {
    pub public_hex: String,
    pub private_hex: String,
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_hex", &self.public_hex)
            .field("private_hex", &"<redacted>")
            .finish()
    }
}

pub trait KeyPairGenerator: Send + Sync {
    fn generate(&self) -> KeyPair;
}

/// Curve25519 key pairs, the same shape a `crypto_box` peer expects
/// (32-byte keys, 64 hex characters each).
#[derive(Debug, Default, Clone, Copy)]
pub struct X25519KeyGenerator;

impl KeyPairGenerator for X25519KeyGenerator {
    fn generate(&self) -> KeyPair {
        let bytes: [u8; 32] = rand::random();
        let secret = StaticSecret::from(bytes);
        let public = PublicKey::from(&secret);
        KeyPair {
            public_hex: hex::encode(public.as_bytes()),
            private_hex: hex::encode(secret.to_bytes()),
        }
    }
}
