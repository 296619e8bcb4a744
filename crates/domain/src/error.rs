/// Shared error type used across all peerbeacon crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The session is absent or its TTL elapsed.  The two cases are
    /// deliberately indistinguishable.
    #[error("session not found")]
    NotFound,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("record codec: {0}")]
    Codec(String),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
