//! Error types for multi-signature operations

use thiserror::Error;

use crate::nonce::NonceIdentity;

/// Result type alias for multi-signature operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during protocol execution
///
/// Every error is fatal to the current operation. Nothing is retried
/// internally; a violated precondition halts the round.
#[derive(Debug, Error)]
pub enum Error {
    /// Fewer participants than the operation requires
    #[error("at least {required} participants required, got {actual}")]
    InsufficientParticipants { required: usize, actual: usize },

    /// Malformed aggregation secret
    #[error("invalid aggregation secret: {0}")]
    InvalidSecret(#[from] SecretError),

    /// Signing attempted before a nonce round was opened for this key
    #[error("nonces must be exchanged before signing (identity {0})")]
    NoncesNotExchanged(NonceIdentity),

    /// Nonce lookup for a key with no open round
    #[error("no open nonce round for identity {0}")]
    NoncesNotFound(NonceIdentity),

    /// Supplied public-nonce set does not contain the signer's own commitment
    #[error("supplied public nonces do not include the signer's committed nonce")]
    InvalidNonces,

    /// Malformed persisted nonce-store payload
    #[error("invalid nonce store state: {0}")]
    InvalidState(String),

    /// Malformed point encoding
    #[error("invalid point encoding: {0}")]
    InvalidPoint(String),

    /// Malformed scalar encoding
    #[error("invalid scalar encoding: {0}")]
    InvalidScalar(String),

    /// Cryptographic operation failed
    #[error("cryptographic error: {0}")]
    Crypto(String),

    /// Rejection sampling exhausted its retry budget
    #[error("randomness source failed to produce a valid scalar")]
    RandomnessExhausted,
}

/// Why an aggregation secret was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SecretError {
    #[error("secret cannot be empty")]
    Empty,

    #[error("secret must be a hex string")]
    NotHex,

    #[error("secret must be 33 bytes or less, got {0}")]
    TooLong(usize),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidState(e.to_string())
    }
}
