//! Error types for the authentication core.
//!
//! Verification failures never surface here: they are folded into
//! [`TokenVerdict`](super::TokenVerdict) at the token service boundary. Only
//! infrastructure failures (keys, persistence) and gate outcomes are errors.

use thiserror::Error;

/// Key or envelope failure inside the payload cipher.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid {kind} key: {reason}")]
    InvalidKey { kind: &'static str, reason: String },

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("malformed envelope: {0}")]
    Malformed(&'static str),

    #[error("decryption failed")]
    Decrypt,
}

/// Persistence unavailable or rejected the operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate {0}")]
    Conflict(&'static str),
}

/// Failure to mint a token.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("cannot issue a token without a subject")]
    EmptySubject,

    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why the gate refused to authenticate a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissingCredentials,
    Expired,
    Invalid,
    Replayed,
    UnknownSubject,
}

/// Terminal failure states of the authentication gate.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("please login again")]
    LoginRequired(RejectReason),

    #[error("error while creating and setting tokens")]
    SessionUnavailable,

    #[error("you are not allowed to access this resource")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}
