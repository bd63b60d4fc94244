//! Error types for session credential operations

/// Errors from credential and refresh operations.
///
/// `Clone` because a single refresh outcome is broadcast to every caller
/// parked behind the in-flight refresh.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("session refresh failed: {0}")]
    RefreshRequestFailed(String),

    #[error("malformed token payload: {0}")]
    MalformedTokenPayload(String),

    #[error("credential store error: {0}")]
    Store(String),
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;
