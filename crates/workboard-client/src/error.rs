//! Error types for the request pipeline

use thiserror::Error;

/// Errors surfaced to callers of the request pipeline.
///
/// Terminal refresh outcomes arrive through the `Auth` variant; a non-401
/// response is not an error and is returned to the caller unchanged.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Auth(#[from] workboard_auth::Error),

    #[error("request failed: {0}")]
    Http(String),

    #[error("request rejected again after a refresh-driven retry")]
    RetryExhausted,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
