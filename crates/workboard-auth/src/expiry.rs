//! Access token expiry decoding and classification
//!
//! The access token is a JWT-style credential: the second dot-separated
//! segment is base64url-encoded JSON carrying an `exp` claim in epoch
//! seconds. A token that cannot be decoded is treated as already expired so
//! the refresh path repairs it instead of surfacing a parse error.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::warn;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct Claims {
    /// Expiry as epoch seconds
    exp: u64,
}

/// Validity of the stored access token at a point in time.
///
/// Transitions: `Valid → ExpiringSoon` through time passage alone (no side
/// effect); `ExpiringSoon`/`Expired` return to `Valid` on a successful
/// refresh; any state collapses to `Absent` on logout or refresh failure,
/// terminal until the next login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenValidity {
    Valid,
    ExpiringSoon,
    Expired,
    Absent,
}

impl TokenValidity {
    /// Whether this state calls for a refresh attempt.
    pub fn needs_refresh(self) -> bool {
        matches!(self, TokenValidity::ExpiringSoon | TokenValidity::Expired)
    }

    /// Status label for logging.
    pub fn label(self) -> &'static str {
        match self {
            TokenValidity::Valid => "valid",
            TokenValidity::ExpiringSoon => "expiring_soon",
            TokenValidity::Expired => "expired",
            TokenValidity::Absent => "absent",
        }
    }
}

/// Extract the expiry instant from an access token, as epoch milliseconds.
pub fn decode_expiry_millis(token: &str) -> Result<u64> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::MalformedTokenPayload("missing payload segment".into()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::MalformedTokenPayload(format!("payload is not base64url: {e}")))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| Error::MalformedTokenPayload(format!("payload is not a claims object: {e}")))?;
    Ok(claims.exp.saturating_mul(1000))
}

/// Classify the stored access token at `now_millis`.
///
/// A token within `threshold` of its expiry is `ExpiringSoon`: refresh is due
/// iff `now >= expiry - threshold`. An undecodable token classifies as
/// `Expired` so the next refresh replaces it rather than failing the caller.
pub fn classify(token: Option<&str>, now_millis: u64, threshold: Duration) -> TokenValidity {
    let Some(token) = token else {
        return TokenValidity::Absent;
    };
    let expiry = match decode_expiry_millis(token) {
        Ok(expiry) => expiry,
        Err(e) => {
            warn!(error = %e, "access token undecodable, treating as expired");
            return TokenValidity::Expired;
        }
    };
    let threshold_millis = threshold.as_millis() as u64;
    if now_millis >= expiry {
        TokenValidity::Expired
    } else if now_millis + threshold_millis >= expiry {
        TokenValidity::ExpiringSoon
    } else {
        TokenValidity::Valid
    }
}

/// Current wall clock as epoch milliseconds.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
