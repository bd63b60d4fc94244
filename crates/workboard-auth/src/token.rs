//! Session refresh endpoint call
//!
//! One network interaction: POST the refresh token to the refresh endpoint
//! and receive a replacement credential pair. Called at request time when a
//! 401 reveals a stale token, and proactively by the expiry scheduler; both
//! paths funnel through the refresh coordinator so at most one call is ever
//! in flight.

use serde::{Deserialize, Serialize};

use crate::constants::REFRESH_PATH;
use crate::error::{Error, Result};

/// A replacement credential pair from the refresh endpoint.
///
/// Both fields are opaque bearer strings. The pair always replaces the
/// stored credentials wholesale; the refresh token rotates along with the
/// access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Exchange a refresh token for a new credential pair.
///
/// Anything other than a 200 with a well-formed pair is a refresh failure;
/// the caller treats it as terminal for the session.
pub async fn refresh_session(
    client: &reqwest::Client,
    base_url: &str,
    refresh_token: &str,
) -> Result<TokenPair> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), REFRESH_PATH);
    let response = client
        .post(&url)
        .json(&RefreshRequest { refresh_token })
        .send()
        .await
        .map_err(|e| Error::RefreshRequestFailed(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::RefreshRequestFailed(format!(
            "refresh endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<TokenPair>()
        .await
        .map_err(|e| Error::RefreshRequestFailed(format!("invalid refresh response: {e}")))
}
