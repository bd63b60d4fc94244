//! Session pipeline constants
//!
//! Reference timings for the proactive refresh path and the route of the
//! refresh endpoint relative to the configured API base URL. The secrets
//! themselves (access/refresh tokens) are managed by the credential store.

use std::time::Duration;

/// Route of the refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// How close to expiry an access token may get before a refresh is due
pub const DEFAULT_EXPIRY_THRESHOLD: Duration = Duration::from_secs(60);

/// Cadence of the proactive expiry check
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
