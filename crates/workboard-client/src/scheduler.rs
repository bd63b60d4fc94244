//! Proactive expiry scheduling
//!
//! Checks the stored access token once at startup and then on a fixed
//! interval, refreshing through the shared coordinator before callers can
//! run into a 401. The task is abortable; a refresh already in flight when
//! the task stops is settled (or discarded) by the coordinator on its own.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use workboard_auth::{CredentialKey, TokenValidity, classify, unix_millis};

use crate::coordinator::RefreshCoordinator;

/// Handle to the spawned expiry task. Dropping it stops the task.
pub struct ExpiryTask {
    handle: JoinHandle<()>,
}

impl ExpiryTask {
    /// Stop the periodic check. Idempotent; does not cancel a refresh call
    /// the coordinator already issued.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ExpiryTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawn the periodic expiry check.
///
/// The first tick fires immediately (the startup check), then every
/// `interval`. Shares the coordinator's single-flight state with the
/// request path: a cycle may become the refresher or park behind one.
pub fn spawn_expiry_task(
    coordinator: Arc<RefreshCoordinator>,
    interval: Duration,
    threshold: Duration,
) -> ExpiryTask {
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            check_and_refresh(&coordinator, threshold).await;
        }
    });
    ExpiryTask { handle }
}

/// Run one expiry check: refresh iff the stored token is within `threshold`
/// of its expiry (or undecodable).
///
/// Returns true on success, including "no refresh needed" and "logged out";
/// false when the refresh failed. The coordinator's failure path has
/// already cleared the session and notified the terminator by then.
pub async fn check_and_refresh(coordinator: &RefreshCoordinator, threshold: Duration) -> bool {
    let token = coordinator.credential_store().get(CredentialKey::AccessToken);
    match classify(token.as_deref(), unix_millis(), threshold) {
        TokenValidity::Absent => {
            debug!("no access token stored, skipping expiry check");
            true
        }
        TokenValidity::Valid => {
            debug!("access token still valid");
            true
        }
        validity => {
            info!(validity = validity.label(), "access token near expiry, refreshing");
            match coordinator.refresh().await {
                Ok(_) => true,
                Err(error) => {
                    warn!(error = %error, "proactive refresh failed");
                    false
                }
            }
        }
    }
}
