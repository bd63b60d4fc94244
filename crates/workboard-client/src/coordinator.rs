//! Single-flight session refresh
//!
//! At most one refresh network call is in flight at any moment. The first
//! caller to observe a stale session becomes the refresher; every caller
//! arriving while it runs is parked as a pending waiter and receives the
//! refresher's outcome: the same new access token, or the same terminal
//! error. Only this module sets or clears the `refreshing` flag and drains
//! the queue; the request pipeline and the expiry scheduler go through
//! `refresh()` and never touch the state directly.

use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};
use tracing::{debug, error, info, warn};

use workboard_auth::{CredentialKey, CredentialStore, Error, Result, refresh_session};

use crate::metrics;

/// Invoked exactly once when a refresh failure ends the session.
///
/// The collaborator is expected to clear UI session state and route the
/// user back to login. Closures implement the trait directly.
pub trait SessionTerminator: Send + Sync {
    fn terminate(&self);
}

impl<F: Fn() + Send + Sync> SessionTerminator for F {
    fn terminate(&self) {
        self()
    }
}

type PendingWaiter = oneshot::Sender<Result<String>>;

/// Ephemeral refresh state. Waiters are non-empty only while `refreshing`
/// is set; both are cleared in the same critical section when the in-flight
/// call settles.
#[derive(Default)]
struct RefreshState {
    refreshing: bool,
    waiters: Vec<PendingWaiter>,
}

/// Owner of the single-flight refresh state.
///
/// One instance is constructed at startup and shared (via `Arc`) by the
/// request pipeline and the expiry scheduler, so the reactive and proactive
/// paths coordinate through the same flag and queue. The credential store
/// stays the single source of truth for token data.
pub struct RefreshCoordinator {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    terminator: Arc<dyn SessionTerminator>,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        terminator: Arc<dyn SessionTerminator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            store,
            terminator,
            state: Mutex::new(RefreshState::default()),
        }
    }

    /// The credential store backing this session.
    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Obtain a fresh access token, refreshing at most once concurrently.
    ///
    /// If a refresh is already in flight the caller is parked until it
    /// settles; otherwise the caller drives the refresh itself. Parked
    /// callers never issue a second network call.
    pub async fn refresh(&self) -> Result<String> {
        let rx = {
            let mut state = self.state.lock().await;
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push(tx);
                debug!(queued = state.waiters.len(), "refresh in flight, parking caller");
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        match rx {
            Some(rx) => match rx.await {
                Ok(outcome) => outcome,
                // The refresher can only vanish if its task was dropped
                // mid-refresh; report a failed refresh rather than hang.
                Err(_) => Err(Error::RefreshRequestFailed(
                    "refresh task dropped before settling".into(),
                )),
            },
            None => self.run_refresh().await,
        }
    }

    /// Drive the refresh network call. Only ever entered by the single
    /// refresher; the lock is not held across the call.
    async fn run_refresh(&self) -> Result<String> {
        let Some(refresh_token) = self.store.get(CredentialKey::RefreshToken) else {
            warn!("refresh requested but no refresh token is stored");
            return Err(self.fail(Error::NoRefreshToken).await);
        };

        match refresh_session(&self.http, &self.base_url, &refresh_token).await {
            Ok(pair) => {
                // A logout may have raced the network call; a stale result
                // must not resurrect the session or clobber a newer login.
                if self.store.get(CredentialKey::RefreshToken).as_deref()
                    != Some(refresh_token.as_str())
                {
                    info!("session closed while refresh was in flight, discarding result");
                    metrics::record_refresh("stale");
                    let error = Error::NoRefreshToken;
                    self.settle(Err(error.clone())).await;
                    return Err(error);
                }

                self.store
                    .set(CredentialKey::AccessToken, pair.access_token.clone());
                self.store
                    .set(CredentialKey::RefreshToken, pair.refresh_token);
                let woken = self.settle(Ok(pair.access_token.clone())).await;
                info!(woken, "session credentials refreshed");
                metrics::record_refresh("success");
                Ok(pair.access_token)
            }
            Err(error) => Err(self.fail(error).await),
        }
    }

    /// Terminal failure path: clear the session once, broadcast the
    /// identical error to every waiter, and notify the terminator.
    async fn fail(&self, error: Error) -> Error {
        error!(error = %error, "session refresh failed, terminating session");
        self.store.remove(CredentialKey::AccessToken);
        self.store.remove(CredentialKey::RefreshToken);
        self.settle(Err(error.clone())).await;
        metrics::record_refresh("failure");
        metrics::record_termination();
        self.terminator.terminate();
        error
    }

    /// Clear `refreshing` and deliver one outcome to every parked waiter,
    /// in arrival order.
    async fn settle(&self, outcome: Result<String>) -> usize {
        let waiters = {
            let mut state = self.state.lock().await;
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };
        let woken = waiters.len();
        for waiter in waiters {
            // A waiter whose task has since been dropped is fine to skip
            let _ = waiter.send(outcome.clone());
        }
        woken
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use workboard_auth::MemoryStore;

    fn counting_terminator() -> (Arc<AtomicUsize>, Arc<dyn SessionTerminator>) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = count.clone();
        let terminator: Arc<dyn SessionTerminator> = Arc::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        (count, terminator)
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_network() {
        // Base URL points at a closed port: any network attempt would fail
        // with a different error than the one asserted here
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::new());
        store.set(CredentialKey::AccessToken, "at_only".into());
        let (terminations, terminator) = counting_terminator();
        let coordinator = RefreshCoordinator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            store.clone(),
            terminator,
        );

        let result = coordinator.refresh().await;
        assert!(matches!(result, Err(Error::NoRefreshToken)));
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(store.get(CredentialKey::AccessToken).is_none());
        assert!(store.get(CredentialKey::RefreshToken).is_none());
    }

    #[tokio::test]
    async fn transport_failure_clears_session_and_terminates_once() {
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_pair("at_1", "rt_1"));
        let (terminations, terminator) = counting_terminator();
        let coordinator = RefreshCoordinator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            store.clone(),
            terminator,
        );

        let result = coordinator.refresh().await;
        assert!(matches!(result, Err(Error::RefreshRequestFailed(_))));
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert!(store.get(CredentialKey::AccessToken).is_none());
        assert!(store.get(CredentialKey::RefreshToken).is_none());
    }

    #[tokio::test]
    async fn state_is_clean_after_a_failed_refresh() {
        // A dangling `refreshing` flag would park the second call forever;
        // reaching a second terminal error proves the flag was cleared
        let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_pair("at_1", "rt_1"));
        let (terminations, terminator) = counting_terminator();
        let coordinator = RefreshCoordinator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            store,
            terminator,
        );

        assert!(coordinator.refresh().await.is_err());
        let result = coordinator.refresh().await;
        assert!(matches!(result, Err(Error::NoRefreshToken)));
        assert_eq!(terminations.load(Ordering::SeqCst), 2);
    }
}
