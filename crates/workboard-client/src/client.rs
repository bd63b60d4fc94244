//! Authenticated request pipeline
//!
//! Every outbound call goes through `ApiClient::send`: it attaches the
//! current bearer token, intercepts 401 responses, drives the refresh
//! coordinator, and retries the original request once with the replacement
//! token. A request that is rejected again after its retry surfaces
//! `RetryExhausted` instead of re-entering the refresh path.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use workboard_auth::{CredentialKey, CredentialStore};

use crate::config::Config;
use crate::coordinator::RefreshCoordinator;
use crate::error::{Error, Result};
use crate::metrics;

/// Authenticated HTTP client for the backend API.
///
/// The cached default bearer is set after each successful refresh so
/// subsequently-issued requests skip the store read; the store remains the
/// source of truth whenever no default is cached (startup, or after a
/// terminal failure cleared it).
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
    default_bearer: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("building HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
            store,
            coordinator,
            default_bearer: RwLock::new(None),
        })
    }

    /// Issue an authenticated request, refreshing and retrying once on 401.
    ///
    /// Non-401 responses are returned to the caller unchanged, whatever
    /// their status.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<HeaderMap>,
    ) -> Result<Response> {
        let request_id = format!("req_{}", Uuid::new_v4().as_simple());
        self.send_with_id(method, path, body, headers, request_id)
            .await
    }

    #[instrument(skip_all, fields(request_id = %request_id, method = %method, path = %path))]
    async fn send_with_id(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        headers: Option<HeaderMap>,
        request_id: String,
    ) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let mut bearer = self.current_bearer().await;
        let mut retried = false;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if let Some(headers) = &headers {
                request = request.headers(headers.clone());
            }
            if let Some(body) = body {
                request = request.json(body);
            }
            if let Some(token) = &bearer {
                request = request.bearer_auth(token);
            }

            let response = request.send().await.map_err(|e| {
                error!(error = %e, "request transport failure");
                Error::Http(format!("request to {url} failed: {e}"))
            })?;

            let status = response.status();
            metrics::record_request(method.as_str(), status.as_u16());

            if status != StatusCode::UNAUTHORIZED {
                return Ok(response);
            }
            if retried {
                warn!("rejected again after refresh-driven retry, giving up");
                return Err(Error::RetryExhausted);
            }
            retried = true;

            debug!("401 received, driving session refresh");
            match self.coordinator.refresh().await {
                Ok(token) => {
                    *self.default_bearer.write().await = Some(token.clone());
                    bearer = Some(token);
                }
                Err(error) => {
                    *self.default_bearer.write().await = None;
                    return Err(error.into());
                }
            }
        }
    }

    /// Bearer for the next request: cached default first, store second.
    /// No token is not an error; the request goes out unauthenticated.
    async fn current_bearer(&self) -> Option<String> {
        if let Some(token) = self.default_bearer.read().await.clone() {
            return Some(token);
        }
        self.store.get(CredentialKey::AccessToken)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.send(Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        self.send(Method::POST, path, Some(body), None).await
    }

    pub async fn put(&self, path: &str, body: &serde_json::Value) -> Result<Response> {
        self.send(Method::PUT, path, Some(body), None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.send(Method::DELETE, path, None, None).await
    }
}
