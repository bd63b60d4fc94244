//! Authenticated request pipeline for the workboard backend
//!
//! Wraps every outbound API call with bearer authentication, single-flight
//! session refresh, transparent retry after a refresh, and proactive expiry
//! scheduling. The UI issues requests through [`ApiClient`] and reacts to
//! pass/fail outcomes; credential mechanics stay inside this crate.
//!
//! Wiring:
//!
//! ```no_run
//! use std::sync::Arc;
//! use workboard_auth::{CredentialStore, FileStore};
//! use workboard_client::{ApiClient, Config, RefreshCoordinator, spawn_expiry_task};
//!
//! # async fn wire() -> workboard_client::Result<()> {
//! let config = Config::new("https://api.example.com/api")?;
//! let store: Arc<dyn CredentialStore> = Arc::new(FileStore::load("credentials.json".into())?);
//! let coordinator = Arc::new(RefreshCoordinator::new(
//!     reqwest::Client::new(),
//!     config.api_base_url.clone(),
//!     store.clone(),
//!     Arc::new(|| { /* clear UI session state, route to login */ }),
//! ));
//! let client = ApiClient::new(&config, store, coordinator.clone())?;
//! let expiry = spawn_expiry_task(
//!     coordinator,
//!     config.refresh_interval(),
//!     config.expiry_threshold(),
//! );
//!
//! let boards = client.get("/boards").await?;
//! expiry.stop();
//! # Ok(()) }
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod scheduler;

pub use client::ApiClient;
pub use config::Config;
pub use coordinator::{RefreshCoordinator, SessionTerminator};
pub use error::{Error, Result};
pub use scheduler::{ExpiryTask, check_and_refresh, spawn_expiry_task};
