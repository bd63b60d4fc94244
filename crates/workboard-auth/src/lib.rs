//! Session credential library for the workboard API client
//!
//! Standalone building blocks for the authenticated request pipeline:
//! credential storage behind an injectable trait, access-token expiry
//! decoding, and the refresh endpoint call. This crate has no dependency
//! on the client crate and can be tested and used independently.
//!
//! Credential flow:
//! 1. The application stores a pair at login via `CredentialStore::set`
//! 2. The pipeline attaches the stored access token to outbound requests
//! 3. A 401 or an approaching expiry triggers `refresh_session()`
//! 4. The replacement pair is written back through the store
//! 5. A failed refresh clears the store and ends the session

pub mod constants;
pub mod error;
pub mod expiry;
pub mod store;
pub mod token;

pub use constants::*;
pub use error::{Error, Result};
pub use expiry::{TokenValidity, classify, decode_expiry_millis, unix_millis};
pub use store::{CredentialKey, CredentialStore, FileStore, MemoryStore};
pub use token::{TokenPair, refresh_session};
