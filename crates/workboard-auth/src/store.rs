//! Session credential storage
//!
//! The pipeline reads and writes tokens through the `CredentialStore` trait
//! so the application can inject its own persistence. Two implementations
//! ship here: an in-memory store for tests and embedders that persist
//! elsewhere, and a JSON file store with atomic writes. The store is the
//! single source of truth for token data; the pipeline reads it at request
//! time and the coordinator replaces the pair wholesale on refresh.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Keys under which the two session credentials are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKey {
    #[serde(rename = "accessToken")]
    AccessToken,
    #[serde(rename = "refreshToken")]
    RefreshToken,
}

impl CredentialKey {
    /// String form, matching the on-disk field names.
    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "accessToken",
            CredentialKey::RefreshToken => "refreshToken",
        }
    }
}

/// Synchronous, process-local credential storage.
///
/// Implementations must tolerate concurrent access from the request
/// pipeline, the refresh coordinator, and the expiry scheduler.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: CredentialKey) -> Option<String>;
    fn set(&self, key: CredentialKey, value: String);
    fn remove(&self, key: CredentialKey);
}

/// In-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<CredentialKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with an existing credential pair.
    pub fn with_pair(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(CredentialKey::AccessToken, access.into());
        store.set(CredentialKey::RefreshToken, refresh.into());
        store
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.get(&key).cloned()
    }

    fn set(&self, key: CredentialKey, value: String) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value);
    }

    fn remove(&self, key: CredentialKey) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&key);
    }
}

/// Credential store backed by a JSON file.
///
/// All writes use an atomic temp-file + rename so a crash mid-write cannot
/// corrupt the file. Permissions are 0600 on unix since the file holds live
/// session tokens. The trait methods are infallible: persistence errors are
/// logged and the in-memory state stays authoritative for the process.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<HashMap<CredentialKey, String>>,
}

impl FileStore {
    /// Load credentials from the given file path.
    ///
    /// A missing file is a cold start: it is created as `{}` and the session
    /// begins logged out.
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::Store(format!("reading credential file: {e}")))?;
            let entries: HashMap<CredentialKey, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::Store(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), "loaded session credentials");
            entries
        } else {
            info!(path = %path.display(), "credential file not found, starting logged out");
            let entries = HashMap::new();
            write_atomic(&path, &entries)?;
            entries
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.get(&key).cloned()
    }

    fn set(&self, key: CredentialKey, value: String) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.insert(key, value);
        if let Err(e) = write_atomic(&self.path, &state) {
            warn!(key = key.as_str(), error = %e, "failed to persist credential");
        }
    }

    fn remove(&self, key: CredentialKey) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.remove(&key).is_some() {
            if let Err(e) = write_atomic(&self.path, &state) {
                warn!(key = key.as_str(), error = %e, "failed to persist credential removal");
            }
        }
    }
}

/// Write credentials to a file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets 0600 permissions (owner read/write only) since the file
/// contains live tokens.
fn write_atomic(path: &Path, entries: &HashMap<CredentialKey, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| Error::Store(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Store("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Store(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Store(format!("setting credential file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Store(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
