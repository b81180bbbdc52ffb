//! Durable storage for the bearer credential.
//!
//! One credential, one fixed key, raw token string with no envelope.
//! Staleness is never detected locally - only a failing identity fetch
//! retires a stored credential.

use std::path::PathBuf;

use anyhow::{Context, Result};
use keyring::Entry;
use parking_lot::Mutex;

/// Keychain service name
const SERVICE_NAME: &str = "paperdesk";

/// Keychain account under which the token is stored
const TOKEN_ACCOUNT: &str = "session-token";

/// Token file name in the config directory (file-backed store)
const TOKEN_FILE: &str = "session-token";

/// Opaque bearer token authorizing requests to the identity service.
///
/// `Debug` is redacted so a credential never lands in logs verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(<{} bytes>)", self.0.len())
    }
}

/// Durable key-value persistence for the single session credential.
///
/// Implementations must survive process restarts (the in-memory backend
/// being the deliberate exception, for tests and ephemeral sessions).
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<Credential>>;
    fn set(&self, credential: &Credential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

// ============================================================================
// OS keychain backend
// ============================================================================

/// Credential storage in the OS keychain.
pub struct KeyringCredentialStore;

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self
    }

    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, TOKEN_ACCOUNT).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        match Self::entry()?.get_password() {
            Ok(token) => Ok(Some(Credential::new(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        Self::entry()?
            .set_password(credential.as_str())
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

// ============================================================================
// File backend
// ============================================================================

/// Credential storage in a flat file under the platform config directory.
///
/// Fallback for hosts without a usable keychain. The file holds the raw
/// token string and nothing else.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store under `<config_dir>/paperdesk/session-token`.
    pub fn default_location() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(Self::new(config_dir.join(SERVICE_NAME).join(TOKEN_FILE)))
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = std::fs::read_to_string(&self.path).context("Failed to read token file")?;
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Credential::new(token)))
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create token directory")?;
        }
        std::fs::write(&self.path, credential.as_str()).context("Failed to write token file")
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Non-durable store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<Credential>> {
        Ok(self.token.lock().clone())
    }

    fn set(&self, credential: &Credential) -> Result<()> {
        *self.token.lock() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock() = None;
        Ok(())
    }
}
