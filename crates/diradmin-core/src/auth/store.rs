use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use keyring::Entry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Token file name in the data directory
const TOKEN_FILE: &str = "tokens.json";

/// Keychain service name
const SERVICE_NAME: &str = "diradmin";

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse token file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("No credential pair stored")]
    Missing,
}

/// Access/refresh token pair. Both values are opaque bearer strings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl CredentialPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Durable storage for the credential pair.
///
/// Implementations keep both tokens together: `load` returns `None` unless
/// both are present.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError>;

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;

    /// Replace the access token, keeping the stored refresh token.
    fn save_access_token(&self, access_token: &str) -> Result<(), StoreError> {
        let mut pair = self.load()?.ok_or(StoreError::Missing)?;
        pair.access_token = access_token.to_string();
        self.save(&pair)
    }
}

// ============================================================================
// File store
// ============================================================================

/// On-disk layout. Either key may be missing in a hand-edited file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(rename = "accessToken", default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// Token pair stored as JSON in the data directory.
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn io_error(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| Self::io_error(&path, e))?;
        let file: TokenFile = serde_json::from_str(&contents)?;

        match (file.access_token, file.refresh_token) {
            (Some(access), Some(refresh)) => Ok(Some(CredentialPair::new(access, refresh))),
            _ => {
                debug!(?path, "Token file holds an incomplete pair, treating as absent");
                Ok(None)
            }
        }
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Self::io_error(&self.dir, e))?;

        let path = self.path();
        let tmp = path.with_extension("json.tmp");
        let contents = serde_json::to_string_pretty(pair)?;
        std::fs::write(&tmp, contents).map_err(|e| Self::io_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| Self::io_error(&path, e))?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| Self::io_error(&path, e))?;
        }
        Ok(())
    }
}

// ============================================================================
// Keychain store
// ============================================================================

/// Token pair stored in the OS keychain, one entry per key.
pub struct KeyringTokenStore;

impl KeyringTokenStore {
    fn entry(key: &str) -> Result<Entry, StoreError> {
        Ok(Entry::new(SERVICE_NAME, key)?)
    }

    fn read(key: &str) -> Result<Option<String>, StoreError> {
        match Self::entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remove(key: &str) -> Result<(), StoreError> {
        match Self::entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        let access = Self::read(ACCESS_TOKEN_KEY)?;
        let refresh = Self::read(REFRESH_TOKEN_KEY)?;
        Ok(access
            .zip(refresh)
            .map(|(access, refresh)| CredentialPair::new(access, refresh)))
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        Self::entry(ACCESS_TOKEN_KEY)?.set_password(&pair.access_token)?;
        if let Err(e) = Self::entry(REFRESH_TOKEN_KEY)?.set_password(&pair.refresh_token) {
            // Do not leave a lone access token behind
            let _ = Self::remove(ACCESS_TOKEN_KEY);
            return Err(e.into());
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        Self::remove(ACCESS_TOKEN_KEY)?;
        Self::remove(REFRESH_TOKEN_KEY)
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// In-process store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    pair: Mutex<Option<CredentialPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: Mutex::new(Some(pair)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<CredentialPair>, StoreError> {
        Ok(self.pair.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, pair: &CredentialPair) -> Result<(), StoreError> {
        *self.pair.lock().unwrap_or_else(|e| e.into_inner()) = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.pair.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
