//! App registration and authorization key storage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use tglog_shared::AuthKey;

use crate::error::{Result, StoreError};

/// App registration issued by the service (`api_id` / `api_hash`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppCredentials {
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub hash: String,
    /// `host[:port]`. Empty means the service's default data center.
    #[serde(default)]
    pub data_center: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default)]
    pub app: AppCredentials,
    #[serde(default)]
    pub auth_key: Option<AuthKey>,
}

impl Credentials {
    /// The authorization key, when the account has been signed in.
    pub fn auth_key(&self) -> Option<&AuthKey> {
        self.auth_key.as_ref().filter(|key| !key.is_empty())
    }

    pub fn require_auth_key(&self) -> Result<&AuthKey> {
        self.auth_key().ok_or(StoreError::NotLoggedIn)
    }

    pub fn data_center(&self) -> Option<&str> {
        let dc = self.app.data_center.trim();
        (!dc.is_empty()).then_some(dc)
    }
}

/// Persistent home of the [`Credentials`].
pub trait CredentialStore {
    /// `None` when nothing has been stored yet.
    fn read(&self) -> Result<Option<Credentials>>;

    fn write(&self, credentials: &Credentials) -> Result<()>;
}

/// Credentials kept as pretty-printed JSON in `<dir>/config.json`.
#[derive(Debug, Clone)]
pub struct JsonCredentialStore {
    path: PathBuf,
}

impl JsonCredentialStore {
    pub const FILE_NAME: &'static str = "config.json";

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for JsonCredentialStore {
    fn read(&self) -> Result<Option<Credentials>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No credential file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let credentials: Credentials = serde_json::from_str(&raw)?;
        if let Some(key) = credentials.auth_key() {
            hex::decode(&key.id)?;
            hex::decode(&key.value)?;
        }
        Ok(Some(credentials))
    }

    fn write(&self, credentials: &Credentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(credentials)?;
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), "Credentials updated");
        Ok(())
    }
}
