//! Encrypted session registry for remote servers.
//!
//! Sessions (JWTs) are keyed by remote URL and persisted encrypted for a
//! single identity, so tokens never sit on disk in the clear. A missing
//! or not-yet-encrypted registry file reads as an empty registry.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cipher::{Cipher, CipherError};

/// Per-remote session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    /// Bearer token from the last successful login, if any.
    pub jwt: Option<String>,
}

/// All known remote sessions for one identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteRegistry {
    remotes: BTreeMap<String, RemoteSession>,
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry file for `identity` under `data_dir`.
    pub fn path_for(data_dir: &Path, identity: &str) -> PathBuf {
        data_dir.join(format!("remotes-{}.json.asc", identity))
    }

    /// Loads and decrypts the registry at `path`.
    ///
    /// A missing file, or a file the cipher reports as carrying no
    /// encrypted data, yields an empty registry.
    pub async fn load(path: &Path, cipher: &dyn Cipher) -> Result<Self, RegistryError> {
        let ciphertext = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no registry file, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(RegistryError::Io(e)),
        };

        let plaintext = match cipher.decrypt(&ciphertext) {
            Ok(bytes) => bytes,
            Err(CipherError::NoEncryptedData) => return Ok(Self::new()),
            Err(e) => return Err(RegistryError::Cipher(e)),
        };

        serde_json::from_slice(&plaintext).map_err(RegistryError::Serialization)
    }

    /// Encrypts the registry for `identity` and writes it to `path`.
    pub async fn save(
        &self,
        path: &Path,
        cipher: &dyn Cipher,
        identity: &str,
    ) -> Result<(), RegistryError> {
        let plaintext = serde_json::to_vec_pretty(self).map_err(RegistryError::Serialization)?;
        let ciphertext = cipher.encrypt(identity, &plaintext)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(RegistryError::Io)?;
        }

        tokio::fs::write(path, ciphertext)
            .await
            .map_err(RegistryError::Io)?;
        debug!(path = %path.display(), "saved session registry");

        Ok(())
    }

    /// The stored session for `remote_url`, if any.
    pub fn session(&self, remote_url: &str) -> Option<&RemoteSession> {
        self.remotes.get(remote_url)
    }

    pub fn jwt(&self, remote_url: &str) -> Option<&str> {
        self.session(remote_url).and_then(|s| s.jwt.as_deref())
    }

    pub fn set_jwt(&mut self, remote_url: &str, jwt: String) {
        self.remotes
            .entry(remote_url.to_string())
            .or_default()
            .jwt = Some(jwt);
    }

    /// Drops the token for `remote_url`, keeping the remote known.
    pub fn clear_jwt(&mut self, remote_url: &str) {
        if let Some(session) = self.remotes.get_mut(remote_url) {
            session.jwt = None;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }
}

/// Errors from registry load/save.
#[derive(Debug)]
pub enum RegistryError {
    Cipher(CipherError),
    Serialization(serde_json::Error),
    Io(io::Error),
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::Cipher(e) => write!(f, "{}", e),
            RegistryError::Serialization(e) => write!(f, "Registry serialization error: {}", e),
            RegistryError::Io(e) => write!(f, "Registry I/O error: {}", e),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Cipher(e) => Some(e),
            RegistryError::Serialization(e) => Some(e),
            RegistryError::Io(e) => Some(e),
        }
    }
}

impl From<CipherError> for RegistryError {
    fn from(e: CipherError) -> Self {
        RegistryError::Cipher(e)
    }
}
