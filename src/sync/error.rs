//! Error types for the sync client and its transport.

use crate::cipher::CipherError;
use crate::document::DocumentError;
use crate::store::StoreError;

/// Errors reported by a [`super::Remote`].
#[derive(Debug)]
pub enum RemoteError {
    /// The session token or credentials were rejected.
    Unauthorized,
    /// Account creation hit an already-registered fingerprint.
    AccountExists,
    /// The requested secret (or resource) does not exist.
    NotFound(String),
    /// Network-level failure reaching the remote.
    Transport(String),
    /// The remote answered with something outside its contract.
    Protocol(String),
}

impl RemoteError {
    /// Maps a remote's `error` string onto a variant.
    pub fn classify(error: &str) -> Self {
        let lower = error.to_lowercase();
        if lower.contains("unauthorized") {
            RemoteError::Unauthorized
        } else if lower.contains("already exists") || lower.contains("duplicate") {
            RemoteError::AccountExists
        } else if lower.contains("not found") {
            RemoteError::NotFound(error.to_string())
        } else {
            RemoteError::Protocol(error.to_string())
        }
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::Unauthorized => write!(f, "Unauthorized"),
            RemoteError::AccountExists => write!(f, "Account already exists"),
            RemoteError::NotFound(what) => write!(f, "Not found on remote: {}", what),
            RemoteError::Transport(e) => write!(f, "Transport error: {}", e),
            RemoteError::Protocol(e) => write!(f, "Remote protocol error: {}", e),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Errors from a sync attempt. A failed attempt never leaves the local
/// store partially written.
#[derive(Debug)]
pub enum SyncError {
    /// Authentication did not produce a usable session.
    AuthFailed(String),
    Remote(RemoteError),
    Cipher(CipherError),
    Document(DocumentError),
    Store(StoreError),
    Prompt(std::io::Error),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::AuthFailed(e) => write!(f, "Authentication failed: {}", e),
            SyncError::Remote(e) => write!(f, "{}", e),
            SyncError::Cipher(e) => write!(f, "{}", e),
            SyncError::Document(e) => write!(f, "{}", e),
            SyncError::Store(e) => write!(f, "{}", e),
            SyncError::Prompt(e) => write!(f, "Prompt error: {}", e),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncError::AuthFailed(_) => None,
            SyncError::Remote(e) => Some(e),
            SyncError::Cipher(e) => Some(e),
            SyncError::Document(e) => Some(e),
            SyncError::Store(e) => Some(e),
            SyncError::Prompt(e) => Some(e),
        }
    }
}

impl From<RemoteError> for SyncError {
    fn from(e: RemoteError) -> Self {
        SyncError::Remote(e)
    }
}

impl From<CipherError> for SyncError {
    fn from(e: CipherError) -> Self {
        SyncError::Cipher(e)
    }
}

impl From<DocumentError> for SyncError {
    fn from(e: DocumentError) -> Self {
        SyncError::Document(e)
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        SyncError::Store(e)
    }
}
