//! Remote synchronization of the encrypted document.

pub mod client;
pub mod error;
pub mod remote;

pub use client::{SyncClient, SyncOutcome, SyncReport, DEFAULT_SECRET_NAME};
pub use error::{RemoteError, SyncError};
pub use remote::{HttpRemote, Remote, RemoteSecretInfo};
