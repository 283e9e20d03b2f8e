//! Tagvault core library
//!
//! A local-first encrypted secret store. Secrets live in a CRDT-backed
//! document that can be merged with independently edited copies, is
//! encrypted at rest, and can be reconciled against a remote server.

pub mod cipher;
pub mod config;
pub mod document;
pub mod models;
pub mod prompt;
pub mod registry;
pub mod store;
pub mod sync;

pub use cipher::{Cipher, CipherError, GpgCipher};
pub use document::{Document, DocumentChange, DocumentError};
pub use models::{gen_password, join_tags, split_tags, SecretRecord};
pub use prompt::{Prompter, StdinPrompter};
pub use registry::{RemoteRegistry, RemoteSession};
pub use store::{DocumentSource, Instance, SecretStore, StoreError, StoreStatus};
pub use sync::{HttpRemote, Remote, SyncClient, SyncError, SyncOutcome, SyncReport, DEFAULT_SECRET_NAME};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
