//! Reconciles a local encrypted document against a remote server.
//!
//! One sync attempt walks a fixed sequence of states:
//! `NoSession -> Authenticating -> Authenticated -> Reconciling ->
//! Published | Failed`. The remote only ever sees ciphertext; the local
//! cipher identity is the sole decryption path. A failed attempt never
//! leaves the local store partially written: the local encrypted write
//! of the merged document is the commit point.

use tracing::{debug, info, warn};

use super::error::{RemoteError, SyncError};
use super::remote::Remote;
use crate::cipher::Cipher;
use crate::document::Document;
use crate::prompt::Prompter;
use crate::registry::RemoteRegistry;
use crate::store::{Instance, SecretStore};

/// Well-known name of the synchronized document on a remote.
pub const DEFAULT_SECRET_NAME: &str = "vault";

/// The `type` tag attached to the document when first uploaded.
const REMOTE_SECRET_TYPE: &str = "tagvault";

/// How a successful sync attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local and remote were already identical; nothing was sent.
    AlreadyConsistent,
    /// Local and remote were merged, persisted, and re-uploaded.
    Merged,
    /// The remote had no document yet; the local one was uploaded.
    Bootstrapped,
}

/// Result of a successful sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Remote-originated changes applied locally by the merge.
    pub applied_changes: usize,
}

/// Drives one identity's document through a sync attempt.
pub struct SyncClient<'a> {
    remote: &'a dyn Remote,
    cipher: &'a dyn Cipher,
    prompter: &'a dyn Prompter,
    remote_url: String,
}

impl<'a> SyncClient<'a> {
    pub fn new(
        remote: &'a dyn Remote,
        cipher: &'a dyn Cipher,
        prompter: &'a dyn Prompter,
        remote_url: &str,
    ) -> Self {
        Self {
            remote,
            cipher,
            prompter,
            remote_url: remote_url.to_string(),
        }
    }

    /// Runs one full sync attempt.
    ///
    /// Session tokens obtained along the way are written into
    /// `registry`; the caller owns persisting the registry afterwards.
    pub async fn sync(
        &self,
        instance: &mut Instance,
        registry: &mut RemoteRegistry,
        identity: &str,
    ) -> Result<SyncReport, SyncError> {
        let jwt = self.ensure_session(registry, identity).await?;
        debug!(remote = %self.remote_url, "authenticated");

        let report = self.reconcile(instance, identity, &jwt).await?;
        info!(remote = %self.remote_url, outcome = ?report.outcome, "sync published");
        Ok(report)
    }

    /// `NoSession -> Authenticating -> Authenticated`.
    ///
    /// A stored token is probed first; a rejected login re-offers the
    /// account question exactly once before giving up.
    async fn ensure_session(
        &self,
        registry: &mut RemoteRegistry,
        identity: &str,
    ) -> Result<String, SyncError> {
        if let Some(jwt) = registry.jwt(&self.remote_url) {
            match self.remote.whoami(jwt).await {
                Ok(()) => return Ok(jwt.to_string()),
                Err(RemoteError::Unauthorized) => {
                    debug!(remote = %self.remote_url, "stored session rejected");
                    registry.clear_jwt(&self.remote_url);
                }
                Err(e) => return Err(e.into()),
            }
        }

        for attempt in 0..2 {
            let has_account = self
                .prompter
                .confirm("Do you have an account on this remote?")
                .map_err(SyncError::Prompt)?;
            let password = self
                .prompter
                .password("Enter remote password")
                .map_err(SyncError::Prompt)?;

            if !has_account {
                let public_key = self.cipher.public_key(identity)?;
                match self
                    .remote
                    .create_user(identity, &public_key, &password)
                    .await
                {
                    // An existing account just means the answer to the
                    // question was stale; log in with it anyway.
                    Ok(()) | Err(RemoteError::AccountExists) => {}
                    Err(e) => return Err(e.into()),
                }
            }

            match self.remote.login(identity, &password).await {
                Ok(jwt) => {
                    registry.set_jwt(&self.remote_url, jwt.clone());
                    return Ok(jwt);
                }
                Err(RemoteError::Unauthorized) if attempt == 0 => {
                    warn!("Login rejected. Try a different password");
                }
                Err(RemoteError::Unauthorized) => break,
                Err(e) => return Err(e.into()),
            }
        }

        Err(SyncError::AuthFailed(format!(
            "login to {} rejected",
            self.remote_url
        )))
    }

    /// `Authenticated -> Reconciling -> Published`.
    async fn reconcile(
        &self,
        instance: &mut Instance,
        identity: &str,
        jwt: &str,
    ) -> Result<SyncReport, SyncError> {
        let listing = self.remote.list_secrets(jwt).await?;
        let exists = listing.iter().any(|info| info.name == DEFAULT_SECRET_NAME);

        if !exists {
            debug!("remote has no document, bootstrapping");
            let ciphertext = self.cipher.encrypt(identity, &instance.doc.save())?;
            self.remote
                .add_secret(jwt, DEFAULT_SECRET_NAME, REMOTE_SECRET_TYPE, &ciphertext)
                .await?;
            return Ok(SyncReport {
                outcome: SyncOutcome::Bootstrapped,
                applied_changes: 0,
            });
        }

        let remote_ciphertext = self.remote.fetch_secret(jwt, DEFAULT_SECRET_NAME).await?;
        let remote_plaintext = self.cipher.decrypt(&remote_ciphertext)?;
        let mut theirs = Document::load(&remote_plaintext)?;

        let incoming = instance.doc.diff(&theirs)?;
        let outgoing = theirs.diff(&instance.doc)?;
        if incoming.is_empty() && outgoing.is_empty() {
            debug!("local and remote already consistent");
            return Ok(SyncReport {
                outcome: SyncOutcome::AlreadyConsistent,
                applied_changes: 0,
            });
        }

        debug!(
            incoming = incoming.len(),
            outgoing = outgoing.len(),
            "merging divergent copies"
        );
        instance.doc = instance.doc.merge(&mut theirs)?;

        // Local persistence is the commit point.
        if let Some(path) = instance.path().map(|p| p.to_path_buf()) {
            let store = SecretStore::new(self.cipher, self.prompter);
            store.save(&path, identity, &mut instance.doc).await?;
        }

        let merged_ciphertext = self.cipher.encrypt(identity, &instance.doc.save())?;
        self.remote
            .update_secret(jwt, DEFAULT_SECRET_NAME, &merged_ciphertext)
            .await?;

        Ok(SyncReport {
            outcome: SyncOutcome::Merged,
            applied_changes: incoming.len(),
        })
    }
}
