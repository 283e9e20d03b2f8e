//! User-facing secret management layered on the document engine.
//!
//! A store instance is a loaded [`Document`] plus, when file-backed, the
//! path its encrypted form lives at. Mutating operations commit a change
//! to the document and re-encrypt to disk when a path is attached.

pub mod search;

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::cipher::{Cipher, CipherError};
use crate::document::{Document, DocumentError};
use crate::models::{gen_password, split_tags, SecretRecord};
use crate::prompt::Prompter;

/// Where a document comes from, resolved once at the API boundary.
pub enum DocumentSource {
    /// An already loaded document.
    Loaded(Document),
    /// Path to an encrypted document file, which may not exist yet.
    Path(PathBuf),
    /// Raw serialized document bytes (not encrypted).
    Raw(Vec<u8>),
}

/// A loaded document plus its backing file, if any.
pub struct Instance {
    pub doc: Document,
    path: Option<PathBuf>,
}

impl Instance {
    /// Wraps an in-memory document with no backing file.
    pub fn detached(doc: Document) -> Self {
        Self { doc, path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_file_backed(&self) -> bool {
        self.path.is_some()
    }
}

/// Outcome of a store operation that may decline to mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    /// The mutation was committed (and persisted if file-backed).
    Committed,
    /// The query matched nothing; the document is unchanged.
    NoResult,
    /// The user declined a confirmation; the document is unchanged.
    Cancelled,
}

impl std::fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreStatus::Committed => write!(f, "Done"),
            StoreStatus::NoResult => write!(f, "No result found for search"),
            StoreStatus::Cancelled => write!(f, "Delete cancelled"),
        }
    }
}

/// The secret store: add, list, search, update, and delete tagged
/// secrets with encrypted persistence.
pub struct SecretStore<'a> {
    cipher: &'a dyn Cipher,
    prompter: &'a dyn Prompter,
}

impl<'a> SecretStore<'a> {
    pub fn new(cipher: &'a dyn Cipher, prompter: &'a dyn Prompter) -> Self {
        Self { cipher, prompter }
    }

    /// Resolves a [`DocumentSource`] into a usable instance.
    ///
    /// A path to an existing file is decrypted and loaded. A path that
    /// does not exist yet gets a fresh document, which is immediately
    /// persisted encrypted; that requires an identity.
    pub async fn get_instance(
        &self,
        source: DocumentSource,
        identity: Option<&str>,
    ) -> Result<Instance, StoreError> {
        match source {
            DocumentSource::Loaded(doc) => Ok(Instance { doc, path: None }),
            DocumentSource::Raw(bytes) => Ok(Instance {
                doc: Document::load(&bytes)?,
                path: None,
            }),
            DocumentSource::Path(path) => match tokio::fs::read(&path).await {
                Ok(ciphertext) => {
                    let plaintext = self.cipher.decrypt(&ciphertext)?;
                    let doc = Document::load(&plaintext)?;
                    debug!(path = %path.display(), version = doc.version(), "loaded document");
                    Ok(Instance {
                        doc,
                        path: Some(path),
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    let identity = identity.ok_or_else(|| {
                        StoreError::NotFound(
                            "an identity is required to create fresh storage".to_string(),
                        )
                    })?;

                    let mut doc = Document::init()?;
                    self.save(&path, identity, &mut doc).await?;
                    info!(path = %path.display(), "created fresh encrypted document");
                    Ok(Instance {
                        doc,
                        path: Some(path),
                    })
                }
                Err(e) => Err(StoreError::Io(e)),
            },
        }
    }

    /// Lists records, optionally filtered by a fuzzy tag query.
    pub fn list(
        &self,
        instance: &Instance,
        query: Option<&str>,
    ) -> Result<Vec<SecretRecord>, StoreError> {
        let records = instance.doc.secrets()?;

        match query {
            None => Ok(records),
            Some(q) => {
                let hits: Vec<SecretRecord> =
                    search::search(&records, q).into_iter().cloned().collect();
                Ok(hits)
            }
        }
    }

    /// Prompts for tags and a secret, commits the new record, and
    /// persists when file-backed. Neither tags nor secret may be empty.
    /// The secret can be generated instead of typed.
    pub async fn add(
        &self,
        instance: &mut Instance,
        identity: &str,
    ) -> Result<SecretRecord, StoreError> {
        let tags = loop {
            let input = self
                .prompter
                .input("Enter tags to find this secret later")
                .map_err(StoreError::Prompt)?;
            let tags = split_tags(&input);
            if !tags.is_empty() {
                break tags;
            }
        };

        let generate = self
            .prompter
            .confirm("Generate password?")
            .map_err(StoreError::Prompt)?;
        let secret = if generate {
            gen_password()
        } else {
            self.prompter
                .input("Enter secret")
                .map_err(StoreError::Prompt)?
        };

        let record = SecretRecord::new(tags, secret);
        let description = format!("Add '{}'", record.joined_tags());

        let version = instance.doc.next_version();
        instance.doc = instance.doc.change(&description, |draft| {
            draft.push_secret(&record)?;
            draft.set_version(version)?;
            draft.touch()
        })?;

        self.persist(instance, identity).await?;
        info!(tags = %record.joined_tags(), "added secret");

        Ok(record)
    }

    /// Deletes the record matching `query` after two separate
    /// confirmations. Declining either leaves the document unchanged.
    pub async fn delete(
        &self,
        instance: &mut Instance,
        identity: &str,
        query: &str,
    ) -> Result<StoreStatus, StoreError> {
        let records = instance.doc.secrets()?;
        let target = match search::resolve_single(&records, query, self.prompter)? {
            Some(record) => record,
            None => return Ok(StoreStatus::NoResult),
        };

        let tags = target.joined_tags();

        let sure = self
            .prompter
            .confirm(&format!(
                "Are you sure you want to delete secret \"{}\"?",
                tags
            ))
            .map_err(StoreError::Prompt)?;
        if !sure {
            return Ok(StoreStatus::Cancelled);
        }

        let really_sure = self
            .prompter
            .confirm(&format!(
                "Are you REALLY sure you want to delete secret \"{}\"?",
                tags
            ))
            .map_err(StoreError::Prompt)?;
        if !really_sure {
            return Ok(StoreStatus::Cancelled);
        }

        let version = instance.doc.next_version();
        instance.doc = instance
            .doc
            .change(&format!("Delete '{}'", tags), |draft| {
                draft.remove_secret(target.id)?;
                draft.set_version(version)?;
                draft.touch()
            })?;

        self.persist(instance, identity).await?;
        info!(tags = %tags, "deleted secret");

        Ok(StoreStatus::Committed)
    }

    /// Edits the record matching `query`. Every field except `id` is
    /// editable; tags are edited as their joined string and re-split.
    pub async fn update(
        &self,
        instance: &mut Instance,
        identity: &str,
        query: &str,
    ) -> Result<StoreStatus, StoreError> {
        let records = instance.doc.secrets()?;
        let target = match search::resolve_single(&records, query, self.prompter)? {
            Some(record) => record,
            None => return Ok(StoreStatus::NoResult),
        };

        let old_tags = target.joined_tags();
        let mut edited = target.clone();

        let tags_input = self
            .prompter
            .edit("tags", &old_tags)
            .map_err(StoreError::Prompt)?;
        let new_tags = split_tags(&tags_input);
        if !new_tags.is_empty() {
            edited.tags = new_tags;
        }

        edited.secret = self
            .prompter
            .edit("secret", &target.secret)
            .map_err(StoreError::Prompt)?;

        for (key, value) in &target.extra {
            let new_value = self.prompter.edit(key, value).map_err(StoreError::Prompt)?;
            edited.extra.insert(key.clone(), new_value);
        }

        let version = instance.doc.next_version();
        instance.doc = instance
            .doc
            .change(&format!("Update '{}'", old_tags), |draft| {
                draft.replace_secret(&edited)?;
                draft.set_version(version)?;
                draft.touch()
            })?;

        self.persist(instance, identity).await?;
        info!(tags = %edited.joined_tags(), "updated secret");

        Ok(StoreStatus::Committed)
    }

    /// Serializes, encrypts for `identity`, and writes to `path`.
    pub async fn save(
        &self,
        path: &Path,
        identity: &str,
        doc: &mut Document,
    ) -> Result<(), StoreError> {
        if identity.is_empty() {
            return Err(StoreError::Validation(
                "\"identity\" is required to save".to_string(),
            ));
        }

        let plaintext = doc.save();
        let ciphertext = self.cipher.encrypt(identity, &plaintext)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(StoreError::Io)?;
        }

        tokio::fs::write(path, ciphertext)
            .await
            .map_err(StoreError::Io)?;
        debug!(path = %path.display(), "persisted encrypted document");

        Ok(())
    }

    async fn persist(&self, instance: &mut Instance, identity: &str) -> Result<(), StoreError> {
        if let Some(path) = instance.path.clone() {
            self.save(&path, identity, &mut instance.doc).await?;
        }
        Ok(())
    }

}

/// Errors from secret store operations.
#[derive(Debug)]
pub enum StoreError {
    /// A required argument was missing.
    Validation(String),
    /// Something required was not found.
    NotFound(String),
    /// Cipher collaborator failure.
    Cipher(CipherError),
    /// Document engine failure.
    Document(DocumentError),
    /// Filesystem failure.
    Io(io::Error),
    /// Prompt collaborator failure.
    Prompt(io::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Validation(e) => write!(f, "Validation error: {}", e),
            StoreError::NotFound(e) => write!(f, "Not found: {}", e),
            StoreError::Cipher(e) => write!(f, "{}", e),
            StoreError::Document(e) => write!(f, "{}", e),
            StoreError::Io(e) => write!(f, "I/O error: {}", e),
            StoreError::Prompt(e) => write!(f, "Prompt error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Cipher(e) => Some(e),
            StoreError::Document(e) => Some(e),
            StoreError::Io(e) | StoreError::Prompt(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CipherError> for StoreError {
    fn from(e: CipherError) -> Self {
        StoreError::Cipher(e)
    }
}

impl From<DocumentError> for StoreError {
    fn from(e: DocumentError) -> Self {
        StoreError::Document(e)
    }
}
