//! CRDT document engine for the secret collection.
//!
//! A [`Document`] wraps an Automerge document holding the full secret
//! collection plus its causal history. Mutations go through
//! [`Document::change`], which works on a fork and returns a new value,
//! so earlier snapshots stay valid and comparable. Two documents with a
//! common ancestor merge deterministically without a coordinator.

use std::collections::BTreeMap;

use automerge::transaction::{CommitOptions, Transactable};
use automerge::{AutoCommit, ObjId, ObjType, ReadDoc, ScalarValue, Value, ROOT};
use chrono::Utc;
use uuid::Uuid;

use crate::models::{join_tags, SecretRecord};

/// Root key marking documents created by tagvault, as opposed to foreign
/// Automerge documents that happen to load.
const CREATED_MARKER: &str = "is_tagvault";

/// CRDT-backed root state: the secret collection plus causal history.
#[derive(Debug)]
pub struct Document {
    doc: AutoCommit,
}

impl Document {
    /// Creates a fresh document: empty secrets, version 1, new id,
    /// created marker set.
    pub fn init() -> Result<Self, DocumentError> {
        let mut doc = AutoCommit::new();

        doc.put(ROOT, CREATED_MARKER, true)?;
        doc.put(ROOT, "id", Uuid::new_v4().to_string())?;
        doc.put(ROOT, "version", 1_i64)?;
        doc.put(ROOT, "app_version", crate::version())?;
        doc.put(ROOT, "updated_at", Utc::now().timestamp_millis())?;
        doc.put_object(ROOT, "secrets", ObjType::List)?;
        doc.commit_with(CommitOptions::default().with_message("Initialize".to_owned()));

        Ok(Self { doc })
    }

    /// Applies `mutator` to a working copy and returns the new snapshot.
    ///
    /// The input document is left untouched. The committed change carries
    /// `description`, which becomes part of the document's history. The
    /// mutator is responsible for bumping `version` via
    /// [`Draft::set_version`] (see [`Document::next_version`]).
    pub fn change<F>(&mut self, description: &str, mutator: F) -> Result<Document, DocumentError>
    where
        F: FnOnce(&mut Draft<'_>) -> Result<(), DocumentError>,
    {
        let mut forked = self.doc.fork();

        {
            let mut draft = Draft { doc: &mut forked };
            mutator(&mut draft)?;
        }

        forked.commit_with(CommitOptions::default().with_message(description.to_owned()));

        Ok(Document { doc: forked })
    }

    /// Canonical serialization. Stable across save/load cycles.
    pub fn save(&mut self) -> Vec<u8> {
        self.doc.save()
    }

    /// Loads a document from its serialized form.
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::Deserialization("empty input".to_string()));
        }

        let doc =
            AutoCommit::load(bytes).map_err(|e| DocumentError::Deserialization(e.to_string()))?;

        Ok(Self { doc })
    }

    /// Merges two documents into a new one.
    ///
    /// Concurrent edits to disjoint records compose; concurrent edits to
    /// the same field resolve by Automerge's deterministic actor-order
    /// tie-break, not wall-clock time. Neither input is modified.
    /// Merging a document with itself yields an equivalent document.
    pub fn merge(&mut self, other: &mut Document) -> Result<Document, DocumentError> {
        let mut merged = self.doc.fork();
        let mut theirs = other.doc.fork();
        merged.merge(&mut theirs)?;

        Ok(Document { doc: merged })
    }

    /// Field-level differences of `other` relative to `self`.
    ///
    /// An empty result means merging the two would change nothing
    /// observable in either direction.
    pub fn diff(&self, other: &Document) -> Result<Vec<DocumentChange>, DocumentError> {
        let mut changes = Vec::new();

        let ours = self.secrets()?;
        let theirs = other.secrets()?;

        for record in &theirs {
            if !ours.iter().any(|r| r.id == record.id) {
                changes.push(DocumentChange::RecordAdded(record.clone()));
            }
        }

        for record in &ours {
            match theirs.iter().find(|r| r.id == record.id) {
                None => changes.push(DocumentChange::RecordRemoved(record.clone())),
                Some(theirs_record) => {
                    diff_records(record, theirs_record, &mut changes);
                }
            }
        }

        if self.version() != other.version() {
            changes.push(DocumentChange::MetadataChanged {
                field: "version",
                ours: self.version().to_string(),
                theirs: other.version().to_string(),
            });
        }

        if self.updated_at() != other.updated_at() {
            changes.push(DocumentChange::MetadataChanged {
                field: "updated_at",
                ours: format_opt(self.updated_at()),
                theirs: format_opt(other.updated_at()),
            });
        }

        Ok(changes)
    }

    /// Number of committed changes in this document's history.
    pub fn history_len(&mut self) -> usize {
        self.doc.get_changes(&[]).len()
    }

    /// The version the next committed mutation should carry.
    pub fn next_version(&mut self) -> u64 {
        self.history_len() as u64 + 1
    }

    /// The document's unique identifier, assigned at creation.
    pub fn id(&self) -> Option<String> {
        match self.doc.get(ROOT, "id") {
            Ok(Some((value, _))) => value.into_string().ok(),
            _ => None,
        }
    }

    pub fn version(&self) -> u64 {
        match self.doc.get(ROOT, "version") {
            Ok(Some((value, _))) => scalar_i64(&value).unwrap_or(0).max(0) as u64,
            _ => 0,
        }
    }

    /// Whether this document was created by tagvault.
    pub fn created_here(&self) -> bool {
        match self.doc.get(ROOT, CREATED_MARKER) {
            Ok(Some((value, _))) => scalar_bool(&value).unwrap_or(false),
            _ => false,
        }
    }

    /// Timestamp (ms) of the last mutation, if recorded.
    pub fn updated_at(&self) -> Option<i64> {
        match self.doc.get(ROOT, "updated_at") {
            Ok(Some((value, _))) => scalar_i64(&value),
            _ => None,
        }
    }

    /// All secret records, in insertion order.
    pub fn secrets(&self) -> Result<Vec<SecretRecord>, DocumentError> {
        let list = self.secrets_obj()?;
        let len = self.doc.length(&list);

        let mut records = Vec::with_capacity(len);
        for i in 0..len {
            let (_, obj) = self
                .doc
                .get(&list, i)?
                .ok_or_else(|| DocumentError::Schema(format!("missing secret at index {}", i)))?;
            records.push(read_record(&self.doc, &obj)?);
        }

        Ok(records)
    }

    fn secrets_obj(&self) -> Result<ObjId, DocumentError> {
        match self.doc.get(ROOT, "secrets")? {
            Some((Value::Object(ObjType::List), obj)) => Ok(obj),
            _ => Err(DocumentError::Schema("missing secrets list".to_string())),
        }
    }
}

/// Working copy handed to [`Document::change`] mutators.
pub struct Draft<'a> {
    doc: &'a mut AutoCommit,
}

impl Draft<'_> {
    pub fn set_version(&mut self, version: u64) -> Result<(), DocumentError> {
        self.doc.put(ROOT, "version", version as i64)?;
        Ok(())
    }

    /// Stamps `updated_at` with the current time and records the writing
    /// crate version.
    pub fn touch(&mut self) -> Result<(), DocumentError> {
        self.doc
            .put(ROOT, "updated_at", Utc::now().timestamp_millis())?;
        self.doc.put(ROOT, "app_version", crate::version())?;
        Ok(())
    }

    /// Appends a record to the end of the collection.
    pub fn push_secret(&mut self, record: &SecretRecord) -> Result<(), DocumentError> {
        let list = self.secrets_obj()?;
        let idx = self.doc.length(&list);
        let obj = self.doc.insert_object(&list, idx, ObjType::Map)?;
        write_record(self.doc, &obj, record)?;
        Ok(())
    }

    /// Removes the record with the given id. Returns false if absent.
    pub fn remove_secret(&mut self, id: Uuid) -> Result<bool, DocumentError> {
        let list = self.secrets_obj()?;
        match self.find_index(&list, id)? {
            Some(idx) => {
                self.doc.delete(&list, idx)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Replaces the record with the same id in place. Returns false if
    /// absent.
    pub fn replace_secret(&mut self, record: &SecretRecord) -> Result<bool, DocumentError> {
        let list = self.secrets_obj()?;
        match self.find_index(&list, record.id)? {
            Some(idx) => {
                let obj = self.doc.put_object(&list, idx, ObjType::Map)?;
                write_record(self.doc, &obj, record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn find_index(&self, list: &ObjId, id: Uuid) -> Result<Option<usize>, DocumentError> {
        let len = self.doc.length(list);
        for i in 0..len {
            if let Some((_, obj)) = self.doc.get(list, i)? {
                if let Some((value, _)) = self.doc.get(&obj, "id")? {
                    if value.into_string().ok().as_deref() == Some(id.to_string().as_str()) {
                        return Ok(Some(i));
                    }
                }
            }
        }
        Ok(None)
    }

    fn secrets_obj(&self) -> Result<ObjId, DocumentError> {
        match self.doc.get(ROOT, "secrets")? {
            Some((Value::Object(ObjType::List), obj)) => Ok(obj),
            _ => Err(DocumentError::Schema("missing secrets list".to_string())),
        }
    }
}

/// One logical difference between two documents.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentChange {
    RecordAdded(SecretRecord),
    RecordRemoved(SecretRecord),
    FieldEdited {
        id: Uuid,
        field: String,
        ours: String,
        theirs: String,
    },
    MetadataChanged {
        field: &'static str,
        ours: String,
        theirs: String,
    },
}

impl std::fmt::Display for DocumentChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentChange::RecordAdded(r) => write!(f, "added '{}'", r.joined_tags()),
            DocumentChange::RecordRemoved(r) => write!(f, "removed '{}'", r.joined_tags()),
            DocumentChange::FieldEdited { id, field, .. } => {
                write!(f, "edited {} of {}", field, id)
            }
            DocumentChange::MetadataChanged { field, ours, theirs } => {
                write!(f, "{}: {} -> {}", field, ours, theirs)
            }
        }
    }
}

fn diff_records(ours: &SecretRecord, theirs: &SecretRecord, changes: &mut Vec<DocumentChange>) {
    if ours.tags != theirs.tags {
        changes.push(DocumentChange::FieldEdited {
            id: ours.id,
            field: "tags".to_string(),
            ours: join_tags(&ours.tags),
            theirs: join_tags(&theirs.tags),
        });
    }

    if ours.secret != theirs.secret {
        changes.push(DocumentChange::FieldEdited {
            id: ours.id,
            field: "secret".to_string(),
            ours: ours.secret.clone(),
            theirs: theirs.secret.clone(),
        });
    }

    let mut keys: Vec<&String> = ours.extra.keys().chain(theirs.extra.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        let a = ours.extra.get(key).map(String::as_str).unwrap_or("");
        let b = theirs.extra.get(key).map(String::as_str).unwrap_or("");
        if a != b {
            changes.push(DocumentChange::FieldEdited {
                id: ours.id,
                field: key.clone(),
                ours: a.to_string(),
                theirs: b.to_string(),
            });
        }
    }
}

fn write_record(
    doc: &mut AutoCommit,
    obj: &ObjId,
    record: &SecretRecord,
) -> Result<(), DocumentError> {
    doc.put(obj, "id", record.id.to_string())?;
    doc.put(obj, "secret", record.secret.as_str())?;

    let tags = doc.put_object(obj, "tags", ObjType::List)?;
    for (i, tag) in record.tags.iter().enumerate() {
        doc.insert(&tags, i, tag.as_str())?;
    }

    for (key, value) in &record.extra {
        doc.put(obj, key.as_str(), value.as_str())?;
    }

    Ok(())
}

fn read_record(doc: &AutoCommit, obj: &ObjId) -> Result<SecretRecord, DocumentError> {
    let id = match doc.get(obj, "id")? {
        Some((value, _)) => value
            .into_string()
            .ok()
            .and_then(|s| Uuid::parse_str(&s).ok())
            .ok_or_else(|| DocumentError::Schema("secret has invalid id".to_string()))?,
        None => return Err(DocumentError::Schema("secret missing id".to_string())),
    };

    let secret = match doc.get(obj, "secret")? {
        Some((value, _)) => value.into_string().unwrap_or_default(),
        None => String::new(),
    };

    let mut tags = Vec::new();
    if let Some((Value::Object(ObjType::List), tags_obj)) = doc.get(obj, "tags")? {
        let len = doc.length(&tags_obj);
        for i in 0..len {
            if let Some((value, _)) = doc.get(&tags_obj, i)? {
                if let Ok(tag) = value.into_string() {
                    tags.push(tag);
                }
            }
        }
    }

    let mut extra = BTreeMap::new();
    let keys: Vec<String> = doc.keys(obj).collect();
    for key in keys {
        if key == "id" || key == "secret" || key == "tags" {
            continue;
        }
        if let Some((value, _)) = doc.get(obj, key.as_str())? {
            if let Ok(s) = value.into_string() {
                extra.insert(key, s);
            }
        }
    }

    Ok(SecretRecord {
        id,
        tags,
        secret,
        extra,
    })
}

fn scalar_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Scalar(s) => match s.as_ref() {
            ScalarValue::Int(i) => Some(*i),
            ScalarValue::Uint(u) => Some(*u as i64),
            ScalarValue::Timestamp(t) => Some(*t),
            _ => None,
        },
        _ => None,
    }
}

fn scalar_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Scalar(s) => match s.as_ref() {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        },
        _ => None,
    }
}

fn format_opt(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Errors from document engine operations.
#[derive(Debug)]
pub enum DocumentError {
    /// Malformed bytes passed to `load`.
    Deserialization(String),
    /// Document is missing a structural element it should have.
    Schema(String),
    /// Underlying Automerge failure.
    Automerge(automerge::AutomergeError),
}

impl std::fmt::Display for DocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::Deserialization(e) => write!(f, "Failed to load document: {}", e),
            DocumentError::Schema(e) => write!(f, "Invalid document structure: {}", e),
            DocumentError::Automerge(e) => write!(f, "Automerge error: {}", e),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Automerge(e) => Some(e),
            _ => None,
        }
    }
}

impl From<automerge::AutomergeError> for DocumentError {
    fn from(e: automerge::AutomergeError) -> Self {
        DocumentError::Automerge(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_record(doc: &mut Document, record: &SecretRecord) -> Document {
        let version = doc.next_version();
        doc.change(&format!("Add '{}'", record.joined_tags()), |draft| {
            draft.push_secret(record)?;
            draft.set_version(version)?;
            draft.touch()
        })
        .unwrap()
    }

    #[test]
    fn test_init_document() {
        let doc = Document::init().unwrap();
        assert!(doc.created_here());
        assert_eq!(doc.version(), 1);
        assert!(doc.id().is_some());
        assert!(doc.updated_at().is_some());
        assert!(doc.secrets().unwrap().is_empty());
    }

    #[test]
    fn test_init_documents_have_unique_ids() {
        let a = Document::init().unwrap();
        let b = Document::init().unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_change_is_copy_on_write() {
        let mut doc = Document::init().unwrap();
        let record = SecretRecord::new(vec!["email".into()], "hunter2");

        let updated = add_record(&mut doc, &record);

        // The original snapshot is untouched.
        assert!(doc.secrets().unwrap().is_empty());
        assert_eq!(doc.version(), 1);

        assert_eq!(updated.secrets().unwrap().len(), 1);
        assert_eq!(updated.version(), 2);
    }

    #[test]
    fn test_version_tracks_history_length() {
        let mut doc = Document::init().unwrap();
        assert_eq!(doc.history_len(), 1);
        assert_eq!(doc.next_version(), 2);

        let mut doc = add_record(&mut doc, &SecretRecord::new(vec!["a".into()], "1"));
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.history_len(), 2);

        let doc = add_record(&mut doc, &SecretRecord::new(vec!["b".into()], "2"));
        assert_eq!(doc.version(), 3);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut doc = Document::init().unwrap();
        let record = SecretRecord::new(vec!["email".into(), "gmail".into()], "hunter2")
            .with_extra("url", "https://mail.example.com");
        let mut updated = add_record(&mut doc, &record);

        let bytes = updated.save();
        let loaded = Document::load(&bytes).unwrap();

        assert_eq!(loaded.id(), updated.id());
        assert_eq!(loaded.version(), updated.version());
        assert_eq!(loaded.secrets().unwrap(), updated.secrets().unwrap());
        assert!(loaded.created_here());
    }

    #[test]
    fn test_save_is_stable() {
        let mut doc = Document::init().unwrap();
        let first = doc.save();
        let second = doc.save();
        assert_eq!(first, second);

        let mut reloaded = Document::load(&first).unwrap();
        assert_eq!(reloaded.save(), first);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(matches!(
            Document::load(b"not an automerge document"),
            Err(DocumentError::Deserialization(_))
        ));
    }

    #[test]
    fn test_load_rejects_empty() {
        assert!(matches!(
            Document::load(b""),
            Err(DocumentError::Deserialization(_))
        ));
    }

    #[test]
    fn test_merge_with_self_is_idempotent() {
        let mut doc = Document::init().unwrap();
        let mut doc = add_record(&mut doc, &SecretRecord::new(vec!["email".into()], "hunter2"));

        let mut copy = Document::load(&doc.save()).unwrap();
        let merged = doc.merge(&mut copy).unwrap();

        assert!(doc.diff(&merged).unwrap().is_empty());
        assert_eq!(merged.secrets().unwrap(), doc.secrets().unwrap());
    }

    #[test]
    fn test_merge_disjoint_edits_union() {
        let mut root = Document::init().unwrap();

        let mut a = Document::load(&root.save()).unwrap();
        let mut b = Document::load(&root.save()).unwrap();

        let x = SecretRecord::new(vec!["x".into()], "sx");
        let y = SecretRecord::new(vec!["y".into()], "sy");

        let mut a = add_record(&mut a, &x);
        let mut b = add_record(&mut b, &y);

        let merged = a.merge(&mut b).unwrap();
        let secrets = merged.secrets().unwrap();

        assert_eq!(secrets.len(), 2);
        assert!(secrets.iter().any(|r| r.id == x.id));
        assert!(secrets.iter().any(|r| r.id == y.id));
    }

    #[test]
    fn test_merge_no_duplicate_ancestor_records() {
        let mut root = Document::init().unwrap();
        let shared = SecretRecord::new(vec!["shared".into()], "s");
        let mut root = add_record(&mut root, &shared);

        let mut a = Document::load(&root.save()).unwrap();
        let mut b = Document::load(&root.save()).unwrap();

        let mut a = add_record(&mut a, &SecretRecord::new(vec!["x".into()], "sx"));
        let mut b = add_record(&mut b, &SecretRecord::new(vec!["y".into()], "sy"));

        let merged = a.merge(&mut b).unwrap();
        let secrets = merged.secrets().unwrap();

        assert_eq!(secrets.len(), 3);
        assert_eq!(
            secrets.iter().filter(|r| r.id == shared.id).count(),
            1
        );
    }

    #[test]
    fn test_merge_is_deterministic_on_conflict() {
        let mut root = Document::init().unwrap();
        let record = SecretRecord::new(vec!["conflict".into()], "original");
        let mut root = add_record(&mut root, &record);

        let mut a = Document::load(&root.save()).unwrap();
        let mut b = Document::load(&root.save()).unwrap();

        let mut edited_a = record.clone();
        edited_a.secret = "from-a".to_string();
        let mut edited_b = record.clone();
        edited_b.secret = "from-b".to_string();

        let version_a = a.next_version();
        let mut a = a
            .change("Update 'conflict'", |draft| {
                draft.replace_secret(&edited_a)?;
                draft.set_version(version_a)
            })
            .unwrap();
        let version_b = b.next_version();
        let mut b = b
            .change("Update 'conflict'", |draft| {
                draft.replace_secret(&edited_b)?;
                draft.set_version(version_b)
            })
            .unwrap();

        // Same winner regardless of merge direction.
        let ab = a.merge(&mut b).unwrap();
        let ba = b.merge(&mut a).unwrap();

        let ab_secret = &ab.secrets().unwrap()[0].secret;
        let ba_secret = &ba.secrets().unwrap()[0].secret;
        assert_eq!(ab_secret, ba_secret);
        assert!(ab_secret == "from-a" || ab_secret == "from-b");
    }

    #[test]
    fn test_diff_empty_for_identical() {
        let mut doc = Document::init().unwrap();
        let mut doc = add_record(&mut doc, &SecretRecord::new(vec!["a".into()], "1"));
        let copy = Document::load(&doc.save()).unwrap();

        assert!(doc.diff(&copy).unwrap().is_empty());
    }

    #[test]
    fn test_diff_reports_additions() {
        let mut root = Document::init().unwrap();
        let mut a = Document::load(&root.save()).unwrap();
        let mut b = Document::load(&root.save()).unwrap();

        let y = SecretRecord::new(vec!["y".into()], "sy");
        let b = add_record(&mut b, &y);

        let changes = a.diff(&b).unwrap();
        let added: Vec<_> = changes
            .iter()
            .filter(|c| matches!(c, DocumentChange::RecordAdded(r) if r.id == y.id))
            .collect();
        assert_eq!(added.len(), 1);
    }

    #[test]
    fn test_diff_merged_against_input() {
        let mut root = Document::init().unwrap();
        let mut a = Document::load(&root.save()).unwrap();
        let mut b = Document::load(&root.save()).unwrap();

        let x = SecretRecord::new(vec!["x".into()], "sx");
        let y = SecretRecord::new(vec!["y".into()], "sy");
        let mut a = add_record(&mut a, &x);
        let mut b = add_record(&mut b, &y);

        let merged = a.merge(&mut b).unwrap();

        // Relative to the merge, `a` is missing exactly b's addition.
        let record_changes: Vec<_> = merged
            .diff(&a)
            .unwrap()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    DocumentChange::RecordAdded(_) | DocumentChange::RecordRemoved(_)
                )
            })
            .collect();
        assert_eq!(record_changes.len(), 1);
        assert!(matches!(
            &record_changes[0],
            DocumentChange::RecordRemoved(r) if r.id == y.id
        ));
    }

    #[test]
    fn test_diff_reports_field_edit() {
        let mut root = Document::init().unwrap();
        let record = SecretRecord::new(vec!["email".into()], "old");
        let mut root = add_record(&mut root, &record);

        let mut other = Document::load(&root.save()).unwrap();
        let mut edited = record.clone();
        edited.secret = "new".to_string();
        let version = other.next_version();
        let other = other
            .change("Update 'email'", |draft| {
                draft.replace_secret(&edited)?;
                draft.set_version(version)
            })
            .unwrap();

        let changes = root.diff(&other).unwrap();
        assert!(changes.iter().any(|c| matches!(
            c,
            DocumentChange::FieldEdited { field, theirs, .. }
                if field == "secret" && theirs == "new"
        )));
    }

    #[test]
    fn test_foreign_document_lacks_marker() {
        let mut foreign = AutoCommit::new();
        foreign.put(ROOT, "whatever", "data").unwrap();
        let bytes = foreign.save();

        let doc = Document::load(&bytes).unwrap();
        assert!(!doc.created_here());
    }

    #[test]
    fn test_extra_fields_roundtrip_through_document() {
        let mut doc = Document::init().unwrap();
        let record = SecretRecord::new(vec!["bank".into()], "pin")
            .with_extra("url", "https://bank.example.com")
            .with_extra("username", "me");

        let updated = add_record(&mut doc, &record);
        let stored = &updated.secrets().unwrap()[0];

        assert_eq!(stored.extra.get("url").unwrap(), "https://bank.example.com");
        assert_eq!(stored.extra.get("username").unwrap(), "me");
    }
}
