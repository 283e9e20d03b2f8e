use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored secret.
///
/// `id` is assigned at creation and never edited by user operations.
/// `tags` double as the human label and the search index. Any further
/// fields a record picks up over time land in the open `extra` map.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecretRecord {
    pub id: Uuid,
    pub tags: Vec<String>,
    pub secret: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl SecretRecord {
    pub fn new(tags: Vec<String>, secret: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tags,
            secret: secret.into(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Tags joined for display and for change descriptions.
    pub fn joined_tags(&self) -> String {
        join_tags(&self.tags)
    }
}

impl fmt::Display for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined_tags())
    }
}

/// Splits free-text tag input on whitespace and comma boundaries.
///
/// Empty fragments are dropped, so `"email,  gmail"` and `"email gmail"`
/// both come out as `["email", "gmail"]`.
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Joins tags back into the comma-separated form shown to the user.
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";
const PASSWORD_LEN: usize = 32;

/// Generates a random password for records where the user asks for one.
pub fn gen_password() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    (0..PASSWORD_LEN)
        .map(|_| PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_unique_id() {
        let a = SecretRecord::new(vec!["email".into()], "hunter2");
        let b = SecretRecord::new(vec!["email".into()], "hunter2");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_split_tags_whitespace_and_commas() {
        assert_eq!(split_tags("email gmail"), vec!["email", "gmail"]);
        assert_eq!(split_tags("email,gmail"), vec!["email", "gmail"]);
        assert_eq!(split_tags("email,  gmail , work"), vec!["email", "gmail", "work"]);
    }

    #[test]
    fn test_split_tags_empty_input() {
        assert!(split_tags("").is_empty());
        assert!(split_tags("  , ,  ").is_empty());
    }

    #[test]
    fn test_join_tags() {
        let tags = vec!["email".to_string(), "gmail".to_string()];
        assert_eq!(join_tags(&tags), "email, gmail");
    }

    #[test]
    fn test_tags_roundtrip() {
        let tags = split_tags("email, gmail");
        assert_eq!(split_tags(&join_tags(&tags)), tags);
    }

    #[test]
    fn test_record_json_roundtrip() {
        let record = SecretRecord::new(vec!["bank".into()], "s3cret")
            .with_extra("url", "https://bank.example.com");

        let json = serde_json::to_string(&record).unwrap();
        let parsed: SecretRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }

    #[test]
    fn test_gen_password_length_and_variety() {
        let a = gen_password();
        let b = gen_password();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
