use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};

/// A shortened URL as stored by every backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// The short identifier, generated by the caller.
    pub id: String,
    /// The original URL. Unique across the store.
    pub long_url: String,
    /// The fully qualified short URL derived from `id`.
    pub short_url: String,
    /// Owner of the record.
    pub user_id: String,
    /// Tombstone flag. Never cleared once set.
    #[serde(default)]
    pub deleted: bool,
}

impl UrlRecord {
    /// Creates a live record for `id`, deriving the short URL from `base_url`.
    pub fn new(
        id: impl Into<String>,
        long_url: impl Into<String>,
        base_url: &str,
        user_id: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            short_url: short_url(base_url, &id),
            id,
            long_url: long_url.into(),
            user_id: user_id.into(),
            deleted: false,
        }
    }

    /// Checks the fields every backend relies on.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(StorageError::Validation("id cannot be empty".to_string()));
        }
        if self.long_url.trim().is_empty() {
            return Err(StorageError::Validation(format!(
                "long url cannot be empty (id {})",
                self.id
            )));
        }
        Ok(())
    }

    /// Case-insensitive identifier match.
    pub fn has_id(&self, id: &str) -> bool {
        self.id.eq_ignore_ascii_case(id)
    }
}

/// Builds the public short URL for an identifier.
pub fn short_url(base_url: &str, id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), id)
}

/// Outcome of a save that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The record was persisted.
    Created,
    /// The long URL was already stored; nothing was written.
    Conflict {
        /// Short URL of the record that already owns the long URL.
        short_url: String,
    },
}

impl SaveOutcome {
    /// Returns the existing short URL when the save hit a conflict.
    pub fn conflict(&self) -> Option<&str> {
        match self {
            SaveOutcome::Created => None,
            SaveOutcome::Conflict { short_url } => Some(short_url),
        }
    }
}

/// Result of resolving an identifier that exists in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub long_url: String,
    /// `true` when the record has been tombstoned and must not be served.
    pub deleted: bool,
}

/// A live URL owned by a user, as returned by per-user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUrl {
    pub short_url: String,
    #[serde(rename = "original_url")]
    pub long_url: String,
}

impl From<&UrlRecord> for UserUrl {
    fn from(record: &UrlRecord) -> Self {
        Self {
            short_url: record.short_url.clone(),
            long_url: record.long_url.clone(),
        }
    }
}

/// A batch of identifiers a user asked to tombstone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub user_id: String,
    pub ids: Vec<String>,
}

impl DeleteRequest {
    pub fn new(user_id: impl Into<String>, ids: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_derives_short_url() {
        let record = UrlRecord::new("abcdefghij", "https://example.com", "http://s.io/", "u1");
        assert_eq!(record.short_url, "http://s.io/abcdefghij");
        assert!(!record.deleted);
    }

    #[test]
    fn short_url_trims_trailing_slash() {
        assert_eq!(short_url("http://s.io", "abc"), "http://s.io/abc");
        assert_eq!(short_url("http://s.io//", "abc"), "http://s.io/abc");
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let mut record = UrlRecord::new("abc", "https://example.com", "http://s.io", "u1");
        assert!(record.validate().is_ok());

        record.long_url = " ".to_string();
        assert!(matches!(
            record.validate(),
            Err(StorageError::Validation(_))
        ));

        record.long_url = "https://example.com".to_string();
        record.id = String::new();
        assert!(matches!(
            record.validate(),
            Err(StorageError::Validation(_))
        ));
    }

    #[test]
    fn id_match_ignores_case() {
        let record = UrlRecord::new("AbC123", "https://example.com", "http://s.io", "u1");
        assert!(record.has_id("abc123"));
        assert!(record.has_id("ABC123"));
        assert!(!record.has_id("abc12"));
    }

    #[test]
    fn conflict_accessor() {
        assert_eq!(SaveOutcome::Created.conflict(), None);
        let outcome = SaveOutcome::Conflict {
            short_url: "http://s.io/abc".to_string(),
        };
        assert_eq!(outcome.conflict(), Some("http://s.io/abc"));
    }

    #[test]
    fn record_without_deleted_field_defaults_to_live() {
        let json = r#"{"id":"a1","long_url":"https://e.com","short_url":"http://s/a1","user_id":"u"}"#;
        let record: UrlRecord = serde_json::from_str(json).unwrap();
        assert!(!record.deleted);
    }

    #[test]
    fn user_url_serializes_original_url_key() {
        let url = UserUrl {
            short_url: "http://s/a1".to_string(),
            long_url: "https://e.com".to_string(),
        };
        let json = serde_json::to_value(&url).unwrap();
        assert_eq!(json["original_url"], "https://e.com");
        assert_eq!(json["short_url"], "http://s/a1");
    }
}
