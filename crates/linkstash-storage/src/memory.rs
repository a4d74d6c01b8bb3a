use async_trait::async_trait;
use linkstash_core::{
    ResolvedUrl, Result, SaveOutcome, StorageError, UrlRecord, UrlStorage, UserUrl,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// The ordered record collection shared by the memory and file backends.
///
/// Its serialized form is the on-disk format of [`FileStorage`](crate::FileStorage):
/// a single object whose `urls` field holds every record, tombstoned ones
/// included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecordSet {
    #[serde(default)]
    urls: Vec<UrlRecord>,
}

impl RecordSet {
    pub(crate) fn len(&self) -> usize {
        self.urls.len()
    }

    pub(crate) fn insert(&mut self, record: UrlRecord) -> Result<SaveOutcome> {
        record.validate()?;

        if let Some(existing) = self.urls.iter().find(|r| r.long_url == record.long_url) {
            return Ok(SaveOutcome::Conflict {
                short_url: existing.short_url.clone(),
            });
        }

        if self.urls.iter().any(|r| r.has_id(&record.id)) {
            return Err(StorageError::IdTaken(record.id));
        }

        self.urls.push(record);
        Ok(SaveOutcome::Created)
    }

    pub(crate) fn resolve(&self, id: &str) -> Option<ResolvedUrl> {
        self.urls.iter().find(|r| r.has_id(id)).map(|r| ResolvedUrl {
            long_url: r.long_url.clone(),
            deleted: r.deleted,
        })
    }

    /// Flags the user's records listed in `ids`, returning how many matched.
    pub(crate) fn tombstone(&mut self, ids: &[String], user_id: &str) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut matched = 0;
        for record in self
            .urls
            .iter_mut()
            .filter(|r| r.user_id == user_id && ids.iter().any(|id| r.has_id(id)))
        {
            record.deleted = true;
            matched += 1;
        }

        if matched == 0 {
            return Err(StorageError::NothingMatched {
                user_id: user_id.to_string(),
            });
        }
        Ok(matched)
    }

    pub(crate) fn owned_by(&self, user_id: &str) -> Vec<UserUrl> {
        self.urls
            .iter()
            .filter(|r| r.user_id == user_id && !r.deleted)
            .map(UserUrl::from)
            .collect()
    }
}

/// In-memory implementation of [`UrlStorage`].
///
/// Every operation runs under one mutex, so saves, lookups and tombstones
/// are linearized. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<RecordSet>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, tombstoned ones included.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UrlStorage for MemoryStorage {
    async fn save_url(&self, record: UrlRecord) -> Result<SaveOutcome> {
        self.records.lock().insert(record)
    }

    async fn get_long_url(&self, id: &str) -> Result<Option<ResolvedUrl>> {
        Ok(self.records.lock().resolve(id))
    }

    async fn delete_urls(&self, ids: &[String], user_id: &str) -> Result<u64> {
        self.records.lock().tombstone(ids, user_id)
    }

    async fn urls_by_user(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        Ok(self.records.lock().owned_by(user_id))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
