use crate::error::Result;
use crate::record::{ResolvedUrl, SaveOutcome, UrlRecord, UserUrl};
use async_trait::async_trait;
use std::sync::Arc;

/// The storage contract shared by the memory, file and database backends.
///
/// Backends are selected once at startup and handed to callers behind a
/// reference; nothing reaches for a global store.
#[async_trait]
pub trait UrlStorage: Send + Sync + 'static {
    /// Persists a record.
    ///
    /// When another record already owns `record.long_url`, nothing is written
    /// and [`SaveOutcome::Conflict`] carries that record's short URL.
    async fn save_url(&self, record: UrlRecord) -> Result<SaveOutcome>;

    /// Resolves an identifier, ignoring ASCII case.
    ///
    /// Returns `None` if the identifier is unknown. A tombstoned record is
    /// returned with `deleted` set.
    async fn get_long_url(&self, id: &str) -> Result<Option<ResolvedUrl>>;

    /// Tombstones every record in `ids` owned by `user_id`.
    ///
    /// Records owned by other users are skipped. Returns the number of
    /// matched records; a non-empty batch that matches nothing fails with
    /// [`StorageError::NothingMatched`](crate::StorageError::NothingMatched).
    async fn delete_urls(&self, ids: &[String], user_id: &str) -> Result<u64>;

    /// Lists the live URLs owned by `user_id`.
    async fn urls_by_user(&self, user_id: &str) -> Result<Vec<UserUrl>>;

    /// Checks that the backend is reachable.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
impl<S: UrlStorage + ?Sized> UrlStorage for Arc<S> {
    async fn save_url(&self, record: UrlRecord) -> Result<SaveOutcome> {
        (**self).save_url(record).await
    }

    async fn get_long_url(&self, id: &str) -> Result<Option<ResolvedUrl>> {
        (**self).get_long_url(id).await
    }

    async fn delete_urls(&self, ids: &[String], user_id: &str) -> Result<u64> {
        (**self).delete_urls(ids, user_id).await
    }

    async fn urls_by_user(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        (**self).urls_by_user(user_id).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }
}
