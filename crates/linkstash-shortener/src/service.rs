use crate::deletion::DeletionQueue;
use crate::error::{Result, ShortenerError};
use linkstash_core::{DeleteRequest, SaveOutcome, StorageError, UrlRecord, UrlStorage, UserUrl};
use linkstash_generator::Generator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// How many fresh ids to try when the generator hits an id already in use.
const MAX_ID_ATTEMPTS: usize = 3;

/// Result of shortening a single URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub short_url: String,
    /// `false` when the URL had already been shortened and `short_url` is the
    /// existing one.
    pub created: bool,
}

/// One entry of a batch shorten request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub correlation_id: String,
    pub original_url: String,
}

/// One entry of a batch shorten response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchShortened {
    pub correlation_id: String,
    pub short_url: String,
}

/// What a short id resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Redirect(String),
    /// The record exists but has been tombstoned.
    Gone,
    NotFound,
}

/// Request-facing facade over a storage backend, an id generator and the
/// deletion queue.
pub struct ShortenerService<S: ?Sized, G> {
    storage: Arc<S>,
    generator: Arc<G>,
    deletions: DeletionQueue,
    base_url: String,
}

impl<S: ?Sized, G> Clone for ShortenerService<S, G> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            generator: Arc::clone(&self.generator),
            deletions: self.deletions.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

impl<S, G> ShortenerService<S, G>
where
    S: UrlStorage + ?Sized,
    G: Generator,
{
    pub fn new(
        storage: Arc<S>,
        generator: G,
        deletions: DeletionQueue,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            generator: Arc::new(generator),
            deletions,
            base_url: base_url.into(),
        }
    }

    /// Checks that the input is an absolute http(s) URL with a host.
    ///
    /// The trimmed input is stored as given, so resolving returns exactly
    /// what was submitted.
    fn validate_url(raw: &str) -> Result<String> {
        let candidate = raw.trim();
        if candidate.is_empty() {
            return Err(ShortenerError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let parsed = url::Url::parse(candidate)
            .map_err(|e| ShortenerError::InvalidUrl(format!("{candidate}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {candidate}"
            )));
        }

        Ok(candidate.to_string())
    }

    async fn save_new(&self, long_url: &str, user_id: &str) -> Result<Shortened> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let id = self.generator.generate();
            let record = UrlRecord::new(id, long_url, &self.base_url, user_id);
            let short_url = record.short_url.clone();

            match self.storage.save_url(record).await {
                Ok(SaveOutcome::Created) => {
                    return Ok(Shortened {
                        short_url,
                        created: true,
                    })
                }
                Ok(SaveOutcome::Conflict { short_url }) => {
                    return Ok(Shortened {
                        short_url,
                        created: false,
                    })
                }
                Err(StorageError::IdTaken(id)) if attempts < MAX_ID_ATTEMPTS => {
                    debug!(id = %id, attempts, "generated id already taken, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Shortens `long_url` on behalf of `user_id`.
    pub async fn shorten(&self, long_url: &str, user_id: &str) -> Result<Shortened> {
        let long_url = Self::validate_url(long_url)?;
        let shortened = self.save_new(&long_url, user_id).await?;

        debug!(
            long_url = %long_url,
            short_url = %shortened.short_url,
            created = shortened.created,
            "shortened url"
        );
        Ok(shortened)
    }

    /// Shortens every item, answering with the short URL per correlation id.
    ///
    /// The whole batch is rejected if any URL is invalid. Items whose URL is
    /// already stored get the existing short URL.
    pub async fn shorten_batch(
        &self,
        items: Vec<BatchItem>,
        user_id: &str,
    ) -> Result<Vec<BatchShortened>> {
        let mut validated = Vec::with_capacity(items.len());
        for item in items {
            let long_url = Self::validate_url(&item.original_url)?;
            validated.push((item.correlation_id, long_url));
        }

        let mut shortened = Vec::with_capacity(validated.len());
        for (correlation_id, long_url) in validated {
            let Shortened { short_url, .. } = self.save_new(&long_url, user_id).await?;
            shortened.push(BatchShortened {
                correlation_id,
                short_url,
            });
        }
        Ok(shortened)
    }

    pub async fn resolve(&self, id: &str) -> Result<Resolution> {
        trace!(id = %id, "resolving short id");

        let resolution = match self.storage.get_long_url(id).await? {
            Some(resolved) if resolved.deleted => Resolution::Gone,
            Some(resolved) => Resolution::Redirect(resolved.long_url),
            None => Resolution::NotFound,
        };
        Ok(resolution)
    }

    pub async fn user_urls(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        Ok(self.storage.urls_by_user(user_id).await?)
    }

    /// Queues the ids for tombstoning and returns once they are enqueued.
    ///
    /// The outcome of the deletion itself is never reported back.
    pub async fn delete(&self, ids: Vec<String>, user_id: &str) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        debug!(user_id = %user_id, ids = ids.len(), "queueing deletion");
        self.deletions
            .enqueue(DeleteRequest::new(user_id, ids))
            .await
    }

    pub async fn ping(&self) -> Result<()> {
        Ok(self.storage.ping().await?)
    }
}
