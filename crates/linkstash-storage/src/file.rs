use crate::memory::RecordSet;
use async_trait::async_trait;
use linkstash_core::{ResolvedUrl, Result, SaveOutcome, StorageError, UrlRecord, UrlStorage, UserUrl};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// JSON-file implementation of [`UrlStorage`].
///
/// The file is read once at [`open`](Self::open) into an in-memory mirror
/// that serves every read. Saves and deletes take a per-store lock, read the
/// whole collection back from disk, apply the change, rewrite the whole file
/// and then replace the mirror with what was written. Edits made to the file
/// by another process are therefore not visible until the next write.
///
/// The rewrite is a plain truncate-and-write: a crash in the middle of it
/// can leave a truncated file behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
    mirror: Mutex<RecordSet>,
}

impl FileStorage {
    /// Opens the store at `path`, creating the file and its parent
    /// directories if they don't exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io_error(parent, e))?;
        }
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| map_io_error(&path, e))?;

        let records = read_collection(&path).await?;
        info!(path = %path.display(), records = records.len(), "opened file storage");

        Ok(Self {
            path,
            write_lock: tokio::sync::Mutex::new(()),
            mirror: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn commit(&self, records: RecordSet) -> Result<()> {
        let bytes = serde_json::to_vec(&records)
            .map_err(|e| StorageError::InvalidData(format!("serialize url records: {e}")))?;
        fs::write(&self.path, bytes)
            .await
            .map_err(|e| map_io_error(&self.path, e))?;

        *self.mirror.lock() = records;
        Ok(())
    }
}

async fn read_collection(path: &Path) -> Result<RecordSet> {
    let raw = fs::read_to_string(path)
        .await
        .map_err(|e| map_io_error(path, e))?;

    if raw.trim().is_empty() {
        return Ok(RecordSet::default());
    }

    serde_json::from_str(&raw).map_err(|e| {
        StorageError::InvalidData(format!("malformed storage file {}: {e}", path.display()))
    })
}

fn map_io_error(path: &Path, err: std::io::Error) -> StorageError {
    StorageError::Unavailable(format!("{}: {err}", path.display()))
}

#[async_trait]
impl UrlStorage for FileStorage {
    async fn save_url(&self, record: UrlRecord) -> Result<SaveOutcome> {
        let _guard = self.write_lock.lock().await;

        let mut records = read_collection(&self.path).await?;
        let outcome = records.insert(record)?;

        if outcome == SaveOutcome::Created {
            self.commit(records).await?;
        }
        Ok(outcome)
    }

    async fn get_long_url(&self, id: &str) -> Result<Option<ResolvedUrl>> {
        Ok(self.mirror.lock().resolve(id))
    }

    async fn delete_urls(&self, ids: &[String], user_id: &str) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let _guard = self.write_lock.lock().await;

        let mut records = read_collection(&self.path).await?;
        let matched = records.tombstone(ids, user_id)?;
        self.commit(records).await?;

        debug!(user_id = %user_id, matched, "tombstoned urls in file storage");
        Ok(matched)
    }

    async fn urls_by_user(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        Ok(self.mirror.lock().owned_by(user_id))
    }

    async fn ping(&self) -> Result<()> {
        let metadata = fs::metadata(&self.path)
            .await
            .map_err(|e| map_io_error(&self.path, e))?;

        if !metadata.is_file() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a regular file",
                self.path.display()
            )));
        }
        Ok(())
    }
}
