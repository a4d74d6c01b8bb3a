//! Fire-and-forget tombstoning.
//!
//! Handlers push [`DeleteRequest`]s into a bounded queue and acknowledge the
//! client right away. A single consumer task drains the queue and runs every
//! batch as its own task, so batches proceed in parallel and in no particular
//! order. A failed batch is logged and dropped: there is no retry and the
//! original caller never learns about it.
//!
//! Shutdown: drop every [`DeletionQueue`] handle, then await
//! [`DeletionWorker::join`]. The consumer drains whatever is still queued and
//! waits for every in-flight batch before returning.

use crate::error::{Result, ShortenerError};
use linkstash_core::{DeleteRequest, UrlStorage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, info, warn};

/// Queue capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 100;

/// Producer side of the deletion queue.
#[derive(Debug, Clone)]
pub struct DeletionQueue {
    tx: mpsc::Sender<DeleteRequest>,
}

impl DeletionQueue {
    /// Enqueues a batch, waiting for room if the queue is full.
    ///
    /// Fails only once the worker has stopped.
    pub async fn enqueue(&self, request: DeleteRequest) -> Result<()> {
        self.tx
            .send(request)
            .await
            .map_err(|_| ShortenerError::QueueClosed)
    }
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionStats {
    pub completed: u64,
    pub failed: u64,
}

impl DeletionStats {
    fn record(&mut self, outcome: std::result::Result<bool, JoinError>) {
        match outcome {
            Ok(true) => self.completed += 1,
            Ok(false) => self.failed += 1,
            Err(err) => {
                warn!(error = %err, "deletion task aborted");
                self.failed += 1;
            }
        }
    }
}

/// Handle to the running consumer task.
#[derive(Debug)]
pub struct DeletionWorker {
    handle: JoinHandle<DeletionStats>,
}

impl DeletionWorker {
    /// Starts the consumer and returns it with the queue feeding it.
    pub fn spawn<S>(storage: Arc<S>, capacity: usize) -> (DeletionQueue, Self)
    where
        S: UrlStorage + ?Sized,
    {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(consume(storage, rx));
        (DeletionQueue { tx }, Self { handle })
    }

    /// Waits until the queue is closed and drained and every dispatched
    /// batch has finished.
    pub async fn join(self) -> DeletionStats {
        match self.handle.await {
            Ok(stats) => stats,
            Err(err) => {
                warn!(error = %err, "deletion worker terminated abnormally");
                DeletionStats::default()
            }
        }
    }
}

async fn consume<S>(storage: Arc<S>, mut rx: mpsc::Receiver<DeleteRequest>) -> DeletionStats
where
    S: UrlStorage + ?Sized,
{
    let mut in_flight = JoinSet::new();
    let mut stats = DeletionStats::default();

    info!("deletion worker started");

    loop {
        tokio::select! {
            request = rx.recv() => match request {
                Some(request) => {
                    in_flight.spawn(apply(Arc::clone(&storage), request));
                }
                None => break,
            },
            Some(outcome) = in_flight.join_next(), if !in_flight.is_empty() => {
                stats.record(outcome);
            }
        }
    }

    debug!(in_flight = in_flight.len(), "deletion queue closed, waiting for batches");
    while let Some(outcome) = in_flight.join_next().await {
        stats.record(outcome);
    }

    info!(
        completed = stats.completed,
        failed = stats.failed,
        "deletion worker stopped"
    );
    stats
}

async fn apply<S>(storage: Arc<S>, request: DeleteRequest) -> bool
where
    S: UrlStorage + ?Sized,
{
    let DeleteRequest { user_id, ids } = request;

    match storage.delete_urls(&ids, &user_id).await {
        Ok(matched) => {
            debug!(user_id = %user_id, requested = ids.len(), matched, "tombstoned urls");
            true
        }
        Err(err) => {
            warn!(user_id = %user_id, ids = ?ids, error = %err, "failed to delete urls");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use linkstash_core::{ResolvedUrl, SaveOutcome, UrlRecord, UserUrl};
    use linkstash_storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn request(user: &str, ids: &[&str]) -> DeleteRequest {
        DeleteRequest::new(user, ids.iter().map(|id| id.to_string()).collect())
    }

    async fn seeded_store() -> Arc<MemoryStorage> {
        let store = Arc::new(MemoryStorage::new());
        for (id, url) in [("aaa", "https://a.example"), ("bbb", "https://b.example")] {
            store
                .save_url(UrlRecord::new(id, url, "http://s.io", "alice"))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn drains_queue_before_join_returns() {
        let store = seeded_store().await;
        let (queue, worker) = DeletionWorker::spawn(Arc::clone(&store), 8);

        queue.enqueue(request("alice", &["aaa"])).await.unwrap();
        queue.enqueue(request("alice", &["bbb"])).await.unwrap();
        drop(queue);

        let stats = worker.join().await;
        assert_eq!(
            stats,
            DeletionStats {
                completed: 2,
                failed: 0
            }
        );
        assert!(store.get_long_url("aaa").await.unwrap().unwrap().deleted);
        assert!(store.get_long_url("bbb").await.unwrap().unwrap().deleted);
    }

    #[tokio::test]
    async fn failed_batches_are_counted_not_propagated() {
        let store = seeded_store().await;
        let (queue, worker) = DeletionWorker::spawn(Arc::clone(&store), 8);

        queue.enqueue(request("mallory", &["aaa"])).await.unwrap();
        queue.enqueue(request("alice", &["missing"])).await.unwrap();
        queue.enqueue(request("alice", &["bbb"])).await.unwrap();
        drop(queue);

        let stats = worker.join().await;
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 2);
        assert!(!store.get_long_url("aaa").await.unwrap().unwrap().deleted);
        assert!(store.get_long_url("bbb").await.unwrap().unwrap().deleted);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn tombstone_lands_while_worker_keeps_running() {
        let store = seeded_store().await;
        let (queue, worker) = DeletionWorker::spawn(Arc::clone(&store), 8);

        queue.enqueue(request("alice", &["aaa"])).await.unwrap();

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async {
                store.get_long_url("aaa").await.unwrap().unwrap().deleted
            })
            .await;

        drop(queue);
        worker.join().await;
    }

    #[tokio::test]
    async fn enqueue_fails_after_worker_is_gone() {
        let store = Arc::new(MemoryStorage::new());
        let (queue, worker) = DeletionWorker::spawn(store, 1);
        worker.handle.abort();
        let _ = worker.handle.await;

        let err = queue.enqueue(request("alice", &["aaa"])).await.unwrap_err();
        assert!(matches!(err, ShortenerError::QueueClosed));
    }

    /// Storage whose deletes park until released, to observe concurrency.
    #[derive(Default)]
    struct GatedStorage {
        started: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl UrlStorage for GatedStorage {
        async fn save_url(&self, _record: UrlRecord) -> linkstash_core::Result<SaveOutcome> {
            Ok(SaveOutcome::Created)
        }

        async fn get_long_url(&self, _id: &str) -> linkstash_core::Result<Option<ResolvedUrl>> {
            Ok(None)
        }

        async fn delete_urls(&self, ids: &[String], _user_id: &str) -> linkstash_core::Result<u64> {
            let released = self.release.notified();
            self.started.fetch_add(1, Ordering::SeqCst);
            released.await;
            Ok(ids.len() as u64)
        }

        async fn urls_by_user(&self, _user_id: &str) -> linkstash_core::Result<Vec<UserUrl>> {
            Ok(vec![])
        }

        async fn ping(&self) -> linkstash_core::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batches_run_concurrently_and_join_waits_for_them() {
        let store = Arc::new(GatedStorage::default());
        let (queue, worker) = DeletionWorker::spawn(Arc::clone(&store), 8);

        for user in ["u1", "u2", "u3"] {
            queue.enqueue(request(user, &["x"])).await.unwrap();
        }
        drop(queue);

        // All three batches are parked inside storage at the same time.
        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { store.started.load(Ordering::SeqCst) == 3 })
            .await;

        let join = tokio::spawn(worker.join());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!join.is_finished());

        store.release.notify_waiters();
        let stats = join.await.unwrap();
        assert_eq!(stats.completed, 3);
    }
}
