//! URL shortener service and the asynchronous deletion pipeline.
//!
//! [`ShortenerService`] is what request handlers call: it validates input,
//! generates identifiers, talks to a [`UrlStorage`](linkstash_core::UrlStorage)
//! backend and hands deletions to the [`deletion`] worker.

pub mod deletion;
pub mod error;
pub mod service;

pub use deletion::{DeletionQueue, DeletionStats, DeletionWorker};
pub use error::{Result, ShortenerError};
pub use service::{BatchItem, BatchShortened, Resolution, Shortened, ShortenerService};
