//! Core types and traits for the linkstash URL shortener.
//!
//! This crate holds the URL record model, the deletion request type and the
//! [`UrlStorage`] contract that every storage backend implements.

pub mod error;
pub mod record;
pub mod storage;

pub use error::{Result, StorageError};
pub use record::{short_url, DeleteRequest, ResolvedUrl, SaveOutcome, UrlRecord, UserUrl};
pub use storage::UrlStorage;
