//! Storage backends for linkstash.
//!
//! Three interchangeable implementations of [`UrlStorage`]:
//! [`MemoryStorage`] (process lifetime only), [`FileStorage`] (a JSON file
//! rewritten on every mutation) and [`PostgresStorage`] (sqlx).

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FileStorage;
pub use linkstash_core::{Result, StorageError, UrlStorage};
pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;
