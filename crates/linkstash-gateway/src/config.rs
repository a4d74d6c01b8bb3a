use clap::Parser;
use linkstash_core::{Result, UrlStorage};
use linkstash_shortener::deletion::DEFAULT_CAPACITY;
use linkstash_storage::{FileStorage, MemoryStorage, PostgresStorage};
use linkstash_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

pub const SERVER_ADDRESS_ENV: &str = "SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "BASE_URL";
pub const FILE_STORAGE_PATH_ENV: &str = "FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "DATABASE_DSN";
pub const DELETE_QUEUE_CAPACITY_ENV: &str = "DELETE_QUEUE_CAPACITY";
pub const ID_LENGTH_ENV: &str = "ID_LENGTH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Parser)]
#[command(name = "linkstash", version, about = "URL shortener HTTP server")]
pub struct Cli {
    /// Address the HTTP server listens on.
    #[arg(
        short = 'a',
        long,
        env = SERVER_ADDRESS_ENV,
        default_value = DEFAULT_SERVER_ADDRESS
    )]
    pub server_address: String,

    /// Prefix of every short URL handed out.
    #[arg(short = 'b', long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// JSON file backing the store. An empty value counts as unset.
    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<String>,

    /// PostgreSQL connection string. Takes precedence over the file path.
    #[arg(short = 'd', long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,

    #[arg(
        long,
        env = DELETE_QUEUE_CAPACITY_ENV,
        default_value_t = DEFAULT_CAPACITY,
        value_parser = parse_capacity
    )]
    pub delete_queue_capacity: usize,

    #[arg(
        long,
        env = ID_LENGTH_ENV,
        default_value_t = 10,
        value_parser = clap::value_parser!(u8).range(1..)
    )]
    pub id_length: u8,

    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

fn parse_capacity(raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("capacity must be at least 1".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(e.to_string()),
    }
}

/// Which backend the configuration selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    File(PathBuf),
    Postgres(String),
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::File(path) => write!(f, "file ({})", path.display()),
            StorageBackend::Postgres(_) => write!(f, "postgres"),
        }
    }
}

impl Cli {
    /// A DSN wins over a file path; with neither, records live in memory.
    /// Empty values count as unset.
    pub fn storage_backend(&self) -> StorageBackend {
        if let Some(dsn) = self.database_dsn.as_ref().filter(|dsn| !dsn.is_empty()) {
            return StorageBackend::Postgres(dsn.clone());
        }
        if let Some(path) = self.file_storage_path.as_ref().filter(|path| !path.is_empty()) {
            return StorageBackend::File(PathBuf::from(path));
        }
        StorageBackend::Memory
    }
}

/// Opens the selected backend. For Postgres this connects and creates the
/// `urls` table.
pub async fn open_storage(backend: &StorageBackend) -> Result<Arc<dyn UrlStorage>> {
    let storage: Arc<dyn UrlStorage> = match backend {
        StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        StorageBackend::File(path) => Arc::new(FileStorage::open(path).await?),
        StorageBackend::Postgres(dsn) => {
            let storage = PostgresStorage::connect(dsn).await?;
            storage.ensure_schema().await?;
            Arc::new(storage)
        }
    };
    info!(backend = %backend, "storage ready");
    Ok(storage)
}
