use async_trait::async_trait;
use linkstash_core::{ResolvedUrl, Result, SaveOutcome, StorageError, UrlRecord, UrlStorage, UserUrl};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

/// DDL for the `urls` table and its case-insensitive id index. Idempotent.
pub const SCHEMA: &str = include_str!("../ddl/postgres/urls.sql");

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// PostgreSQL implementation of the storage contract.
///
/// Soft delete is the `flag` column. Saves rely on the unique constraint on
/// `long_url`: the insert is a no-op on conflict and a second statement reads
/// back the canonical short URL. The two statements do not share a
/// transaction, so under concurrent writers the read-back may observe a row
/// written by a third party rather than the one that blocked this insert.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Creates a storage from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool to `database_url`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `urls` table and its indexes if they don't exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        info!("urls table is ready");
        Ok(())
    }

}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Configuration(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl UrlStorage for PostgresStorage {
    async fn save_url(&self, record: UrlRecord) -> Result<SaveOutcome> {
        record.validate()?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO urls (id, long_url, short_url, user_id, flag)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (long_url) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.long_url)
        .bind(&record.short_url)
        .bind(&record.user_id)
        .bind(record.deleted)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {}
            // Only the id constraints remain: the primary key and `urls_lower_id_idx`.
            Err(err) if is_unique_violation(&err) => return Err(StorageError::IdTaken(record.id)),
            Err(err) => return Err(map_sqlx_error(err)),
        }

        let canonical: String = sqlx::query_scalar(
            r#"
            SELECT short_url
            FROM urls
            WHERE long_url = $1
            "#,
        )
        .bind(&record.long_url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if canonical != record.short_url {
            debug!(id = %record.id, existing = %canonical, "long url already shortened");
            return Ok(SaveOutcome::Conflict {
                short_url: canonical,
            });
        }
        Ok(SaveOutcome::Created)
    }

    async fn get_long_url(&self, id: &str) -> Result<Option<ResolvedUrl>> {
        let row = sqlx::query(
            r#"
            SELECT long_url, flag
            FROM urls
            WHERE lower(id) = lower($1)
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(ResolvedUrl {
            long_url: row.try_get("long_url").map_err(map_sqlx_error)?,
            deleted: row.try_get("flag").map_err(map_sqlx_error)?,
        }))
    }

    async fn delete_urls(&self, ids: &[String], user_id: &str) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let lowered: Vec<String> = ids.iter().map(|id| id.to_ascii_lowercase()).collect();

        let result = sqlx::query(
            r#"
            UPDATE urls
            SET flag = true
            WHERE user_id = $1
              AND lower(id) = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(lowered)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match result.rows_affected() {
            0 => Err(StorageError::NothingMatched {
                user_id: user_id.to_string(),
            }),
            matched => Ok(matched),
        }
    }

    async fn urls_by_user(&self, user_id: &str) -> Result<Vec<UserUrl>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT short_url, long_url
            FROM urls
            WHERE user_id = $1
              AND flag = false
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(short_url, long_url)| UserUrl {
                short_url,
                long_url,
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}
