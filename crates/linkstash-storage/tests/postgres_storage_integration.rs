//! Runs against a disposable PostgreSQL container.
//!
//! Ignored by default because it needs a docker daemon:
//! `cargo test -p linkstash-storage -- --ignored`.

use std::sync::Arc;
use std::time::Duration;

use linkstash_core::{SaveOutcome, UrlRecord};
use linkstash_storage::{PostgresStorage, StorageError, UrlStorage};
use linkstash_test_infra::postgres::{PostgresConfig, PostgresServer};
use sqlx::postgres::PgPoolOptions;

const BASE: &str = "http://localhost:8080";

struct Fixture {
    _postgres: PostgresServer,
    storage: PostgresStorage,
}

impl Fixture {
    async fn start() -> Self {
        let postgres = PostgresServer::new(PostgresConfig::builder().build())
            .await
            .expect("start postgres");
        let url = postgres.database_url().await.expect("postgres url");
        let pool = connect_with_retry(&url).await;

        let storage = PostgresStorage::new(pool);
        storage.ensure_schema().await.expect("create schema");
        // Running it twice must be harmless.
        storage.ensure_schema().await.expect("schema is idempotent");

        Self {
            _postgres: postgres,
            storage,
        }
    }
}

async fn connect_with_retry(url: &str) -> sqlx::PgPool {
    let mut last_error = None;

    for _ in 0..20 {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect postgres: {last_error:?}");
}

fn record(id: &str, url: &str, user: &str) -> UrlRecord {
    UrlRecord::new(id, url, BASE, user)
}

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn save_and_resolve_round_trip() {
    let fixture = Fixture::start().await;

    let outcome = fixture
        .storage
        .save_url(record("abcdefghij", "https://example.com", "u1"))
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Created);

    let resolved = fixture
        .storage
        .get_long_url("ABCDEFGHIJ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resolved.long_url, "https://example.com");
    assert!(!resolved.deleted);

    assert!(fixture.storage.get_long_url("missing").await.unwrap().is_none());
    fixture.storage.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn duplicate_long_url_reports_stable_conflict() {
    let fixture = Fixture::start().await;

    fixture
        .storage
        .save_url(record("1111111111", "https://example.com", "u1"))
        .await
        .unwrap();
    let second = fixture
        .storage
        .save_url(record("2222222222", "https://example.com", "u1"))
        .await
        .unwrap();
    let third = fixture
        .storage
        .save_url(record("3333333333", "https://example.com", "u2"))
        .await
        .unwrap();

    let expected = format!("{BASE}/1111111111");
    assert_eq!(second.conflict(), Some(expected.as_str()));
    assert_eq!(third, second);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn reused_id_is_rejected_in_any_case() {
    let fixture = Fixture::start().await;

    fixture
        .storage
        .save_url(record("abc", "https://one.example", "u1"))
        .await
        .unwrap();
    for reused in ["abc", "ABC", "aBc"] {
        let err = fixture
            .storage
            .save_url(record(reused, "https://two.example", "u1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::IdTaken(_)), "{reused} should be taken");
    }

    let resolved = fixture.storage.get_long_url("ABC").await.unwrap().unwrap();
    assert_eq!(resolved.long_url, "https://one.example");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn bulk_delete_is_scoped_to_owner() {
    let fixture = Fixture::start().await;
    let storage = &fixture.storage;

    storage
        .save_url(record("aaa", "https://a.example", "alice"))
        .await
        .unwrap();
    storage
        .save_url(record("bbb", "https://b.example", "alice"))
        .await
        .unwrap();

    let err = storage.delete_urls(&ids(&["aaa"]), "bob").await.unwrap_err();
    assert!(matches!(err, StorageError::NothingMatched { .. }));
    assert!(!storage.get_long_url("aaa").await.unwrap().unwrap().deleted);

    let matched = storage
        .delete_urls(&ids(&["AAA", "missing"]), "alice")
        .await
        .unwrap();
    assert_eq!(matched, 1);
    assert!(storage.get_long_url("aaa").await.unwrap().unwrap().deleted);
    assert!(!storage.get_long_url("bbb").await.unwrap().unwrap().deleted);

    let listed = storage.urls_by_user("alice").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].long_url, "https://b.example");
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn concurrent_savers_lose_nothing() {
    let fixture = Fixture::start().await;
    let storage = Arc::new(fixture.storage.clone());
    let mut handles = vec![];

    for i in 0..20u32 {
        let storage = Arc::clone(&storage);
        handles.push(tokio::spawn(async move {
            storage
                .save_url(record(
                    &format!("id-{i:03}"),
                    &format!("https://example{i}.com"),
                    "u1",
                ))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), SaveOutcome::Created);
    }

    for i in 0..20u32 {
        let resolved = storage
            .get_long_url(&format!("id-{i:03}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.long_url, format!("https://example{i}.com"));
    }
}
