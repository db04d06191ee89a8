//! Database initialization and host upsert tests
//!
//! Verifies first-run creation, reopening an existing database, and the
//! idempotent upsert contract keyed by host_id.

use chrono::{TimeZone, Utc};
use hostfuse_common::db::{count_hosts, init_database, load_host, load_hosts, upsert_hosts};
use hostfuse_common::{CanonicalHost, Field, ScalarField};

fn host(id: &str, day: u32, os: &str) -> CanonicalHost {
    let mut host = CanonicalHost::new(id, Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap())
        .unwrap()
        .with(ScalarField::Os, Field::known(os));
    host.tags.insert("prod".to_string());
    host.open_ports.insert(22);
    host
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("hostfuse.db");

    let pool = init_database(&db_path).await;
    assert!(pool.is_ok(), "Database initialization failed: {:?}", pool.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("hostfuse.db");

    let pool1 = init_database(&db_path).await.unwrap();
    upsert_hosts(&pool1, &[host("h1", 1, "Linux")]).await.unwrap();
    drop(pool1);

    let pool2 = init_database(&db_path).await.unwrap();
    assert_eq!(count_hosts(&pool2).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_inserts_then_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("hostfuse.db")).await.unwrap();

    let hosts = vec![host("h2", 2, "Windows"), host("h1", 1, "Linux")];
    let summary = upsert_hosts(&pool, &hosts).await.unwrap();
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.written(), 2);

    let loaded = load_hosts(&pool).await.unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].host_id(), "h1", "load_hosts orders by host_id");
    assert_eq!(loaded[0], hosts[1]);

    assert!(load_host(&pool, "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_upsert_same_content_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("hostfuse.db")).await.unwrap();
    let batch = vec![host("h1", 1, "Linux")];

    upsert_hosts(&pool, &batch).await.unwrap();
    let before: String = sqlx::query_scalar("SELECT updated_at FROM hosts WHERE host_id = 'h1'")
        .fetch_one(&pool)
        .await
        .unwrap();

    let summary = upsert_hosts(&pool, &batch).await.unwrap();
    assert_eq!(summary.unchanged, 1);
    assert_eq!(summary.written(), 0);

    let after: String = sqlx::query_scalar("SELECT updated_at FROM hosts WHERE host_id = 'h1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(before, after);
    assert_eq!(count_hosts(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_changed_content_updates_row() {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("hostfuse.db")).await.unwrap();

    upsert_hosts(&pool, &[host("h1", 1, "Linux")]).await.unwrap();
    let summary = upsert_hosts(&pool, &[host("h1", 5, "Ubuntu")]).await.unwrap();
    assert_eq!(summary.updated, 1);

    let stored = load_host(&pool, "h1").await.unwrap().unwrap();
    assert_eq!(stored.os.value, Field::known("Ubuntu"));

    let os_column: String = sqlx::query_scalar("SELECT os FROM hosts WHERE host_id = 'h1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(os_column, "Ubuntu");
}
