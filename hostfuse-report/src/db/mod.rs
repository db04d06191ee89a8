//! Read-only database access for hostfuse-report

use anyhow::{Context, Result};
use hostfuse_common::db::load_hosts;
use hostfuse_common::CanonicalHost;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the database in read-only mode (`mode=ro`)
///
/// A missing database is an error: the report never creates one.
pub async fn connect_readonly(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found: {}\nRun hostfuse-ingest first to populate it.",
            db_path.display()
        );
    }

    let db_url = format!("sqlite://{}?mode=ro", db_path.display());

    SqlitePool::connect(&db_url)
        .await
        .context("Failed to connect to database in read-only mode")
}

/// Every stored host, ordered by host_id
pub async fn read_hosts(pool: &SqlitePool) -> Result<Vec<CanonicalHost>> {
    load_hosts(pool).await.context("Failed to read hosts table")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostfuse_common::db::init_database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_database_is_not_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostfuse.db");

        assert!(connect_readonly(&path).await.is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_readonly_connection_rejects_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hostfuse.db");
        init_database(&path).await.unwrap().close().await;

        let pool = connect_readonly(&path).await.unwrap();
        let write = sqlx::query("CREATE TABLE _test_write (id INTEGER)")
            .execute(&pool)
            .await;
        assert!(write.is_err());

        assert!(read_hosts(&pool).await.unwrap().is_empty());
    }
}
