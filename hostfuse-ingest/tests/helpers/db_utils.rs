//! Database and fixture utilities

use anyhow::Result;
use hostfuse_common::db::init_database;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary database with all tables
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let pool = init_database(&temp_dir.path().join("hostfuse.db")).await?;
    Ok((temp_dir, pool))
}

/// Path of a file under tests/fixtures
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
