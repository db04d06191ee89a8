//! Ingest run bookkeeping
//!
//! One row per invocation in `ingest_runs`: counts from the reconcile pass and the
//! upsert, plus the error message when the run failed.

use chrono::{DateTime, Utc};
use hostfuse_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            _ => RunStatus::Running,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestRun {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub received: usize,
    pub normalized: usize,
    pub rejected: usize,
    /// Rows inserted or updated
    pub persisted: usize,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl IngestRun {
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Running,
            received: 0,
            normalized: 0,
            rejected: 0,
            persisted: 0,
            error: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.ended_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl fmt::Display) {
        self.status = RunStatus::Failed;
        self.error = Some(error.to_string());
        self.ended_at = Some(Utc::now());
    }
}

/// Insert or update a run row
pub async fn save_run(pool: &SqlitePool, run: &IngestRun) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO ingest_runs (
            run_id, status, received, normalized, rejected, persisted,
            error, started_at, ended_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(run_id) DO UPDATE SET
            status = excluded.status,
            received = excluded.received,
            normalized = excluded.normalized,
            rejected = excluded.rejected,
            persisted = excluded.persisted,
            error = excluded.error,
            ended_at = excluded.ended_at
        "#,
    )
    .bind(run.run_id.to_string())
    .bind(run.status.as_str())
    .bind(run.received as i64)
    .bind(run.normalized as i64)
    .bind(run.rejected as i64)
    .bind(run.persisted as i64)
    .bind(&run.error)
    .bind(run.started_at.to_rfc3339())
    .bind(run.ended_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a run by id
pub async fn load_run(pool: &SqlitePool, run_id: Uuid) -> Result<Option<IngestRun>> {
    let row = sqlx::query(
        r#"
        SELECT run_id, status, received, normalized, rejected, persisted,
               error, started_at, ended_at
        FROM ingest_runs
        WHERE run_id = ?
        "#,
    )
    .bind(run_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|row| {
        let started_at: String = row.get("started_at");
        let ended_at: Option<String> = row.get("ended_at");
        let status: String = row.get("status");

        Ok(IngestRun {
            run_id,
            status: RunStatus::parse(&status),
            received: row.get::<i64, _>("received") as usize,
            normalized: row.get::<i64, _>("normalized") as usize,
            rejected: row.get::<i64, _>("rejected") as usize,
            persisted: row.get::<i64, _>("persisted") as usize,
            error: row.get("error"),
            started_at: parse_stored_time(&started_at)?,
            ended_at: ended_at.as_deref().map(parse_stored_time).transpose()?,
        })
    })
    .transpose()
}

fn parse_stored_time(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| hostfuse_common::Error::InvalidInput(format!("Stored time {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostfuse_common::db::init_database;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_lifecycle_round_trips() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("hostfuse.db")).await.unwrap();

        let mut run = IngestRun::start();
        save_run(&pool, &run).await.unwrap();

        let stored = load_run(&pool, run.run_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Running);
        assert!(stored.ended_at.is_none());

        run.received = 4;
        run.normalized = 3;
        run.rejected = 1;
        run.persisted = 2;
        run.complete();
        save_run(&pool, &run).await.unwrap();

        let stored = load_run(&pool, run.run_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Completed);
        assert_eq!(stored.rejected, 1);
        assert_eq!(stored.persisted, 2);
        assert!(stored.ended_at.is_some());
    }

    #[tokio::test]
    async fn test_failed_run_keeps_message() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("hostfuse.db")).await.unwrap();

        let mut run = IngestRun::start();
        run.fail("qualys source error: API returned error: 401 Unauthorized");
        save_run(&pool, &run).await.unwrap();

        let stored = load_run(&pool, run.run_id).await.unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Failed);
        assert!(stored.error.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn test_unknown_run_is_none() {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("hostfuse.db")).await.unwrap();
        assert!(load_run(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }
}
