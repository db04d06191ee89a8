//! Persistence sink for reconciled hosts
//!
//! The runner hands every deduplicated batch to a `HostSink`. The SQLite sink keys
//! rows by `host_id`, so re-running the same batch leaves the store unchanged.

use crate::error::{IngestError, IngestResult};
use async_trait::async_trait;
use hostfuse_common::db::{upsert_hosts, UpsertSummary};
use hostfuse_common::CanonicalHost;
use sqlx::SqlitePool;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

#[async_trait]
pub trait HostSink: Send + Sync {
    /// Insert or replace hosts by `host_id`
    async fn upsert(&self, hosts: &[CanonicalHost]) -> IngestResult<UpsertSummary>;
}

pub struct SqliteHostSink {
    pool: SqlitePool,
}

impl SqliteHostSink {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl HostSink for SqliteHostSink {
    async fn upsert(&self, hosts: &[CanonicalHost]) -> IngestResult<UpsertSummary> {
        let summary = upsert_hosts(&self.pool, hosts).await?;
        info!(
            "Persisted {} hosts: {} inserted, {} updated, {} unchanged",
            summary.total(),
            summary.inserted,
            summary.updated,
            summary.unchanged
        );
        Ok(summary)
    }
}

/// Sink that keeps hosts in memory (dry runs and tests)
#[derive(Default)]
pub struct MemoryHostSink {
    hosts: Mutex<Vec<CanonicalHost>>,
}

impl MemoryHostSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything upserted so far, one entry per host_id
    pub fn hosts(&self) -> IngestResult<Vec<CanonicalHost>> {
        Ok(self.lock()?.clone())
    }

    /// A panic mid-upsert may have left the store half written
    fn lock(&self) -> IngestResult<MutexGuard<'_, Vec<CanonicalHost>>> {
        self.hosts
            .lock()
            .map_err(|_| IngestError::Sink("in-memory host store is poisoned".to_string()))
    }
}

#[async_trait]
impl HostSink for MemoryHostSink {
    async fn upsert(&self, hosts: &[CanonicalHost]) -> IngestResult<UpsertSummary> {
        let mut summary = UpsertSummary::default();
        let mut stored = self.lock()?;

        for host in hosts {
            match stored.iter_mut().find(|h| h.host_id() == host.host_id()) {
                Some(existing) if existing == host => summary.unchanged += 1,
                Some(existing) => {
                    *existing = host.clone();
                    summary.updated += 1;
                }
                None => {
                    stored.push(host.clone());
                    summary.inserted += 1;
                }
            }
        }

        Ok(summary)
    }
}
