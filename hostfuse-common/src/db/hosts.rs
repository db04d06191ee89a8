//! Host row persistence
//!
//! Upserts are keyed by `host_id` and idempotent: writing a host whose serialized
//! document equals the stored one leaves the row (including `updated_at`) untouched.

use crate::host::{CanonicalHost, ScalarField};
use crate::{Error, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Per-batch upsert counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl UpsertSummary {
    /// Rows actually written
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Upsert a batch of hosts in one transaction
pub async fn upsert_hosts(pool: &SqlitePool, hosts: &[CanonicalHost]) -> Result<UpsertSummary> {
    let mut summary = UpsertSummary::default();
    let mut tx = pool.begin().await?;

    for host in hosts {
        let document = serde_json::to_string(host)?;

        let existing: Option<String> =
            sqlx::query_scalar("SELECT document FROM hosts WHERE host_id = ?")
                .bind(host.host_id())
                .fetch_optional(&mut *tx)
                .await?;

        match existing {
            Some(stored) if stored == document => {
                summary.unchanged += 1;
                continue;
            }
            Some(_) => summary.updated += 1,
            None => summary.inserted += 1,
        }

        sqlx::query(
            r#"
            INSERT INTO hosts (host_id, os, last_seen, document, created_at, updated_at)
            VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT(host_id) DO UPDATE SET
                os = excluded.os,
                last_seen = excluded.last_seen,
                document = excluded.document,
                updated_at = CURRENT_TIMESTAMP
            WHERE hosts.document <> excluded.document
            "#,
        )
        .bind(host.host_id())
        .bind(host.scalar(ScalarField::Os).value.to_string())
        .bind(host.last_seen.to_rfc3339())
        .bind(&document)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    debug!(
        "Upserted {} hosts: {} inserted, {} updated, {} unchanged",
        hosts.len(),
        summary.inserted,
        summary.updated,
        summary.unchanged
    );

    Ok(summary)
}

/// Load every stored host, ordered by host_id
pub async fn load_hosts(pool: &SqlitePool) -> Result<Vec<CanonicalHost>> {
    let rows = sqlx::query("SELECT host_id, document FROM hosts ORDER BY host_id")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let host_id: String = row.get("host_id");
            let document: String = row.get("document");
            decode_document(&host_id, &document)
        })
        .collect()
}

/// Load one host by id
pub async fn load_host(pool: &SqlitePool, host_id: &str) -> Result<Option<CanonicalHost>> {
    let document: Option<String> =
        sqlx::query_scalar("SELECT document FROM hosts WHERE host_id = ?")
            .bind(host_id)
            .fetch_optional(pool)
            .await?;

    document
        .map(|doc| decode_document(host_id, &doc))
        .transpose()
}

pub async fn count_hosts(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hosts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

fn decode_document(host_id: &str, document: &str) -> Result<CanonicalHost> {
    let host: CanonicalHost = serde_json::from_str(document)?;
    if host.host_id() != host_id {
        return Err(Error::InvalidInput(format!(
            "Stored document for {} carries host_id {}",
            host_id,
            host.host_id()
        )));
    }
    Ok(host)
}
