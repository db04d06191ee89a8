//! Offline source backed by a JSON export on disk
//!
//! The file holds the same JSON array the vendor API would page through. Pages are
//! served from memory so `fetch_all` behaves exactly as against the live API.

use super::{into_records, HostSource};
use crate::error::{IngestError, IngestResult};
use crate::normalize::RawHostRecord;
use async_trait::async_trait;
use hostfuse_common::SourceKind;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub struct FileHostSource {
    kind: SourceKind,
    path: PathBuf,
    records: Vec<RawHostRecord>,
}

impl FileHostSource {
    /// Read and parse an export file
    pub async fn open(kind: SourceKind, path: impl AsRef<Path>) -> IngestResult<Self> {
        let path = path.as_ref().to_path_buf();
        let content = tokio::fs::read_to_string(&path).await?;
        let body: Value = serde_json::from_str(&content)?;
        let records = into_records(kind, body).map_err(|e| match e {
            IngestError::Source { vendor, message } => IngestError::Source {
                vendor,
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })?;

        info!("Loaded {} {} records from {}", records.len(), kind, path.display());

        Ok(Self { kind, path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl HostSource for FileHostSource {
    fn source_kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_page(&self, skip: usize, limit: usize) -> IngestResult<Vec<RawHostRecord>> {
        Ok(self.records.iter().skip(skip).take(limit).cloned().collect())
    }
}
