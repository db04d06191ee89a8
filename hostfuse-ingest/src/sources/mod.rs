//! Host sources
//!
//! A host source yields raw vendor records one `(skip, limit)` page at a time.
//! Transport and authentication failures stay here; the fusion core only ever sees
//! records that were fetched successfully.

pub mod api_client;
pub mod file_source;

pub use api_client::ApiHostSource;
pub use file_source::FileHostSource;

use crate::error::{IngestError, IngestResult};
use crate::normalize::RawHostRecord;
use async_trait::async_trait;
use hostfuse_common::SourceKind;
use serde_json::Value;
use tracing::{debug, warn};

/// Source trait - every inventory source implements this
#[async_trait]
pub trait HostSource: Send + Sync {
    /// Which vendor schema the records follow
    fn source_kind(&self) -> SourceKind;

    /// Fetch one page of raw records
    ///
    /// A page shorter than `limit` means there is nothing after it.
    async fn fetch_page(&self, skip: usize, limit: usize) -> IngestResult<Vec<RawHostRecord>>;
}

/// Page through a source until a short page or `max_pages`
pub async fn fetch_all(
    source: &dyn HostSource,
    page_size: usize,
    max_pages: usize,
) -> IngestResult<Vec<RawHostRecord>> {
    let kind = source.source_kind();
    if page_size == 0 {
        return Err(IngestError::Source {
            vendor: kind,
            message: "page size must be at least 1".to_string(),
        });
    }

    let mut records = Vec::new();
    for page in 0..max_pages {
        let batch = source.fetch_page(page * page_size, page_size).await?;
        let count = batch.len();
        records.extend(batch);

        debug!("{} page {}: {} records", kind, page, count);

        if count < page_size {
            return Ok(records);
        }
    }

    warn!(
        "{} stopped after {} pages ({} records); more may be available",
        kind,
        max_pages,
        records.len()
    );
    Ok(records)
}

/// Interpret a response body as a list of raw records
pub(crate) fn into_records(kind: SourceKind, body: Value) -> IngestResult<Vec<RawHostRecord>> {
    match body {
        Value::Array(records) => Ok(records),
        other => Err(IngestError::Source {
            vendor: kind,
            message: format!(
                "expected a JSON array of host records, got {}",
                json_kind(&other)
            ),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
