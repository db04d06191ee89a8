// Fusion Module - Normalize → Merge → Deduplicate
//
// Pure, synchronous batch transformation. No I/O and no shared state: the runner
// collects every source's raw records first and hands one batch to `reconcile`.

pub mod dedup;
pub mod merge;

pub use dedup::deduplicate;
pub use merge::merge;

use crate::error::{IngestError, IngestResult};
use crate::normalize::{normalize, RawHostRecord};
use hostfuse_common::{CanonicalHost, SourceKind};
use tracing::{info, warn};

/// What to do when a single raw record cannot be normalized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log and collect the failure, keep processing the batch
    #[default]
    SkipInvalid,
    /// Abort the whole batch on the first invalid record
    FailBatch,
}

/// Raw record tagged with its source and position in that source's batch
#[derive(Debug, Clone)]
pub struct SourcedRecord {
    pub source: SourceKind,
    pub index: usize,
    pub raw: RawHostRecord,
}

impl SourcedRecord {
    /// Tag every record fetched from one source
    pub fn tag_all(source: SourceKind, records: Vec<RawHostRecord>) -> Vec<SourcedRecord> {
        records
            .into_iter()
            .enumerate()
            .map(|(index, raw)| SourcedRecord { source, index, raw })
            .collect()
    }
}

/// Record rejected during normalization
#[derive(Debug)]
pub struct RecordFailure {
    pub source: SourceKind,
    pub index: usize,
    pub error: IngestError,
}

/// Deduplicated hosts plus everything that was rejected on the way
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub hosts: Vec<CanonicalHost>,
    pub rejected: Vec<RecordFailure>,
    /// Raw records handed in
    pub received: usize,
    /// Records that normalized successfully (before dedup)
    pub normalized: usize,
}

/// Normalize and deduplicate one batch
///
/// With `ErrorPolicy::FailBatch` the first invalid record is returned as the error;
/// with `SkipInvalid` invalid records are reported in `rejected`.
pub fn reconcile(batch: Vec<SourcedRecord>, policy: ErrorPolicy) -> IngestResult<ReconcileOutcome> {
    let received = batch.len();
    let mut normalized = Vec::with_capacity(received);
    let mut rejected = Vec::new();

    for record in batch {
        match normalize(&record.raw, record.source) {
            Ok(host) => normalized.push(host),
            Err(error) if policy == ErrorPolicy::FailBatch => return Err(error),
            Err(error) => {
                warn!(
                    "Skipping {} record #{}: {}",
                    record.source, record.index, error
                );
                rejected.push(RecordFailure {
                    source: record.source,
                    index: record.index,
                    error,
                });
            }
        }
    }

    let normalized_count = normalized.len();
    let hosts = deduplicate(normalized);

    info!(
        "Reconciled {} records: {} normalized, {} rejected, {} unique hosts",
        received,
        normalized_count,
        rejected.len(),
        hosts.len()
    );

    Ok(ReconcileOutcome {
        hosts,
        rejected,
        received,
        normalized: normalized_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch() -> Vec<SourcedRecord> {
        let mut records = SourcedRecord::tag_all(
            SourceKind::Qualys,
            vec![
                json!({"_id": "h1", "agentInfo": {"lastCheckedIn": {"$date": "2024-01-01"}}}),
                json!({"address": "10.0.0.9"}),
            ],
        );
        records.extend(SourcedRecord::tag_all(
            SourceKind::CrowdStrike,
            vec![json!({"device_id": "h1", "last_seen": "2024-01-02T00:00:00Z", "tags": ["edr"]})],
        ));
        records
    }

    #[test]
    fn test_skip_invalid_reports_rejections() {
        let outcome = reconcile(batch(), ErrorPolicy::SkipInvalid).unwrap();

        assert_eq!(outcome.received, 3);
        assert_eq!(outcome.normalized, 2);
        assert_eq!(outcome.hosts.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert_eq!(outcome.rejected[0].source, SourceKind::Qualys);
        assert_eq!(outcome.rejected[0].index, 1);
        assert!(outcome.rejected[0].error.is_record_error());
    }

    #[test]
    fn test_fail_batch_returns_first_error() {
        let err = reconcile(batch(), ErrorPolicy::FailBatch).unwrap_err();
        assert!(matches!(err, IngestError::MissingRequiredField { .. }));
    }

    #[test]
    fn test_cross_source_same_id_is_merged() {
        let outcome = reconcile(batch(), ErrorPolicy::SkipInvalid).unwrap();
        let host = &outcome.hosts[0];
        assert_eq!(host.host_id(), "h1");
        assert!(host.tags.contains("edr"));
        assert_eq!(host.last_seen.to_rfc3339(), "2024-01-02T00:00:00+00:00");
    }

    #[test]
    fn test_empty_batch() {
        let outcome = reconcile(Vec::new(), ErrorPolicy::FailBatch).unwrap();
        assert!(outcome.hosts.is_empty());
        assert_eq!(outcome.received, 0);
    }
}
