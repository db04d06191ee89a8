//! hostfuse-ingest library interface
//!
//! Normalize → merge → deduplicate for Qualys and CrowdStrike host inventories, plus
//! the sources, sink and runner the `hostfuse-ingest` binary wires together.

pub mod db;
pub mod error;
pub mod fusion;
pub mod normalize;
pub mod runner;
pub mod sink;
pub mod sources;

pub use crate::error::{IngestError, IngestResult, RequiredField};
pub use crate::fusion::{
    deduplicate, merge, reconcile, ErrorPolicy, ReconcileOutcome, RecordFailure, SourcedRecord,
};
pub use crate::normalize::{normalize, RawHostRecord};
pub use crate::runner::{run_ingest, RunSummary, SourcePlan};
pub use crate::sink::{HostSink, MemoryHostSink, SqliteHostSink};
pub use crate::sources::{fetch_all, ApiHostSource, FileHostSource, HostSource};
