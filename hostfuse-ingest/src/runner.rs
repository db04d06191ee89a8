//! Ingest runner
//!
//! Fetch every enabled source concurrently, reconcile the combined batch, persist the
//! result. A source that fails to fetch never reaches the fusion core: under
//! `SkipInvalid` it is reported and the remaining sources proceed, under `FailBatch`
//! the run stops before anything is written.

use crate::error::{IngestError, IngestResult};
use crate::fusion::{reconcile, ErrorPolicy, RecordFailure, SourcedRecord};
use crate::sink::HostSink;
use crate::sources::{fetch_all, HostSource};
use futures::future::join_all;
use hostfuse_common::config::ResolvedSource;
use hostfuse_common::db::UpsertSummary;
use hostfuse_common::SourceKind;
use std::time::Instant;
use tracing::{info, warn};

/// One source plus its paging window
pub struct SourcePlan {
    pub source: Box<dyn HostSource>,
    pub page_size: usize,
    pub max_pages: usize,
}

impl SourcePlan {
    pub fn new(source: Box<dyn HostSource>, page_size: usize, max_pages: usize) -> Self {
        Self {
            source,
            page_size,
            max_pages,
        }
    }

    /// Live API source with the paging window from configuration
    pub fn from_settings(settings: &ResolvedSource) -> IngestResult<Self> {
        let source = crate::sources::ApiHostSource::new(settings)?;
        Ok(Self::new(
            Box::new(source),
            settings.page_size,
            settings.max_pages,
        ))
    }

    pub fn kind(&self) -> SourceKind {
        self.source.source_kind()
    }
}

/// Source that could not be fetched
#[derive(Debug)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub error: IngestError,
}

/// Everything a run did
#[derive(Debug, Default)]
pub struct RunSummary {
    pub received: usize,
    pub normalized: usize,
    /// Unique hosts handed to the sink
    pub hosts: usize,
    pub rejected: Vec<RecordFailure>,
    pub failed_sources: Vec<SourceFailure>,
    pub persisted: UpsertSummary,
}

/// Run one ingest pass over `plans` into `sink`
pub async fn run_ingest(
    plans: &[SourcePlan],
    sink: &dyn HostSink,
    policy: ErrorPolicy,
) -> IngestResult<RunSummary> {
    let started = Instant::now();
    info!("Starting ingest over {} sources", plans.len());

    let fetches = plans.iter().map(|plan| async move {
        let kind = plan.kind();
        let result = fetch_all(plan.source.as_ref(), plan.page_size, plan.max_pages).await;
        (kind, result)
    });

    let mut batch = Vec::new();
    let mut failed_sources = Vec::new();

    for (kind, result) in join_all(fetches).await {
        match result {
            Ok(records) => {
                info!("Fetched {} records from {}", records.len(), kind);
                batch.extend(SourcedRecord::tag_all(kind, records));
            }
            Err(error) if policy == ErrorPolicy::FailBatch => return Err(error),
            Err(error) => {
                warn!("Source {} failed, continuing without it: {}", kind, error);
                failed_sources.push(SourceFailure {
                    source: kind,
                    error,
                });
            }
        }
    }

    if !plans.is_empty() && failed_sources.len() == plans.len() {
        // Nothing fetched at all; writing an empty batch would hide the outage
        let first = failed_sources.remove(0);
        return Err(first.error);
    }

    let outcome = reconcile(batch, policy)?;
    let persisted = sink.upsert(&outcome.hosts).await?;

    info!(
        "Ingest finished in {:.2}s: {} hosts ({} written)",
        started.elapsed().as_secs_f64(),
        outcome.hosts.len(),
        persisted.written()
    );

    Ok(RunSummary {
        received: outcome.received,
        normalized: outcome.normalized,
        hosts: outcome.hosts.len(),
        rejected: outcome.rejected,
        failed_sources,
        persisted,
    })
}
