//! Schema normalizers
//!
//! One pure function per source maps a raw vendor record onto [`CanonicalHost`].
//! Optional fields tolerate absence at any depth; `host_id` and `last_seen` are
//! required and are never defaulted.

pub mod crowdstrike;
pub mod paths;
pub mod qualys;

use crate::error::{IngestError, IngestResult, RequiredField};
use chrono::{DateTime, Utc};
use hostfuse_common::{CanonicalHost, SourceKind};
use serde_json::Value;

/// Raw record exactly as delivered by one vendor API
pub type RawHostRecord = Value;

/// Normalize one raw record from `source`
pub fn normalize(raw: &RawHostRecord, source: SourceKind) -> IngestResult<CanonicalHost> {
    match source {
        SourceKind::Qualys => qualys::normalize_qualys_host(raw),
        SourceKind::CrowdStrike => crowdstrike::normalize_crowdstrike_host(raw),
    }
}

/// Locations of the two load-bearing fields plus fallbacks for error messages
pub(crate) struct RequiredPaths<'a> {
    pub vendor: SourceKind,
    pub host_id: &'a [&'a str],
    pub last_seen: &'a [&'a str],
    pub hints: &'a [&'a [&'a str]],
}

impl RequiredPaths<'_> {
    /// Derive (host_id, last_seen) or fail with the matching record error
    pub fn extract(&self, raw: &Value) -> IngestResult<(String, DateTime<Utc>)> {
        let host_id = paths::lookup(raw, self.host_id)
            .and_then(paths::identifier)
            .ok_or_else(|| IngestError::MissingRequiredField {
                field: RequiredField::HostId,
                vendor: self.vendor,
                record: paths::record_hint(raw, self.hints),
            })?;

        let raw_last_seen =
            paths::lookup(raw, self.last_seen).ok_or_else(|| IngestError::MissingRequiredField {
                field: RequiredField::LastSeen,
                vendor: self.vendor,
                record: host_id.clone(),
            })?;

        let last_seen =
            paths::instant(raw_last_seen).ok_or_else(|| IngestError::InvalidTimestamp {
                vendor: self.vendor,
                record: host_id.clone(),
                value: raw_last_seen.to_string(),
            })?;

        Ok((host_id, last_seen))
    }
}
