// CrowdStrike device normalizer
//
// CrowdStrike device records are mostly flat. Tags are bare strings; policies are
// objects carrying a `policy_id`.

use super::paths::{field_at, flat_list};
use super::{RawHostRecord, RequiredPaths};
use crate::error::IngestResult;
use hostfuse_common::{CanonicalHost, ScalarField, SourceKind};
use tracing::debug;

const REQUIRED: RequiredPaths<'static> = RequiredPaths {
    vendor: SourceKind::CrowdStrike,
    host_id: &["device_id"],
    last_seen: &["last_seen"],
    hints: &[&["hostname"], &["local_ip"], &["external_ip"]],
};

/// Normalize a CrowdStrike device to the canonical shape
pub fn normalize_crowdstrike_host(raw: &RawHostRecord) -> IngestResult<CanonicalHost> {
    let (host_id, last_seen) = REQUIRED.extract(raw)?;

    let mut host = CanonicalHost::new(host_id, last_seen)?
        .with(ScalarField::Address, field_at(raw, &["local_ip"]))
        .with(ScalarField::ExternalIp, field_at(raw, &["external_ip"]))
        .with(ScalarField::Os, field_at(raw, &["os_version"]))
        .with(ScalarField::Platform, field_at(raw, &["platform_name"]))
        .with(ScalarField::CloudProvider, field_at(raw, &["cloud_provider"]))
        .with(ScalarField::Hostname, field_at(raw, &["hostname"]));

    host.tags.extend(flat_list(raw, &["tags"], "name"));
    host.policies.extend(flat_list(raw, &["policies"], "policy_id"));

    debug!(
        "Normalized CrowdStrike host {} ({} evidence values)",
        host.host_id(),
        host.evidence_count()
    );

    Ok(host)
}
