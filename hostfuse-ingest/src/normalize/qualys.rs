// Qualys host asset normalizer
//
// Qualys nests repeated data as `{ "list": [ { "<Wrapper>": { ... } } ] }`, e.g.
// `vuln.list[].HostAssetVuln.qid`. The OS string carries build info after "Build".

use super::paths::{field_at, lookup, scalar_string, wrapped_list};
use super::{RawHostRecord, RequiredPaths};
use crate::error::IngestResult;
use hostfuse_common::{CanonicalHost, Field, ScalarField, SourceKind};
use tracing::debug;

/// Delimiter separating the OS name from Qualys build details
pub const OS_BUILD_DELIMITER: &str = "Build";

const REQUIRED: RequiredPaths<'static> = RequiredPaths {
    vendor: SourceKind::Qualys,
    host_id: &["_id"],
    last_seen: &["agentInfo", "lastCheckedIn", "$date"],
    hints: &[&["address"], &["dnsHostName"], &["fqdn"]],
};

/// Normalize a Qualys host asset to the canonical shape
pub fn normalize_qualys_host(raw: &RawHostRecord) -> IngestResult<CanonicalHost> {
    let (host_id, last_seen) = REQUIRED.extract(raw)?;

    let mut host = CanonicalHost::new(host_id, last_seen)?
        .with(ScalarField::Address, field_at(raw, &["address"]))
        .with(ScalarField::Os, normalize_os(lookup(raw, &["os"]).and_then(scalar_string)))
        .with(ScalarField::Platform, field_at(raw, &["agentInfo", "platform"]))
        .with(ScalarField::CloudProvider, field_at(raw, &["cloudProvider"]))
        .with(ScalarField::Hostname, field_at(raw, &["dnsHostName"]))
        .with(ScalarField::Fqdn, field_at(raw, &["fqdn"]))
        .with(ScalarField::Location, field_at(raw, &["agentInfo", "location"]));

    host.vulnerabilities
        .extend(wrapped_list(raw, &["vuln"], "HostAssetVuln", "qid"));
    host.tags
        .extend(wrapped_list(raw, &["tags"], "TagSimple", "name"));
    host.software
        .extend(wrapped_list(raw, &["software"], "HostAssetSoftware", "name"));

    for port in wrapped_list(raw, &["openPort"], "HostAssetOpenPort", "port") {
        match port.parse::<u16>() {
            Ok(port) => {
                host.open_ports.insert(port);
            }
            Err(_) => debug!("Skipping invalid port {:?} on {}", port, host.host_id()),
        }
    }

    debug!(
        "Normalized Qualys host {} ({} evidence values)",
        host.host_id(),
        host.evidence_count()
    );

    Ok(host)
}

/// Keep the text before the build delimiter, trimmed; blank or absent is unknown
pub fn normalize_os(raw_os: Option<String>) -> Field {
    let os = raw_os.as_deref().map(|os| {
        os.split(OS_BUILD_DELIMITER)
            .next()
            .unwrap_or_default()
            .trim()
    });
    Field::from_option(os)
}
