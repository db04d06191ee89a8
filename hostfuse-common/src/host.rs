//! Canonical host model
//!
//! One `CanonicalHost` describes one physical or logical machine, independent of which
//! inventory source reported it. Scalar descriptive fields never disappear from the shape:
//! a value the source did not provide is carried as [`Field::Unknown`].
//!
//! Every scalar remembers the instant it was observed. Normalization stamps all scalars
//! with the record's `last_seen`; merging keeps the stamp of whichever value survives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::{Error, Result};

/// Inventory source a raw record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Vulnerability scanner host assets
    Qualys,
    /// Endpoint detection device records
    CrowdStrike,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Qualys, SourceKind::CrowdStrike];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Qualys => "qualys",
            SourceKind::CrowdStrike => "crowdstrike",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qualys" => Ok(SourceKind::Qualys),
            "crowdstrike" => Ok(SourceKind::CrowdStrike),
            other => Err(Error::InvalidInput(format!("Unknown source: {}", other))),
        }
    }
}

/// Scalar value that is either known or explicitly unknown
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    // Declaration order matters: Unknown sorts below every known value.
    Unknown,
    Known(String),
}

impl Field {
    /// Build from an optional raw string; blank strings are unknown
    pub fn from_option(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Field::Known(v.to_string()),
            _ => Field::Unknown,
        }
    }

    pub fn known(value: impl Into<String>) -> Self {
        Self::from_option(Some(&value.into()))
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Field::Known(_))
    }

    pub fn as_known(&self) -> Option<&str> {
        match self {
            Field::Known(v) => Some(v),
            Field::Unknown => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Known(v) => f.write_str(v),
            Field::Unknown => f.write_str("unknown"),
        }
    }
}

/// Scalar value together with the instant it was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scalar {
    pub value: Field,
    pub observed_at: DateTime<Utc>,
}

impl Scalar {
    pub fn new(value: Field, observed_at: DateTime<Utc>) -> Self {
        Self { value, observed_at }
    }

    pub fn unknown(observed_at: DateTime<Utc>) -> Self {
        Self::new(Field::Unknown, observed_at)
    }

    /// Ranking used when two observations of the same field compete
    ///
    /// Known beats unknown, then later observation wins, then the greater value.
    /// The ordering is total, so picking the maximum is order independent.
    pub fn rank(&self) -> (bool, DateTime<Utc>, &Field) {
        (self.value.is_known(), self.observed_at, &self.value)
    }
}

/// Scalar descriptive fields of a canonical host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    Address,
    ExternalIp,
    Os,
    Platform,
    CloudProvider,
    Hostname,
    Fqdn,
    Location,
}

impl ScalarField {
    pub const ALL: [ScalarField; 8] = [
        ScalarField::Address,
        ScalarField::ExternalIp,
        ScalarField::Os,
        ScalarField::Platform,
        ScalarField::CloudProvider,
        ScalarField::Hostname,
        ScalarField::Fqdn,
        ScalarField::Location,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScalarField::Address => "address",
            ScalarField::ExternalIp => "external_ip",
            ScalarField::Os => "os",
            ScalarField::Platform => "platform",
            ScalarField::CloudProvider => "cloud_provider",
            ScalarField::Hostname => "hostname",
            ScalarField::Fqdn => "fqdn",
            ScalarField::Location => "location",
        }
    }
}

/// Unified, source-agnostic host record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalHost {
    #[serde(deserialize_with = "non_blank_host_id")]
    host_id: String,
    pub last_seen: DateTime<Utc>,

    pub address: Scalar,
    pub external_ip: Scalar,
    pub os: Scalar,
    pub platform: Scalar,
    pub cloud_provider: Scalar,
    pub hostname: Scalar,
    pub fqdn: Scalar,
    pub location: Scalar,

    /// Evidence fields, accumulated by union
    pub tags: BTreeSet<String>,
    pub vulnerabilities: BTreeSet<String>,
    pub open_ports: BTreeSet<u16>,
    pub software: BTreeSet<String>,
    pub policies: BTreeSet<String>,
}

impl CanonicalHost {
    /// Create a host with every scalar unknown and every evidence set empty
    ///
    /// Fails with `InvalidInput` if `host_id` is blank.
    pub fn new(host_id: impl Into<String>, last_seen: DateTime<Utc>) -> Result<Self> {
        let host_id = host_id.into();
        if host_id.trim().is_empty() {
            return Err(Error::InvalidInput("host_id must not be empty".to_string()));
        }

        let unknown = Scalar::unknown(last_seen);
        Ok(Self {
            host_id,
            last_seen,
            address: unknown.clone(),
            external_ip: unknown.clone(),
            os: unknown.clone(),
            platform: unknown.clone(),
            cloud_provider: unknown.clone(),
            hostname: unknown.clone(),
            fqdn: unknown.clone(),
            location: unknown,
            tags: BTreeSet::new(),
            vulnerabilities: BTreeSet::new(),
            open_ports: BTreeSet::new(),
            software: BTreeSet::new(),
            policies: BTreeSet::new(),
        })
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn scalar(&self, field: ScalarField) -> &Scalar {
        match field {
            ScalarField::Address => &self.address,
            ScalarField::ExternalIp => &self.external_ip,
            ScalarField::Os => &self.os,
            ScalarField::Platform => &self.platform,
            ScalarField::CloudProvider => &self.cloud_provider,
            ScalarField::Hostname => &self.hostname,
            ScalarField::Fqdn => &self.fqdn,
            ScalarField::Location => &self.location,
        }
    }

    pub fn scalar_mut(&mut self, field: ScalarField) -> &mut Scalar {
        match field {
            ScalarField::Address => &mut self.address,
            ScalarField::ExternalIp => &mut self.external_ip,
            ScalarField::Os => &mut self.os,
            ScalarField::Platform => &mut self.platform,
            ScalarField::CloudProvider => &mut self.cloud_provider,
            ScalarField::Hostname => &mut self.hostname,
            ScalarField::Fqdn => &mut self.fqdn,
            ScalarField::Location => &mut self.location,
        }
    }

    /// Set a scalar as observed at this record's `last_seen`
    pub fn set(&mut self, field: ScalarField, value: Field) {
        let observed_at = self.last_seen;
        *self.scalar_mut(field) = Scalar::new(value, observed_at);
    }

    /// Builder form of [`CanonicalHost::set`]
    pub fn with(mut self, field: ScalarField, value: Field) -> Self {
        self.set(field, value);
        self
    }

    /// Total number of evidence values across all set fields
    pub fn evidence_count(&self) -> usize {
        self.tags.len()
            + self.vulnerabilities.len()
            + self.open_ports.len()
            + self.software.len()
            + self.policies.len()
    }
}

/// Stored documents go through the same host_id check as `CanonicalHost::new`
fn non_blank_host_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let host_id = String::deserialize(deserializer)?;
    if host_id.trim().is_empty() {
        return Err(serde::de::Error::custom("host_id must not be empty"));
    }
    Ok(host_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_new_rejects_blank_id() {
        assert!(CanonicalHost::new("", ts(1)).is_err());
        assert!(CanonicalHost::new("   ", ts(1)).is_err());
    }

    #[test]
    fn test_deserialize_rejects_blank_id() {
        let mut doc = serde_json::to_value(CanonicalHost::new("h1", ts(1)).unwrap()).unwrap();
        assert!(serde_json::from_value::<CanonicalHost>(doc.clone()).is_ok());

        for blank in ["", "  "] {
            doc["host_id"] = serde_json::Value::from(blank);
            let err = serde_json::from_value::<CanonicalHost>(doc.clone()).unwrap_err();
            assert!(err.to_string().contains("host_id must not be empty"));
        }
    }

    #[test]
    fn test_new_host_is_all_unknown() {
        let host = CanonicalHost::new("h1", ts(1)).unwrap();
        for field in ScalarField::ALL {
            assert_eq!(host.scalar(field).value, Field::Unknown, "{}", field.name());
            assert_eq!(host.scalar(field).observed_at, ts(1));
        }
        assert_eq!(host.evidence_count(), 0);
    }

    #[test]
    fn test_field_from_option_blank_is_unknown() {
        assert_eq!(Field::from_option(None), Field::Unknown);
        assert_eq!(Field::from_option(Some("  ")), Field::Unknown);
        assert_eq!(Field::from_option(Some(" Linux ")), Field::known("Linux"));
        assert_eq!(Field::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_rank_prefers_known_over_newer_unknown() {
        let old_known = Scalar::new(Field::known("Linux"), ts(1));
        let new_unknown = Scalar::unknown(ts(2));
        assert!(old_known.rank() > new_unknown.rank());
    }

    #[test]
    fn test_source_kind_parse() {
        assert_eq!("Qualys".parse::<SourceKind>().unwrap(), SourceKind::Qualys);
        assert_eq!("crowdstrike".parse::<SourceKind>().unwrap(), SourceKind::CrowdStrike);
        assert!("nessus".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_serde_keeps_unknown_marker() {
        let host = CanonicalHost::new("h1", ts(1))
            .unwrap()
            .with(ScalarField::Os, Field::known("Linux"));
        let json = serde_json::to_value(&host).unwrap();
        assert_eq!(json["address"]["value"], "unknown");
        assert_eq!(json["os"]["value"]["known"], "Linux");

        let back: CanonicalHost = serde_json::from_value(json).unwrap();
        assert_eq!(back, host);
    }
}
