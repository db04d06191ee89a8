//! Inventory aggregations
//!
//! Pure functions over stored hosts: OS distribution, host age relative to a cutoff,
//! and how many hosts expose each open port.

use chrono::{DateTime, Duration, Utc};
use hostfuse_common::{CanonicalHost, Error, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Hosts not seen within this many days count as old
pub const DEFAULT_CUTOFF_DAYS: i64 = 30;

/// Largest accepted cutoff (about a century)
pub const MAX_CUTOFF_DAYS: i64 = 36_500;

/// One bar of a distribution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostAge {
    pub cutoff: DateTime<Utc>,
    /// last_seen strictly before the cutoff
    pub old: usize,
    pub new: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub total_hosts: usize,
    pub os: Vec<Bucket>,
    pub age: HostAge,
    pub open_ports: Vec<Bucket>,
}

/// Hosts per OS value, most common first; unknown OS is labelled `unknown`
pub fn os_distribution(hosts: &[CanonicalHost]) -> Vec<Bucket> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for host in hosts {
        *counts.entry(host.os.value.to_string()).or_default() += 1;
    }

    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(label, count)| Bucket { label, count })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets
}

/// Split hosts into old and new around `cutoff`
pub fn host_age(hosts: &[CanonicalHost], cutoff: DateTime<Utc>) -> HostAge {
    let old = hosts.iter().filter(|h| h.last_seen < cutoff).count();
    HostAge {
        cutoff,
        old,
        new: hosts.len() - old,
    }
}

/// Hosts exposing each port, in port order
pub fn open_port_distribution(hosts: &[CanonicalHost]) -> Vec<Bucket> {
    let mut counts: BTreeMap<u16, usize> = BTreeMap::new();
    for port in hosts.iter().flat_map(|h| h.open_ports.iter()) {
        *counts.entry(*port).or_default() += 1;
    }

    counts
        .into_iter()
        .map(|(port, count)| Bucket {
            label: port.to_string(),
            count,
        })
        .collect()
}

/// Aggregate `hosts`; fails when `cutoff_days` is outside `0..=MAX_CUTOFF_DAYS`
pub fn build_report(
    hosts: &[CanonicalHost],
    now: DateTime<Utc>,
    cutoff_days: i64,
) -> Result<InventoryReport> {
    let cutoff = age_cutoff(now, cutoff_days)?;

    Ok(InventoryReport {
        generated_at: now,
        total_hosts: hosts.len(),
        os: os_distribution(hosts),
        age: host_age(hosts, cutoff),
        open_ports: open_port_distribution(hosts),
    })
}

/// `now` minus `cutoff_days`
pub fn age_cutoff(now: DateTime<Utc>, cutoff_days: i64) -> Result<DateTime<Utc>> {
    if !(0..=MAX_CUTOFF_DAYS).contains(&cutoff_days) {
        return Err(Error::InvalidInput(format!(
            "cutoff must be between 0 and {} days, got {}",
            MAX_CUTOFF_DAYS, cutoff_days
        )));
    }

    Duration::try_days(cutoff_days)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or_else(|| {
            Error::InvalidInput(format!("cutoff of {} days is out of range", cutoff_days))
        })
}
