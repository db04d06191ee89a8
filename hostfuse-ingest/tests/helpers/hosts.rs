//! Canonical host builders

use chrono::{DateTime, NaiveDate, Utc};
use hostfuse_common::CanonicalHost;

/// Midnight UTC on the given date
pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
        .unwrap()
}

pub fn host(id: &str, last_seen: DateTime<Utc>) -> CanonicalHost {
    CanonicalHost::new(id, last_seen).unwrap()
}

pub fn host_with_tags(id: &str, last_seen: DateTime<Utc>, tags: &[&str]) -> CanonicalHost {
    let mut h = host(id, last_seen);
    h.tags.extend(tags.iter().map(|t| t.to_string()));
    h
}
