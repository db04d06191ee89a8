// Deduplication Engine
//
// Partitions a batch by host_id and folds each partition through the merge engine.
// Singletons pass through untouched. Output is ordered by host_id.

use super::merge::fuse;
use hostfuse_common::CanonicalHost;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::debug;

/// Collapse a batch to one record per distinct host_id
pub fn deduplicate(hosts: Vec<CanonicalHost>) -> Vec<CanonicalHost> {
    let received = hosts.len();
    let mut partitions: BTreeMap<String, CanonicalHost> = BTreeMap::new();

    for host in hosts {
        match partitions.entry(host.host_id().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(host);
            }
            Entry::Occupied(mut slot) => {
                let merged = fuse(slot.get(), &host);
                slot.insert(merged);
            }
        }
    }

    debug!(
        "Deduplicated {} records into {} hosts",
        received,
        partitions.len()
    );

    partitions.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_input_gives_empty_output() {
        assert!(deduplicate(Vec::new()).is_empty());
    }

    #[test]
    fn test_singletons_pass_through_unchanged() {
        let a = CanonicalHost::new("a", Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).unwrap();
        let b = CanonicalHost::new("b", Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()).unwrap();

        let out = deduplicate(vec![b.clone(), a.clone()]);
        assert_eq!(out, vec![a, b]);
    }
}
