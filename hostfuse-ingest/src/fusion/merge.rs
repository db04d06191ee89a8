// Merge Engine - Latest-Wins Scalars, Union Evidence
//
// Two observations of the same host become one new record:
// - last_seen is the later of the two
// - each scalar keeps the highest-ranked observation (see `Scalar::rank`): latest
//   known value wins, an unknown never displaces a known value
// - evidence sets are unioned
//
// Ranking per scalar (not per record) keeps the operation associative and
// commutative, so groups can be folded in any order.

use crate::error::{IngestError, IngestResult};
use hostfuse_common::{CanonicalHost, ScalarField};
use std::collections::BTreeSet;
use tracing::debug;

/// Merge two records describing the same host
///
/// Fails with `IdentifierMismatch` when the host ids differ. Inputs are not modified.
pub fn merge(a: &CanonicalHost, b: &CanonicalHost) -> IngestResult<CanonicalHost> {
    if a.host_id() != b.host_id() {
        return Err(IngestError::IdentifierMismatch {
            left: a.host_id().to_string(),
            right: b.host_id().to_string(),
        });
    }
    Ok(fuse(a, b))
}

/// Merge without the id check; callers guarantee `a.host_id() == b.host_id()`
pub(crate) fn fuse(a: &CanonicalHost, b: &CanonicalHost) -> CanonicalHost {
    debug_assert_eq!(a.host_id(), b.host_id());

    let mut merged = a.clone();
    merged.last_seen = a.last_seen.max(b.last_seen);

    for field in ScalarField::ALL {
        let (left, right) = (a.scalar(field), b.scalar(field));
        let winner = if right.rank() > left.rank() { right } else { left };

        if let (Some(l), Some(r)) = (left.value.as_known(), right.value.as_known()) {
            if l != r {
                debug!(
                    "Host {} {} differs ({:?} vs {:?}), keeping {:?}",
                    a.host_id(),
                    field.name(),
                    l,
                    r,
                    winner.value.to_string()
                );
            }
        }

        *merged.scalar_mut(field) = winner.clone();
    }

    merged.tags = union(&a.tags, &b.tags);
    merged.vulnerabilities = union(&a.vulnerabilities, &b.vulnerabilities);
    merged.open_ports = union(&a.open_ports, &b.open_ports);
    merged.software = union(&a.software, &b.software);
    merged.policies = union(&a.policies, &b.policies);

    merged
}

fn union<T: Ord + Clone>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> BTreeSet<T> {
    a.union(b).cloned().collect()
}
