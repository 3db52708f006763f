//! Six-bucket replica partitioning.
//!
//! Classification is the first stage of every resolution policy: it splits a
//! replica set into current/stale × cache-like/archive-like × up/down
//! buckets so selectors can reason about "best available copy" ordering.
//! Pure partitioning: no I/O, every input record lands in exactly one output
//! bucket.

use crate::replica::{ReplicaRecord, ReplicaSet};
use crate::resources::ResourceClass;

/// The six disjoint outputs of [`classify`].
///
/// Within every bucket, records on the local host come before remote ones;
/// bundle-class records sit after archive-class records in the archive
/// buckets.
#[derive(Debug, Default)]
pub struct ClassifiedReplicas {
    pub current_cache: ReplicaSet,
    pub current_archive: ReplicaSet,
    pub old_cache: ReplicaSet,
    pub old_archive: ReplicaSet,
    pub down_current: ReplicaSet,
    pub down_old: ReplicaSet,
}

impl ClassifiedReplicas {
    pub fn total(&self) -> usize {
        self.current_cache.len()
            + self.current_archive.len()
            + self.old_cache.len()
            + self.old_archive.len()
            + self.down_current.len()
            + self.down_old.len()
    }

    /// Collapse the current buckets into one ordered set: cache first,
    /// archive second, then (optionally) current replicas on down resources.
    pub fn merge_current(&mut self, include_down: bool) -> ReplicaSet {
        let mut merged = ReplicaSet::new();
        merged.append(&mut self.current_cache);
        merged.append(&mut self.current_archive);
        if include_down {
            merged.append(&mut self.down_current);
        }
        merged
    }

    /// Collapse the stale buckets into one ordered set: cache first, archive
    /// second, then (optionally) stale replicas on down resources.
    pub fn merge_stale(&mut self, include_down: bool) -> ReplicaSet {
        let mut merged = ReplicaSet::new();
        merged.append(&mut self.old_cache);
        merged.append(&mut self.old_archive);
        if include_down {
            merged.append(&mut self.down_old);
        }
        merged
    }
}

/// Route one record into a bucket, local records first.
fn place(bucket: &mut ReplicaSet, record: ReplicaRecord, local_host: &str) {
    if record.is_local_to(local_host) {
        bucket.push_front(record);
    } else {
        bucket.push_back(record);
    }
}

/// Partition `replicas` into the six buckets.
///
/// Rules, applied per record in order:
///
/// 1. a record whose resource is down goes to `down_current`/`down_old` by
///    its current-flag;
/// 2. a record whose hierarchy equals `target_hierarchy` exactly goes to
///    `current_cache` regardless of class or flag;
/// 3. everything else routes by current-flag × class, with archive and
///    bundle classes sharing the archive bucket (bundles after archives) and
///    all other classes treated as cache.
pub fn classify(
    replicas: ReplicaSet,
    target_hierarchy: Option<&str>,
    local_host: &str,
) -> ClassifiedReplicas {
    let mut out = ClassifiedReplicas::default();
    // Bundle records wait in side queues and join the archive buckets after
    // the scan so they always sort behind archive-class records.
    let mut bundle_current = ReplicaSet::new();
    let mut bundle_old = ReplicaSet::new();

    for record in replicas {
        if !record.resource_is_up() {
            let bucket = if record.is_current {
                &mut out.down_current
            } else {
                &mut out.down_old
            };
            place(bucket, record, local_host);
            continue;
        }

        if let Some(target) = target_hierarchy {
            if record.hierarchy == target {
                place(&mut out.current_cache, record, local_host);
                continue;
            }
        }

        let bucket = match (record.is_current, record.class()) {
            (true, ResourceClass::Bundle) => &mut bundle_current,
            (false, ResourceClass::Bundle) => &mut bundle_old,
            (true, ResourceClass::Archive) => &mut out.current_archive,
            (false, ResourceClass::Archive) => &mut out.old_archive,
            (true, _) => &mut out.current_cache,
            (false, _) => &mut out.old_cache,
        };
        place(bucket, record, local_host);
    }

    out.current_archive.append(&mut bundle_current);
    out.old_archive.append(&mut bundle_old);
    out
}
