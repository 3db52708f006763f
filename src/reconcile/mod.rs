//! The matcher/trimmer: reconciles "what exists" against "what is wanted."
//!
//! One nested scan matches each replica in a [`ReplicaSet`] to a member of a
//! [`GroupSet`] by resource-name identity, then applies the caller-selected
//! [`ReconcileMode`] to both sides. Replicate, move, and trim all funnel
//! their existence checks through this single primitive.

use crate::replica::{ReplicaRecord, ReplicaSet};
use crate::resources::GroupSet;

/// What happens to a target entry once a replica matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAction {
    /// Drop the member; its requirement is satisfied.
    Remove,
    /// Move the member to the tail so later replicas can match it again.
    Requeue,
}

/// Independent behaviors combined into one reconciliation mode.
///
/// Only the four named constants are exercised; other combinations are legal
/// but unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileMode {
    pub matched_target: TargetAction,
    /// Move a matched replica out of its source set (into the sink).
    pub extract_matched: bool,
    /// Move an unmatched replica out of its source set (into the sink).
    pub extract_unmatched: bool,
}

/// Strike satisfied members off the target list; replicas stay put.
pub const REMOVE_MATCHED_TARGET: ReconcileMode = ReconcileMode {
    matched_target: TargetAction::Remove,
    extract_matched: false,
    extract_unmatched: false,
};

/// As [`REMOVE_MATCHED_TARGET`], additionally pulling out replicas on
/// resources the target list never wanted. Used by replicate-to-all.
pub const REMOVE_MATCHED_TARGET_EXTRACT_UNMATCHED: ReconcileMode = ReconcileMode {
    matched_target: TargetAction::Remove,
    extract_matched: false,
    extract_unmatched: true,
};

/// Matched members cycle to the tail instead of dropping out. Used by moves
/// when multiple copies per resource are permitted.
pub const REQUEUE_MATCHED_TARGET: ReconcileMode = ReconcileMode {
    matched_target: TargetAction::Requeue,
    extract_matched: false,
    extract_unmatched: false,
};

/// Strike satisfied members and pull the matching replicas out with them.
/// Used by moves when a copy may not land next to an existing one.
pub const REMOVE_MATCHED_TARGET_EXTRACT_MATCHED: ReconcileMode = ReconcileMode {
    matched_target: TargetAction::Remove,
    extract_matched: true,
    extract_unmatched: false,
};

fn deposit(sink: &mut Option<&mut ReplicaSet>, record: ReplicaRecord) {
    if let Some(sink) = sink.as_mut() {
        sink.push_back(record);
    }
}

/// Reconcile `replicas` against `targets` under `mode`.
///
/// Every replica and every target is visited exactly once. Counts are
/// conserved: a replica either stays in `replicas` or moves to `sink` (or is
/// discarded when no sink is supplied, which is an explicit caller choice).
///
/// When extract-matched is in effect and `targets` is a named group, an
/// unmatched replica whose own group name equals the target group's name is
/// extracted as well: it sits in the group but on a member no longer wanted.
pub fn reconcile(
    replicas: &mut ReplicaSet,
    targets: &mut GroupSet,
    mode: ReconcileMode,
    mut sink: Option<&mut ReplicaSet>,
) {
    let target_group = targets.group_name().map(str::to_string);
    let mut kept = ReplicaSet::new();

    while let Some(record) = replicas.pop_front() {
        match targets.position_of(&record.resource_name) {
            Some(index) => {
                match mode.matched_target {
                    TargetAction::Remove => {
                        targets.remove(index);
                    }
                    TargetAction::Requeue => targets.requeue(index),
                }
                if mode.extract_matched {
                    deposit(&mut sink, record);
                } else {
                    kept.push_back(record);
                }
            }
            None => {
                let stranded_in_group = mode.extract_matched
                    && target_group
                        .as_deref()
                        .is_some_and(|g| record.resource_group == g);
                if mode.extract_unmatched || stranded_in_group {
                    deposit(&mut sink, record);
                } else {
                    kept.push_back(record);
                }
            }
        }
    }

    *replicas = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::test_support::create_test_replica;
    use crate::resources::{GroupEntry, ResourceClass, ResourceRecord, ResourceStatus};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn replicas(names: &[&str]) -> ReplicaSet {
        names
            .iter()
            .map(|n| create_test_replica(n, true, ResourceClass::Cache, ResourceStatus::Up))
            .collect()
    }

    fn group(name: &str, members: &[&str]) -> GroupSet {
        let mut set = GroupSet::new();
        for member in members {
            set.push(GroupEntry {
                group_name: name.to_string(),
                resource: Arc::new(ResourceRecord::create_test(
                    member,
                    ResourceClass::Cache,
                    ResourceStatus::Up,
                )),
            });
        }
        set
    }

    #[test]
    fn remove_matched_strikes_satisfied_members() {
        let mut existing = replicas(&["rescA"]);
        let mut targets = group("groupG", &["rescA", "rescB"]);

        reconcile(&mut existing, &mut targets, REMOVE_MATCHED_TARGET, None);

        assert_eq!(existing.len(), 1);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets.first().unwrap().resource.name, "rescB");
    }

    #[test]
    fn fully_satisfied_group_empties_the_targets() {
        let mut existing = replicas(&["rescA", "rescB"]);
        let mut targets = group("groupG", &["rescA", "rescB"]);

        reconcile(&mut existing, &mut targets, REMOVE_MATCHED_TARGET, None);

        assert!(targets.is_empty());
        assert_eq!(existing.len(), 2);
    }

    #[test]
    fn extract_unmatched_pulls_strays_into_the_sink() {
        let mut existing = replicas(&["rescA", "strayResc"]);
        let mut targets = group("groupG", &["rescA", "rescB"]);
        let mut sink = ReplicaSet::new();

        reconcile(
            &mut existing,
            &mut targets,
            REMOVE_MATCHED_TARGET_EXTRACT_UNMATCHED,
            Some(&mut sink),
        );

        assert_eq!(existing.len(), 1);
        assert_eq!(existing.first().unwrap().resource_name, "rescA");
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.first().unwrap().resource_name, "strayResc");
    }

    #[test]
    fn extract_matched_pulls_the_match_and_group_strandees() {
        let mut existing = replicas(&["rescA", "orphanResc"]);
        // orphanResc was written as a member of groupG but the group no
        // longer lists it.
        let mut tagged = ReplicaSet::new();
        while let Some(mut record) = existing.pop_front() {
            record.resource_group = "groupG".to_string();
            tagged.push_back(record);
        }
        let mut targets = group("groupG", &["rescA", "rescB"]);
        let mut sink = ReplicaSet::new();

        reconcile(
            &mut tagged,
            &mut targets,
            REMOVE_MATCHED_TARGET_EXTRACT_MATCHED,
            Some(&mut sink),
        );

        assert!(tagged.is_empty());
        assert_eq!(sink.len(), 2);
        assert_eq!(targets.len(), 1);
    }

    fn arb_mode() -> impl Strategy<Value = ReconcileMode> {
        prop_oneof![
            Just(REMOVE_MATCHED_TARGET),
            Just(REMOVE_MATCHED_TARGET_EXTRACT_UNMATCHED),
            Just(REQUEUE_MATCHED_TARGET),
            Just(REMOVE_MATCHED_TARGET_EXTRACT_MATCHED),
        ]
    }

    proptest! {
        /// Counts are conserved on both sides for every documented mode:
        /// replicas end up in the source set or the sink, and targets are
        /// only ever removed when a replica matched them.
        #[test]
        fn counts_are_conserved(
            replica_names in prop::collection::vec(0u8..6, 0..16),
            member_names in prop::collection::vec(0u8..6, 0..6),
            mode in arb_mode(),
        ) {
            let names: Vec<String> =
                replica_names.iter().map(|i| format!("resc{}", i)).collect();
            let mut existing: ReplicaSet = names
                .iter()
                .map(|n| create_test_replica(n, true, ResourceClass::Cache, ResourceStatus::Up))
                .collect();
            let members: Vec<String> =
                member_names.iter().map(|i| format!("resc{}", i)).collect();
            let member_refs: Vec<&str> = members.iter().map(String::as_str).collect();
            let mut targets = group("groupG", &member_refs);

            let replica_count = existing.len();
            let target_count = targets.len();
            let mut sink = ReplicaSet::new();

            reconcile(&mut existing, &mut targets, mode, Some(&mut sink));

            prop_assert_eq!(existing.len() + sink.len(), replica_count);
            prop_assert!(targets.len() <= target_count);
            let removed = target_count - targets.len();
            prop_assert!(removed <= replica_count);
        }
    }
}
