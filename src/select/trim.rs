use crate::classify::classify;
use crate::conditions::ConditionSet;
use crate::replica::ReplicaSet;

use super::matching::split_by_conditions;
use super::SelectError;

/// Compute the replicas a trim request may delete.
///
/// The minimum-copy floor (default 2, overridden by the copies condition)
/// counts current replicas first, then stale ones. Stale candidates are
/// trimmed before current ones, and within a bucket the tail goes before the
/// head. Stale replicas on down resources are never offered for deletion.
///
/// A condition that matches nothing yields an empty result, not an error:
/// "nothing to trim" is a successful no-op.
pub fn select_for_trim(
    replicas: ReplicaSet,
    conditions: &ConditionSet,
    local_host: &str,
) -> Result<ReplicaSet, SelectError> {
    let mut buckets = classify(replicas, None, local_host);
    let mut current = buckets.merge_current(true);
    let mut stale = buckets.merge_stale(false);

    // An object with only stale copies: the floor protects those instead.
    if current.is_empty() {
        std::mem::swap(&mut current, &mut stale);
    }

    let (mut matched_current, mut matched_stale) =
        match split_by_conditions(&mut current, &mut stale, conditions) {
            Ok(Some(split)) => (split.matched_current, split.matched_stale),
            // No restriction: every replica is a candidate.
            Ok(None) => (std::mem::take(&mut current), std::mem::take(&mut stale)),
            Err(SelectError::NoSourceCopy) => return Ok(ReplicaSet::new()),
            Err(err) => return Err(err),
        };

    let floor = conditions.copy_floor();
    let current_total = current.len() + matched_current.len();
    let mut trim = ReplicaSet::new();

    if current_total >= floor {
        // Current copies alone satisfy the floor: every stale candidate
        // goes, plus the current surplus from the tail.
        let surplus = current_total - floor;
        trim.append(&mut matched_stale);
        let n = surplus.min(matched_current.len());
        let mut tail = matched_current.split_off(matched_current.len() - n);
        trim.append(&mut tail);
    } else {
        // Below the floor on current copies: stale ones make up the
        // shortfall, unrestricted before matched, and whatever the floor
        // does not claim is trimmed from the matched tail.
        let deficit = floor - current_total;
        let available = stale.len() + matched_stale.len();
        let n = available
            .saturating_sub(deficit)
            .min(matched_stale.len());
        if n > 0 {
            let mut tail = matched_stale.split_off(matched_stale.len() - n);
            trim.append(&mut tail);
        }
    }
    Ok(trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionKey;
    use crate::replica::test_support::create_test_replica;
    use crate::resources::{ResourceClass, ResourceStatus};

    const HOST: &str = "nowhere.example.org";

    fn replica(name: &str, current: bool) -> crate::replica::ReplicaRecord {
        create_test_replica(name, current, ResourceClass::Cache, ResourceStatus::Up)
    }

    fn names(set: &ReplicaSet) -> Vec<String> {
        set.iter().map(|r| r.resource_name.clone()).collect()
    }

    #[test]
    fn default_floor_keeps_two_current_copies() {
        let mut set = ReplicaSet::new();
        for name in ["a", "b", "c", "d"] {
            set.push_back(replica(name, true));
        }
        let trim = select_for_trim(set, &ConditionSet::new(), HOST).unwrap();
        // Tail first: the two newest-queued copies go.
        assert_eq!(names(&trim), ["c", "d"]);
    }

    #[test]
    fn floor_at_or_above_count_trims_nothing() {
        let mut set = ReplicaSet::new();
        set.push_back(replica("a", true));
        set.push_back(replica("b", true));
        let conditions = ConditionSet::new().with(ConditionKey::Copies, "5");
        let trim = select_for_trim(set, &conditions, HOST).unwrap();
        assert!(trim.is_empty());
    }

    #[test]
    fn zero_floor_falls_back_to_the_default() {
        let mut set = ReplicaSet::new();
        for name in ["a", "b", "c"] {
            set.push_back(replica(name, true));
        }
        let conditions = ConditionSet::new().with(ConditionKey::Copies, "0");
        let trim = select_for_trim(set, &conditions, HOST).unwrap();
        assert_eq!(trim.len(), 1);
    }

    #[test]
    fn stale_copies_are_trimmed_before_current_ones() {
        let mut set = ReplicaSet::new();
        set.push_back(replica("a", true));
        set.push_back(replica("b", true));
        set.push_back(replica("oldA", false));
        set.push_back(replica("oldB", false));
        let trim = select_for_trim(set, &ConditionSet::new(), HOST).unwrap();
        assert_eq!(names(&trim), ["oldA", "oldB"]);
    }

    #[test]
    fn deficit_keeps_enough_stale_copies() {
        let mut set = ReplicaSet::new();
        set.push_back(replica("a", true));
        for name in ["oldA", "oldB", "oldC"] {
            set.push_back(replica(name, false));
        }
        // One current copy, floor 2: keep one stale, trim the other two
        // from the tail.
        let trim = select_for_trim(set, &ConditionSet::new(), HOST).unwrap();
        assert_eq!(names(&trim), ["oldB", "oldC"]);
    }

    #[test]
    fn unrestricted_stale_copies_cover_the_deficit() {
        let mut set = ReplicaSet::new();
        set.push_back(replica("a", true));
        set.push_back(replica("target", false));
        set.push_back(replica("target", false));
        for name in ["oldA", "oldB", "oldC"] {
            set.push_back(replica(name, false));
        }
        // One current copy leaves a deficit of one, but the three stale
        // copies outside the condition cover it: both matched copies go.
        let conditions = ConditionSet::new().with(ConditionKey::ResourceName, "target");
        let trim = select_for_trim(set, &conditions, HOST).unwrap();
        assert_eq!(names(&trim), ["target", "target"]);
    }

    #[test]
    fn down_stale_replicas_are_untouchable() {
        let mut set = ReplicaSet::new();
        set.push_back(replica("a", true));
        set.push_back(replica("b", true));
        set.push_back(replica("c", true));
        set.push_back(create_test_replica(
            "deadOld",
            false,
            ResourceClass::Cache,
            ResourceStatus::Down,
        ));
        let trim = select_for_trim(set, &ConditionSet::new(), HOST).unwrap();
        assert_eq!(names(&trim), ["c"]);
    }

    #[test]
    fn stale_only_object_is_protected_by_the_floor() {
        let mut set = ReplicaSet::new();
        for name in ["oldA", "oldB", "oldC"] {
            set.push_back(replica(name, false));
        }
        let trim = select_for_trim(set, &ConditionSet::new(), HOST).unwrap();
        assert_eq!(trim.len(), 1);
        assert_eq!(trim.first().unwrap().resource_name, "oldC");
    }

    #[test]
    fn condition_matching_nothing_is_a_no_op() {
        let mut set = ReplicaSet::new();
        for name in ["a", "b", "c"] {
            set.push_back(replica(name, true));
        }
        let conditions = ConditionSet::new().with(ConditionKey::ResourceName, "ghostResc");
        let trim = select_for_trim(set, &conditions, HOST).unwrap();
        assert!(trim.is_empty());
    }

    #[test]
    fn resource_condition_restricts_the_candidates() {
        let mut set = ReplicaSet::new();
        for name in ["a", "b", "c", "target"] {
            set.push_back(replica(name, true));
        }
        let conditions = ConditionSet::new().with(ConditionKey::ResourceName, "target");
        let trim = select_for_trim(set, &conditions, HOST).unwrap();
        // Three unrestricted copies already satisfy the floor, so the
        // matched one is surplus.
        assert_eq!(names(&trim), ["target"]);
    }

    #[test]
    fn same_input_selects_the_same_replicas() {
        let mut set = ReplicaSet::new();
        for (i, name) in ["a", "b", "c", "d", "oldA"].iter().enumerate() {
            let mut r = replica(name, *name != "oldA");
            r.data_id = i as i64;
            set.push_back(r);
        }
        let first = select_for_trim(set.clone(), &ConditionSet::new(), HOST).unwrap();
        let second = select_for_trim(set, &ConditionSet::new(), HOST).unwrap();
        let ids = |s: &ReplicaSet| s.iter().map(|r| r.data_id).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }
}
