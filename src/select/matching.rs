//! Condition-driven partitioning shared by the selectors.

use crate::conditions::{ConditionKey, ConditionSet};
use crate::replica::ReplicaSet;

use super::SelectError;

/// Which condition actually drove a match. Conditions are consulted in a
/// fixed priority order: replica number, then the exact hierarchy pair,
/// then resource name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MatchKind {
    ReplicaNumber,
    Hierarchy,
    Resource,
}

/// Replicas pulled out of the current and stale sets by a condition.
#[derive(Debug)]
pub(super) struct ConditionSplit {
    pub kind: MatchKind,
    pub matched_current: ReplicaSet,
    pub matched_stale: ReplicaSet,
}

/// Extract the replicas matching the request's conditions from both sets.
///
/// `Ok(None)` when no restricting condition was given; the sets are left
/// untouched. A present condition that matches nothing in either set is
/// [`SelectError::NoSourceCopy`].
pub(super) fn split_by_conditions(
    current: &mut ReplicaSet,
    stale: &mut ReplicaSet,
    conditions: &ConditionSet,
) -> Result<Option<ConditionSplit>, SelectError> {
    let hierarchy_pair = conditions.contains(ConditionKey::Hierarchy)
        && conditions.contains(ConditionKey::DestinationHierarchy);

    let split = if let Some(number) = conditions.replica_number() {
        ConditionSplit {
            kind: MatchKind::ReplicaNumber,
            matched_current: current.extract_where(|r| r.replica_number == number),
            matched_stale: stale.extract_where(|r| r.replica_number == number),
        }
    } else if hierarchy_pair {
        let target = conditions
            .get(ConditionKey::Hierarchy)
            .unwrap_or_default()
            .to_string();
        ConditionSplit {
            kind: MatchKind::Hierarchy,
            matched_current: current.extract_where(|r| r.hierarchy == target),
            matched_stale: stale.extract_where(|r| r.hierarchy == target),
        }
    } else if let Some(name) = conditions
        .get(ConditionKey::ResourceName)
        .filter(|v| !v.is_empty())
    {
        let name = name.to_string();
        ConditionSplit {
            kind: MatchKind::Resource,
            matched_current: current.extract_where(|r| r.on_resource_or_group(&name)),
            matched_stale: stale.extract_where(|r| r.on_resource_or_group(&name)),
        }
    } else {
        return Ok(None);
    };

    if split.matched_current.is_empty() && split.matched_stale.is_empty() {
        return Err(SelectError::NoSourceCopy);
    }
    Ok(Some(split))
}

/// Counts reported by [`promote_condition_matches`].
#[derive(Debug, Clone, Copy)]
pub(super) struct PromotedMatch {
    pub current_matches: usize,
    pub stale_matches: usize,
}

/// Partition both sets by the request's conditions and promote the matches
/// to the front of their sets.
///
/// A hierarchy match names an exact placement, so replicas there count as
/// current even when flagged stale; they are promoted into the current set
/// and reported under `current_matches`.
pub(super) fn promote_condition_matches(
    current: &mut ReplicaSet,
    stale: &mut ReplicaSet,
    conditions: &ConditionSet,
) -> Result<Option<PromotedMatch>, SelectError> {
    let Some(mut split) = split_by_conditions(current, stale, conditions)? else {
        return Ok(None);
    };

    let counts = match split.kind {
        MatchKind::Hierarchy => {
            let counts = PromotedMatch {
                current_matches: split.matched_current.len() + split.matched_stale.len(),
                stale_matches: 0,
            };
            let mut head = split.matched_current;
            head.append(&mut split.matched_stale);
            head.append(current);
            *current = head;
            counts
        }
        _ => {
            let counts = PromotedMatch {
                current_matches: split.matched_current.len(),
                stale_matches: split.matched_stale.len(),
            };
            let mut head = split.matched_current;
            head.append(current);
            *current = head;
            let mut old_head = split.matched_stale;
            old_head.append(stale);
            *stale = old_head;
            counts
        }
    };
    Ok(Some(counts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::test_support::create_test_replica;
    use crate::resources::{ResourceClass, ResourceStatus};

    fn set(names: &[(&str, i32)], current: bool) -> ReplicaSet {
        names
            .iter()
            .map(|(name, number)| {
                let mut r = create_test_replica(
                    name,
                    current,
                    ResourceClass::Cache,
                    ResourceStatus::Up,
                );
                r.replica_number = *number;
                r
            })
            .collect()
    }

    #[test]
    fn no_condition_leaves_sets_untouched() {
        let mut current = set(&[("rescA", 0)], true);
        let mut stale = set(&[("rescB", 1)], false);
        let result =
            promote_condition_matches(&mut current, &mut stale, &ConditionSet::new()).unwrap();
        assert!(result.is_none());
        assert_eq!(current.len(), 1);
        assert_eq!(stale.len(), 1);
    }

    #[test]
    fn replica_number_outranks_resource_name() {
        let mut current = set(&[("rescA", 0), ("rescB", 1)], true);
        let mut stale = ReplicaSet::new();
        let conditions = ConditionSet::new()
            .with(ConditionKey::ReplicaNumber, "1")
            .with(ConditionKey::ResourceName, "rescA");

        let counts = promote_condition_matches(&mut current, &mut stale, &conditions)
            .unwrap()
            .unwrap();
        assert_eq!(counts.current_matches, 1);
        assert_eq!(current.first().unwrap().resource_name, "rescB");
    }

    #[test]
    fn resource_condition_matches_the_group_name_too() {
        let mut current = set(&[("rescA", 0)], true);
        let mut tagged = ReplicaSet::new();
        while let Some(mut r) = current.pop_front() {
            r.resource_group = "groupG".to_string();
            tagged.push_back(r);
        }
        let mut stale = ReplicaSet::new();
        let conditions = ConditionSet::new().with(ConditionKey::ResourceName, "groupG");

        let counts = promote_condition_matches(&mut tagged, &mut stale, &conditions)
            .unwrap()
            .unwrap();
        assert_eq!(counts.current_matches, 1);
    }

    #[test]
    fn hierarchy_match_promotes_stale_into_current() {
        let mut current = set(&[("rescA", 0)], true);
        let mut stale = set(&[("rescB", 1)], false);
        let conditions = ConditionSet::new()
            .with(ConditionKey::Hierarchy, "rescB;rescB")
            .with(ConditionKey::DestinationHierarchy, "rescC;rescC");

        let counts = promote_condition_matches(&mut current, &mut stale, &conditions)
            .unwrap()
            .unwrap();
        assert_eq!(counts.current_matches, 1);
        assert_eq!(counts.stale_matches, 0);
        assert!(stale.is_empty());
        assert_eq!(current.len(), 2);
        assert_eq!(current.first().unwrap().resource_name, "rescB");
    }

    #[test]
    fn unmatched_condition_is_no_source_copy() {
        let mut current = set(&[("rescA", 0)], true);
        let mut stale = ReplicaSet::new();
        let conditions = ConditionSet::new().with(ConditionKey::ResourceName, "ghostResc");

        let result = promote_condition_matches(&mut current, &mut stale, &conditions);
        assert!(matches!(result, Err(SelectError::NoSourceCopy)));
        // Nothing was lost on the error path.
        assert_eq!(current.len(), 1);
    }
}
