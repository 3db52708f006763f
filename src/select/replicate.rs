use crate::conditions::ConditionSet;
use crate::reconcile::{
    reconcile, REMOVE_MATCHED_TARGET, REMOVE_MATCHED_TARGET_EXTRACT_UNMATCHED,
};
use crate::replica::ReplicaSet;
use crate::resources::GroupSet;

use super::matching::promote_condition_matches;
use super::SelectError;

/// Outcome of a replicate resolution.
#[derive(Debug)]
pub enum ReplicateDecision {
    /// Every requested destination already holds a current copy.
    HaveGoodCopy,
    /// Copies are needed.
    NeedsCopy {
        /// Copy sources, best candidate first.
        sources: ReplicaSet,
        /// Destination members still lacking a current copy.
        targets: GroupSet,
        /// Stale replicas on those members that should be overwritten in
        /// place instead of allocating a new slot.
        overwrite: ReplicaSet,
    },
}

/// Decide what a replicate request still has to do.
///
/// `current` and `stale` are the classified replica sets of the object;
/// `destination` is the resolved target resource or group.
///
/// # Errors
///
/// - [`SelectError::ResourceIsDown`] when no destination member is up;
/// - [`SelectError::NoSourceCopy`] when a condition was given but no replica
///   satisfies it.
pub fn select_for_replicate(
    mut current: ReplicaSet,
    mut stale: ReplicaSet,
    mut destination: GroupSet,
    destination_hierarchy: Option<&str>,
    conditions: &ConditionSet,
) -> Result<ReplicateDecision, SelectError> {
    if destination.is_empty() {
        // Nothing left to place.
        return Ok(ReplicateDecision::HaveGoodCopy);
    }
    if !destination.any_up() {
        let name = destination
            .group_name()
            .or_else(|| destination.first().map(|e| e.resource.name.as_str()))
            .unwrap_or_default()
            .to_string();
        return Err(SelectError::ResourceIsDown(name));
    }

    if let Some(counts) = promote_condition_matches(&mut current, &mut stale, conditions)? {
        if counts.current_matches == 0 && counts.stale_matches > 0 {
            // Only stale copies satisfy the condition: they become the copy
            // source and every current replica is demoted.
            let mut promoted = stale;
            let mut demoted = promoted.split_off(counts.stale_matches);
            demoted.append(&mut current);
            current = promoted;
            stale = demoted;
        }
    }

    if destination.is_single_target() {
        let target = destination
            .first()
            .map(|e| e.resource.name.clone())
            .unwrap_or_default();
        let has_good = current.any(|r| {
            r.on_resource_or_group(&target)
                && destination_hierarchy.map_or(true, |h| r.hierarchy == h)
        });
        if has_good {
            return Ok(ReplicateDecision::HaveGoodCopy);
        }
        let mut overwrite = ReplicaSet::new();
        if let Some(index) = stale.position(|r| r.on_resource_or_group(&target)) {
            overwrite.push_back(stale.take(index));
        }
        return Ok(ReplicateDecision::NeedsCopy {
            sources: current,
            targets: destination,
            overwrite,
        });
    }

    // Strike every member that already holds a current copy.
    reconcile(&mut current, &mut destination, REMOVE_MATCHED_TARGET, None);
    if destination.is_empty() {
        return Ok(ReplicateDecision::HaveGoodCopy);
    }

    let mut overwrite = ReplicaSet::new();
    if conditions.apply_to_all() {
        // A member holding a stale copy is refreshed in place rather than
        // allocated a new slot, so it leaves the target set; stale copies
        // elsewhere are of no use to this pass and are dropped.
        reconcile(
            &mut stale,
            &mut destination,
            REMOVE_MATCHED_TARGET_EXTRACT_UNMATCHED,
            None,
        );
        overwrite.append(&mut stale);
    } else {
        let group = destination.group_name().map(str::to_string);
        let index = stale.position(|r| {
            destination.position_of(&r.resource_name).is_some()
                || group.as_deref().is_some_and(|g| r.resource_group == g)
        });
        if let Some(index) = index {
            overwrite.push_back(stale.take(index));
        }
    }
    Ok(ReplicateDecision::NeedsCopy {
        sources: current,
        targets: destination,
        overwrite,
    })
}
