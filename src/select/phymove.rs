use crate::conditions::ConditionSet;
use crate::reconcile::{
    reconcile, REMOVE_MATCHED_TARGET, REMOVE_MATCHED_TARGET_EXTRACT_MATCHED,
    REQUEUE_MATCHED_TARGET,
};
use crate::replica::ReplicaSet;
use crate::resources::GroupSet;

use super::matching::promote_condition_matches;
use super::SelectError;

/// Outcome of a physical-move resolution.
#[derive(Debug)]
pub struct MoveDecision {
    /// Current replicas to move, best candidate first.
    pub sources: ReplicaSet,
    /// Stale replicas to move once the current ones are handled.
    pub stale_sources: ReplicaSet,
    /// Destination members the move may write to.
    pub targets: GroupSet,
}

/// Decide which replicas a physical move relocates and where.
///
/// A move rewrites an existing replica rather than adding one, so matched
/// destination members are requeued (when `allow_multi_copy` permits a
/// second copy per resource) or struck. A current replica occupying a member
/// is struck with it; a stale occupant stays in the source pool, since
/// moving it elsewhere is still useful.
///
/// # Errors
///
/// - [`SelectError::ResourceIsDown`] when no destination member is up;
/// - [`SelectError::CopyAlreadyPresent`] when every destination member
///   already holds the data and multi-copy is off;
/// - [`SelectError::NoSourceCopy`] when nothing is left to move.
pub fn select_for_move(
    mut current: ReplicaSet,
    mut stale: ReplicaSet,
    mut destination: GroupSet,
    conditions: &ConditionSet,
    allow_multi_copy: bool,
) -> Result<MoveDecision, SelectError> {
    if !destination.is_empty() && !destination.any_up() {
        let name = destination
            .group_name()
            .or_else(|| destination.first().map(|e| e.resource.name.as_str()))
            .unwrap_or_default()
            .to_string();
        return Err(SelectError::ResourceIsDown(name));
    }

    promote_condition_matches(&mut current, &mut stale, conditions)?;

    let members_before = destination.len();
    if allow_multi_copy {
        reconcile(&mut current, &mut destination, REQUEUE_MATCHED_TARGET, None);
        reconcile(&mut stale, &mut destination, REQUEUE_MATCHED_TARGET, None);
    } else {
        // A current replica already on a destination member neither moves
        // nor leaves room for another copy there; both drop out. A stale
        // replica only costs the member: the copy itself stays movable.
        reconcile(
            &mut current,
            &mut destination,
            REMOVE_MATCHED_TARGET_EXTRACT_MATCHED,
            None,
        );
        reconcile(&mut stale, &mut destination, REMOVE_MATCHED_TARGET, None);
    }

    if destination.is_empty() {
        // Members only leave the set when a matching replica struck them,
        // so a drained set means every member already held the data.
        return if members_before > 0 || !(current.is_empty() && stale.is_empty()) {
            Err(SelectError::CopyAlreadyPresent)
        } else {
            Err(SelectError::NoSourceCopy)
        };
    }
    if current.is_empty() && stale.is_empty() {
        return Err(SelectError::NoSourceCopy);
    }

    Ok(MoveDecision {
        sources: current,
        stale_sources: stale,
        targets: destination,
    })
}
