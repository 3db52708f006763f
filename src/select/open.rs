use tracing::error;

use crate::conditions::{ConditionKey, ConditionSet};
use crate::replica::{ReplicaRecord, ReplicaSet};

use super::SelectError;

/// Pick the replica an open request addresses.
///
/// An open names its placement exactly through the hierarchy condition; the
/// matching record becomes the sole survivor and every other record is
/// released with the consumed set.
///
/// # Errors
///
/// - [`SelectError::MissingHierarchy`] when the request carries no hierarchy
///   condition. This is a caller defect, logged at error severity.
/// - [`SelectError::HierarchyNotFound`] when no replica sits at the named
///   hierarchy.
pub fn select_for_open(
    mut replicas: ReplicaSet,
    conditions: &ConditionSet,
    write: bool,
) -> Result<ReplicaRecord, SelectError> {
    let target = conditions
        .get(ConditionKey::Hierarchy)
        .filter(|v| !v.is_empty());
    let Some(target) = target else {
        error!("open request carried no hierarchy condition");
        return Err(SelectError::MissingHierarchy);
    };

    match replicas.position(|r| r.hierarchy == target) {
        Some(index) => {
            let mut record = replicas.take(index);
            record.write_intent = record.write_intent || write;
            Ok(record)
        }
        None => Err(SelectError::HierarchyNotFound(target.to_string())),
    }
}
