//! Condition vocabulary threaded through every resolver call.
//!
//! A [`ConditionSet`] is a sparse mapping of named constraints built by the
//! caller before invoking any resolver. Resolvers only read it; once a
//! request enters the pipeline the set is never modified.

use std::collections::HashMap;

/// Minimum number of copies kept by trim when no `Copies` condition is given.
pub const DEFAULT_MIN_COPIES: usize = 2;

/// The fixed set of constraint names callers may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionKey {
    /// Restrict to a single replica number.
    ReplicaNumber,
    /// Restrict to replicas on this resource (or resource group).
    ResourceName,
    /// Exact resource hierarchy of the source replica.
    Hierarchy,
    /// Exact resource hierarchy of the destination.
    DestinationHierarchy,
    /// Minimum-copy floor for trim.
    Copies,
    /// Apply the operation to every member of the destination group.
    ApplyToAll,
    /// Force the operation past consistency guards.
    Force,
    /// Resource designated as the destination of a write.
    DestinationResource,
    /// Resource designated as the fallback default.
    DefaultResource,
    /// Resource designated for backup copies.
    BackupResource,
}

/// An immutable, sparse set of named constraints.
///
/// # Examples
///
/// ```
/// use strata::conditions::{ConditionKey, ConditionSet};
///
/// let conditions = ConditionSet::new()
///     .with(ConditionKey::ReplicaNumber, "2")
///     .with(ConditionKey::ApplyToAll, "");
///
/// assert_eq!(conditions.replica_number(), Some(2));
/// assert!(conditions.apply_to_all());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConditionSet {
    entries: HashMap<ConditionKey, String>,
}

impl ConditionSet {
    /// Create an empty condition set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion. Flag-like keys take an empty value.
    pub fn with(mut self, key: ConditionKey, value: impl Into<String>) -> Self {
        self.entries.insert(key, value.into());
        self
    }

    /// Raw string value for a key, if present.
    pub fn get(&self, key: ConditionKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: ConditionKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsed replica-number constraint. A present but unparsable value is
    /// treated as absent.
    pub fn replica_number(&self) -> Option<i32> {
        self.get(ConditionKey::ReplicaNumber)
            .and_then(|v| v.parse().ok())
    }

    /// Minimum-copy floor for trim. Missing, unparsable, or non-positive
    /// values fall back to [`DEFAULT_MIN_COPIES`].
    pub fn copy_floor(&self) -> usize {
        match self
            .get(ConditionKey::Copies)
            .and_then(|v| v.parse::<i64>().ok())
        {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_MIN_COPIES,
        }
    }

    pub fn apply_to_all(&self) -> bool {
        self.contains(ConditionKey::ApplyToAll)
    }

    pub fn force(&self) -> bool {
        self.contains(ConditionKey::Force)
    }

    /// The resource the caller designated for this request, consulting the
    /// designation keys in fixed priority order: backup, destination,
    /// default, then plain resource name.
    pub fn designated_resource(&self) -> Option<&str> {
        self.get(ConditionKey::BackupResource)
            .or_else(|| self.get(ConditionKey::DestinationResource))
            .or_else(|| self.get(ConditionKey::DefaultResource))
            .or_else(|| self.get(ConditionKey::ResourceName))
            .filter(|v| !v.is_empty() && *v != "null")
    }

    /// Like [`designated_resource`](Self::designated_resource) but without
    /// the plain resource-name key; used for status probes where the plain
    /// key names a source, not a destination.
    pub fn designated_destination(&self) -> Option<&str> {
        self.get(ConditionKey::BackupResource)
            .or_else(|| self.get(ConditionKey::DestinationResource))
            .or_else(|| self.get(ConditionKey::DefaultResource))
            .filter(|v| !v.is_empty() && *v != "null")
    }
}
