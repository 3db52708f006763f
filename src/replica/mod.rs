//! Replica records and the owned collections they move through.
//!
//! A [`ReplicaRecord`] describes one physical copy of one logical object as
//! reported by the catalog. Records live in exactly one [`ReplicaSet`] at a
//! time; every transfer between sets is a move. The sets themselves are
//! created per request and discarded when the request finishes.

mod builder;

pub use builder::ReplicaInfoBuilder;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::catalog::{AccessPermission, ReplicaRow};
use crate::resources::{ResourceClass, ResourceRecord};

/// One physical copy of one logical object.
#[derive(Debug, Clone)]
pub struct ReplicaRecord {
    pub data_id: i64,
    pub collection_id: i64,
    pub logical_path: String,
    pub replica_number: i32,
    pub version: String,
    pub data_type: String,
    pub size: i64,
    /// Group the replica's resource belonged to when the copy was made;
    /// empty when it was written outside any group.
    pub resource_group: String,
    pub resource_name: String,
    /// Placement within a composed resource; disambiguates otherwise
    /// identical resource names.
    pub hierarchy: String,
    pub physical_path: String,
    pub owner_name: String,
    pub owner_zone: String,
    /// Up-to-date flag; false marks a stale copy.
    pub is_current: bool,
    pub status: String,
    pub checksum: String,
    pub expiry: String,
    pub map_id: i32,
    pub comments: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Set when the request that built this record intends to write.
    pub write_intent: bool,
    /// Resolved resource record, shared out of the topology cache. `None`
    /// when the resource is not configured locally (e.g. a remote-zone
    /// replica); such records classify as cache-class, non-local, up.
    pub resource: Option<Arc<ResourceRecord>>,
}

impl ReplicaRecord {
    pub fn from_row(
        row: ReplicaRow,
        resource: Option<Arc<ResourceRecord>>,
        access: Option<&AccessPermission>,
    ) -> Self {
        Self {
            data_id: row.data_id,
            collection_id: row.collection_id,
            logical_path: row.logical_path,
            replica_number: row.replica_number,
            version: row.version,
            data_type: row.data_type,
            size: row.size,
            resource_group: row.resource_group,
            resource_name: row.resource_name,
            hierarchy: row.hierarchy,
            physical_path: row.physical_path,
            owner_name: row.owner_name,
            owner_zone: row.owner_zone,
            is_current: row.is_current,
            status: row.status,
            checksum: row.checksum,
            expiry: row.expiry,
            map_id: row.map_id,
            comments: row.comments,
            created: row.created,
            modified: row.modified,
            write_intent: access.map(AccessPermission::wants_write).unwrap_or(false),
            resource,
        }
    }

    /// Class of the backing resource; unconfigured resources behave as
    /// cache-class.
    pub fn class(&self) -> ResourceClass {
        self.resource
            .as_ref()
            .map(|r| r.class)
            .unwrap_or(ResourceClass::Cache)
    }

    /// Whether the backing resource is up. Unconfigured resources are
    /// treated as up; their availability is not ours to judge.
    pub fn resource_is_up(&self) -> bool {
        self.resource.as_ref().map(|r| r.is_up()).unwrap_or(true)
    }

    pub fn is_local_to(&self, host: &str) -> bool {
        self.resource
            .as_ref()
            .map(|r| r.is_local_to(host))
            .unwrap_or(false)
    }

    /// Whether the replica sits on `resource_name` or carries it as its
    /// group.
    pub fn on_resource_or_group(&self, name: &str) -> bool {
        self.resource_name == name || self.resource_group == name
    }
}

/// Owned, ordered collection of replica records.
///
/// Records enter and leave by move only; there is no clone-then-drop path, so
/// a record is never reachable from two sets at once.
#[derive(Debug, Clone, Default)]
pub struct ReplicaSet {
    records: Vec<ReplicaRecord>,
}

impl ReplicaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push_front(&mut self, record: ReplicaRecord) {
        self.records.insert(0, record);
    }

    pub fn push_back(&mut self, record: ReplicaRecord) {
        self.records.push(record);
    }

    /// Drain every record out of `other` onto this set's tail.
    pub fn append(&mut self, other: &mut ReplicaSet) {
        self.records.append(&mut other.records);
    }

    /// Move the record at `index` out of the set.
    pub fn take(&mut self, index: usize) -> ReplicaRecord {
        self.records.remove(index)
    }

    pub fn pop_front(&mut self) -> Option<ReplicaRecord> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.remove(0))
        }
    }

    /// Move every record satisfying `pred` into a new set, preserving order
    /// in both.
    pub fn extract_where(&mut self, mut pred: impl FnMut(&ReplicaRecord) -> bool) -> ReplicaSet {
        let mut extracted = Vec::new();
        let mut kept = Vec::with_capacity(self.records.len());
        for record in self.records.drain(..) {
            if pred(&record) {
                extracted.push(record);
            } else {
                kept.push(record);
            }
        }
        self.records = kept;
        ReplicaSet { records: extracted }
    }

    /// Split off the tail starting at `at`, leaving the head in place.
    pub fn split_off(&mut self, at: usize) -> ReplicaSet {
        ReplicaSet {
            records: self.records.split_off(at),
        }
    }

    pub fn get(&self, index: usize) -> Option<&ReplicaRecord> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&ReplicaRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReplicaRecord> {
        self.records.iter()
    }

    pub fn position(&self, pred: impl FnMut(&ReplicaRecord) -> bool) -> Option<usize> {
        self.records.iter().position(pred)
    }

    pub fn any(&self, pred: impl FnMut(&ReplicaRecord) -> bool) -> bool {
        self.records.iter().any(pred)
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl IntoIterator for ReplicaSet {
    type Item = ReplicaRecord;
    type IntoIter = std::vec::IntoIter<ReplicaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ReplicaSet {
    type Item = &'a ReplicaRecord;
    type IntoIter = std::slice::Iter<'a, ReplicaRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<ReplicaRecord> for ReplicaSet {
    fn from_iter<I: IntoIterator<Item = ReplicaRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::resources::{ResourceStatus, ResourceRecord};

    /// Replica on `resource_name`, current or stale, backed by an in-memory
    /// resource record with the given class and status.
    pub fn create_test_replica(
        resource_name: &str,
        is_current: bool,
        class: ResourceClass,
        status: ResourceStatus,
    ) -> ReplicaRecord {
        let resource = Arc::new(ResourceRecord::create_test(resource_name, class, status));
        create_test_replica_on(resource_name, is_current, Some(resource))
    }

    /// Replica with an explicit (possibly absent) resource record.
    pub fn create_test_replica_on(
        resource_name: &str,
        is_current: bool,
        resource: Option<Arc<ResourceRecord>>,
    ) -> ReplicaRecord {
        let now = Utc::now();
        ReplicaRecord {
            data_id: 10001,
            collection_id: 20,
            logical_path: "/tempZone/home/alice/data.dat".to_string(),
            replica_number: 0,
            version: String::new(),
            data_type: "generic".to_string(),
            size: 4096,
            resource_group: String::new(),
            resource_name: resource_name.to_string(),
            hierarchy: format!("{};{}", resource_name, resource_name),
            physical_path: format!("/vault/{}/data.dat", resource_name),
            owner_name: "alice".to_string(),
            owner_zone: "tempZone".to_string(),
            is_current,
            status: String::new(),
            checksum: String::new(),
            expiry: String::new(),
            map_id: 0,
            comments: String::new(),
            created: now,
            modified: now,
            write_intent: false,
            resource,
        }
    }
}
