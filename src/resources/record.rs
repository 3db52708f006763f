use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::catalog::ResourceRow;

/// Role category of a resource; drives placement and sort priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    /// Fast, online storage; preferred for reads and new writes.
    Cache,
    /// Slow or offline-capable storage.
    Archive,
    /// A composed resource fronted by a cache member.
    Compound,
    /// Container storage holding many objects per physical file.
    Bundle,
    /// Anything else; behaves as cache-like.
    Other,
}

impl ResourceClass {
    /// Parse the catalog's class column. Unknown classes land in `Other`
    /// rather than refusing to configure the resource.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cache" => ResourceClass::Cache,
            "archive" => ResourceClass::Archive,
            "compound" => ResourceClass::Compound,
            "bundle" => ResourceClass::Bundle,
            _ => ResourceClass::Other,
        }
    }

    /// Sort rank for class-based ordering: cache first, archive second,
    /// everything else after.
    pub fn sort_rank(self) -> u8 {
        match self {
            ResourceClass::Cache => 0,
            ResourceClass::Archive => 1,
            _ => 2,
        }
    }
}

/// Up/down status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Up,
    Down,
}

impl ResourceStatus {
    /// The catalog stores status as free text; any value containing "down"
    /// marks the resource down.
    pub fn parse(s: &str) -> Self {
        if s.to_ascii_lowercase().contains("down") {
            ResourceStatus::Down
        } else {
            ResourceStatus::Up
        }
    }

    pub fn is_up(self) -> bool {
        matches!(self, ResourceStatus::Up)
    }
}

/// One registered storage endpoint.
///
/// Records are owned exclusively by the [`ResourceCatalog`](super::ResourceCatalog)
/// cache and shared out as `Arc` snapshots; everything here is immutable for
/// the lifetime of one cache generation except the lazily-cached quota limit.
#[derive(Debug)]
pub struct ResourceRecord {
    pub id: i64,
    pub name: String,
    pub zone: String,
    /// Host the resource lives on.
    pub location: String,
    pub driver_type: String,
    pub class: ResourceClass,
    pub vault_path: String,
    pub free_space: i64,
    pub comments: String,
    pub status: ResourceStatus,
    quota_limit: OnceLock<i64>,
}

impl ResourceRecord {
    pub fn from_row(row: &ResourceRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            zone: row.zone.clone(),
            location: row.location.clone(),
            driver_type: row.driver_type.clone(),
            class: ResourceClass::parse(&row.class),
            vault_path: row.vault_path.clone(),
            free_space: row.free_space,
            comments: row.comments.clone(),
            status: ResourceStatus::parse(&row.status),
            quota_limit: OnceLock::new(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status.is_up()
    }

    pub fn is_local_to(&self, host: &str) -> bool {
        !host.is_empty() && self.location.eq_ignore_ascii_case(host)
    }

    /// Quota limit cached on first lookup; `None` until a caller resolves
    /// and caches it.
    pub fn quota_limit(&self) -> Option<i64> {
        self.quota_limit.get().copied()
    }

    /// Cache the quota limit for this cache generation. Later calls keep the
    /// first value.
    pub fn cache_quota_limit(&self, limit: i64) {
        let _ = self.quota_limit.set(limit);
    }

    /// In-memory record for tests; location derives from the name.
    #[cfg(test)]
    pub(crate) fn create_test(name: &str, class: ResourceClass, status: ResourceStatus) -> Self {
        Self {
            id: 1,
            name: name.to_string(),
            zone: "tempZone".to_string(),
            location: format!("{}.example.org", name),
            driver_type: "unixfilesystem".to_string(),
            class,
            vault_path: format!("/vault/{}", name),
            free_space: 0,
            comments: String::new(),
            status,
            quota_limit: OnceLock::new(),
        }
    }
}

/// One candidate entry: a resource viewed as a member of a (possibly ad hoc)
/// group. The entry never owns the record; it shares the catalog's snapshot.
#[derive(Debug, Clone)]
pub struct GroupEntry {
    /// Owning group name; empty for an ad hoc single-resource candidate.
    pub group_name: String,
    pub resource: Arc<ResourceRecord>,
}

/// An ordered collection of candidate resources, either "all members of a
/// named group" or an ad hoc candidate list.
#[derive(Debug, Clone, Default)]
pub struct GroupSet {
    entries: Vec<GroupEntry>,
}

impl GroupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// An ad hoc set holding one resource outside any named group.
    pub fn single(resource: Arc<ResourceRecord>) -> Self {
        Self {
            entries: vec![GroupEntry {
                group_name: String::new(),
                resource,
            }],
        }
    }

    pub fn push(&mut self, entry: GroupEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GroupEntry> {
        self.entries.get(index)
    }

    pub fn first(&self) -> Option<&GroupEntry> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GroupEntry> {
        self.entries.iter()
    }

    pub fn remove(&mut self, index: usize) -> GroupEntry {
        self.entries.remove(index)
    }

    /// Move the entry at `index` to the tail, preserving the order of the
    /// rest.
    pub fn requeue(&mut self, index: usize) {
        let entry = self.entries.remove(index);
        self.entries.push(entry);
    }

    /// Move the entry at `index` to the head, preserving the order of the
    /// rest.
    pub fn promote(&mut self, index: usize) {
        let entry = self.entries.remove(index);
        self.entries.insert(0, entry);
    }

    /// Position of the first entry whose resource carries `name`.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.resource.name == name)
    }

    /// The group name this set was resolved from, if it is a named group.
    pub fn group_name(&self) -> Option<&str> {
        self.entries
            .first()
            .map(|e| e.group_name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// A set is a single write target when it holds at most one entry or was
    /// not resolved from a named group.
    pub fn is_single_target(&self) -> bool {
        self.entries.len() <= 1 || self.group_name().is_none()
    }

    pub fn any_up(&self) -> bool {
        self.entries.iter().any(|e| e.resource.is_up())
    }

    /// Stable reorder by an arbitrary key; used by the sort schemes.
    pub fn sort_by_key<K: Ord>(&mut self, f: impl FnMut(&GroupEntry) -> K) {
        self.entries.sort_by_key(f);
    }

    /// Rearrange entries into the order given by `order`, a permutation of
    /// `0..len`.
    pub(crate) fn apply_permutation(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.entries.len());
        let mut taken: Vec<Option<GroupEntry>> =
            self.entries.drain(..).map(Some).collect();
        self.entries = order
            .iter()
            .filter_map(|&i| taken[i].take())
            .collect();
    }
}

impl<'a> IntoIterator for &'a GroupSet {
    type Item = &'a GroupEntry;
    type IntoIter = std::slice::Iter<'a, GroupEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
