use tracing::debug;

use crate::catalog::{
    AccessPermission, CatalogError, CatalogQuery, ObjectRef, ReplicaQuery,
};
use crate::conditions::{ConditionKey, ConditionSet};
use crate::replica::{ReplicaRecord, ReplicaSet};
use crate::resources::ResourceCatalog;

/// Builds the per-request replica collection for one logical object.
///
/// The builder drives the catalog's continuation-token loop itself; callers
/// receive the complete ordered set in one call. Each row's resource name is
/// cross-referenced against the topology cache; a replica on a resource this
/// zone does not configure keeps `resource: None` and is handled leniently
/// downstream.
pub struct ReplicaInfoBuilder<'a> {
    catalog: &'a dyn CatalogQuery,
    resources: &'a ResourceCatalog,
}

impl<'a> ReplicaInfoBuilder<'a> {
    pub fn new(catalog: &'a dyn CatalogQuery, resources: &'a ResourceCatalog) -> Self {
        Self { catalog, resources }
    }

    /// Fetch and build every replica of `object` visible under `access`.
    ///
    /// An object with zero catalog rows yields an empty set, distinguishable
    /// from a transport failure which surfaces as
    /// [`CatalogError::QueryFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the catalog query or the topology load
    /// behind resource cross-referencing fails.
    pub fn build(
        &self,
        object: ObjectRef,
        access: Option<AccessPermission>,
        conditions: &ConditionSet,
    ) -> Result<ReplicaSet, CatalogError> {
        let mut query = ReplicaQuery::new(object);
        query.access = access;
        query.replica_number = conditions.replica_number();
        query.resource_name = conditions
            .get(ConditionKey::ResourceName)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let mut set = ReplicaSet::new();
        let mut token = None;
        loop {
            let page = match self.catalog.replica_rows(&query, token) {
                Ok(page) => page,
                Err(CatalogError::NoRows) => break,
                Err(err) => return Err(err),
            };
            for row in page.rows {
                let resource = self
                    .resources
                    .find_resource(self.catalog, &row.resource_name)?;
                if resource.is_none() {
                    debug!(
                        resource = %row.resource_name,
                        path = %row.logical_path,
                        "replica resource not configured in this zone"
                    );
                }
                set.push_back(ReplicaRecord::from_row(row, resource, query.access.as_ref()));
            }
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::StubCatalog;
    use crate::catalog::{PermissionLevel, ReplicaRow};
    use chrono::Utc;

    fn row(resource: &str, replica_number: i32) -> ReplicaRow {
        let now = Utc::now();
        ReplicaRow {
            data_id: 10001,
            collection_id: 20,
            logical_path: "/tempZone/home/alice/data.dat".to_string(),
            replica_number,
            version: String::new(),
            data_type: "generic".to_string(),
            size: 4096,
            resource_group: String::new(),
            resource_name: resource.to_string(),
            hierarchy: format!("{};{}", resource, resource),
            physical_path: format!("/vault/{}/data.dat", resource),
            owner_name: "alice".to_string(),
            owner_zone: "tempZone".to_string(),
            is_current: true,
            status: String::new(),
            checksum: String::new(),
            expiry: String::new(),
            map_id: 0,
            comments: String::new(),
            created: now,
            modified: now,
        }
    }

    fn access() -> AccessPermission {
        AccessPermission {
            user: "alice".to_string(),
            zone: "tempZone".to_string(),
            level: PermissionLevel::Modify,
        }
    }

    #[test]
    fn builds_across_pages_and_marks_write_intent() {
        let catalog = StubCatalog::new()
            .with_resource("rescA", "cache", "up")
            .with_resource("rescB", "cache", "up")
            .with_replica_pages(vec![vec![row("rescA", 0)], vec![row("rescB", 1)]]);
        let resources = ResourceCatalog::create_test("nodeA.example.org");

        let builder = ReplicaInfoBuilder::new(&catalog, &resources);
        let set = builder
            .build(
                ObjectRef::Path("/tempZone/home/alice/data.dat".to_string()),
                Some(access()),
                &ConditionSet::new(),
            )
            .unwrap();

        assert_eq!(set.len(), 2);
        assert!(set.iter().all(|r| r.write_intent));
        assert!(set.iter().all(|r| r.resource.is_some()));
        let names: Vec<_> = set.iter().map(|r| r.resource_name.as_str()).collect();
        assert_eq!(names, ["rescA", "rescB"]);
    }

    #[test]
    fn zero_rows_is_an_empty_set_not_an_error() {
        let catalog = StubCatalog::new().with_resource("rescA", "cache", "up");
        let resources = ResourceCatalog::create_test("nodeA.example.org");

        let builder = ReplicaInfoBuilder::new(&catalog, &resources);
        let set = builder
            .build(ObjectRef::DataId(999), None, &ConditionSet::new())
            .unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn unconfigured_resource_is_kept_without_a_record() {
        let catalog = StubCatalog::new()
            .with_resource("rescA", "cache", "up")
            .with_replica_pages(vec![vec![row("remoteResc", 0)]]);
        let resources = ResourceCatalog::create_test("nodeA.example.org");

        let builder = ReplicaInfoBuilder::new(&catalog, &resources);
        let set = builder
            .build(ObjectRef::DataId(10001), None, &ConditionSet::new())
            .unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.first().unwrap().resource.is_none());
    }

    #[test]
    fn conditions_become_query_filters() {
        let catalog = StubCatalog::new()
            .with_resource("rescA", "cache", "up")
            .with_replica_pages(vec![vec![row("rescA", 2)]]);
        let resources = ResourceCatalog::create_test("nodeA.example.org");

        let conditions = ConditionSet::new()
            .with(ConditionKey::ReplicaNumber, "2")
            .with(ConditionKey::ResourceName, "rescA");
        let builder = ReplicaInfoBuilder::new(&catalog, &resources);
        builder
            .build(ObjectRef::DataId(10001), None, &conditions)
            .unwrap();

        let seen = catalog.last_replica_query().unwrap();
        assert_eq!(seen.replica_number, Some(2));
        assert_eq!(seen.resource_name.as_deref(), Some("rescA"));
    }
}
