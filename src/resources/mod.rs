//! Process-wide resource topology cache and candidate selection.
//!
//! The [`ResourceCatalog`] owns the only long-lived state in the crate: a
//! lazily-populated cache of resource records and group memberships. The
//! cache is loaded on first use, invalidated only by an explicit
//! [`refresh`](ResourceCatalog::refresh), and guarded by a reader-writer
//! lock so concurrent requests observe either the full topology or none of
//! it, never a partial load.

mod defaults;
mod error;
mod record;
mod sort;

pub use defaults::DefaultPolicy;
pub use error::ResourceError;
pub use record::{GroupEntry, GroupSet, ResourceClass, ResourceRecord, ResourceStatus};
pub use sort::{SortScheme, LOAD_FACTOR_CEILING, LOAD_SAMPLE_MAX_AGE_SECS};

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, CatalogQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum CacheState {
    #[default]
    Unloaded,
    /// Transient; only ever held while the write lock is, so readers never
    /// see it.
    Loading,
    Loaded,
}

#[derive(Debug, Default)]
struct TopologyCache {
    state: CacheState,
    resources: HashMap<String, Arc<ResourceRecord>>,
    /// Group membership, keyed by group name. Loaded lazily on the first
    /// group resolution, not with the resources.
    groups: Option<HashMap<String, Vec<Arc<ResourceRecord>>>>,
}

/// The resource-topology cache and everything that selects from it.
///
/// One instance per process; resolvers receive it by reference.
pub struct ResourceCatalog {
    cache: RwLock<TopologyCache>,
    local_host: String,
}

impl ResourceCatalog {
    pub fn new(local_host: impl Into<String>) -> Self {
        Self {
            cache: RwLock::new(TopologyCache::default()),
            local_host: local_host.into(),
        }
    }

    /// Host this process runs on; drives locality decisions.
    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    /// Drop the cached topology. The next resolution reloads from the
    /// catalog.
    pub fn refresh(&self) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        *cache = TopologyCache::default();
        info!("resource topology cache invalidated");
    }

    /// Load the resource table if it has not been loaded yet.
    fn ensure_loaded(&self, catalog: &dyn CatalogQuery) -> Result<(), CatalogError> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if cache.state == CacheState::Loaded {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if cache.state == CacheState::Loaded {
            // Another caller finished the load while we waited.
            return Ok(());
        }
        cache.state = CacheState::Loading;

        let mut resources = HashMap::new();
        let mut token = None;
        loop {
            let page = match catalog.resource_rows(token) {
                Ok(page) => page,
                Err(CatalogError::NoRows) => break,
                Err(err) => {
                    cache.state = CacheState::Unloaded;
                    return Err(err);
                }
            };
            for row in &page.rows {
                resources.insert(row.name.clone(), Arc::new(ResourceRecord::from_row(row)));
            }
            match page.next {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(count = resources.len(), "resource topology loaded");
        cache.resources = resources;
        cache.state = CacheState::Loaded;
        Ok(())
    }

    /// Load group memberships if they have not been loaded yet. Requires the
    /// resource table; loads it first when needed.
    fn ensure_groups(&self, catalog: &dyn CatalogQuery) -> Result<(), CatalogError> {
        self.ensure_loaded(catalog)?;
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if cache.groups.is_some() {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        if cache.groups.is_some() {
            return Ok(());
        }

        let rows = match catalog.group_rows() {
            Ok(rows) => rows,
            // No groups configured at all; cache the empty map.
            Err(CatalogError::NoRows) => Vec::new(),
            Err(err) => return Err(err),
        };

        let mut groups: HashMap<String, Vec<Arc<ResourceRecord>>> = HashMap::new();
        for row in rows {
            match cache.resources.get(&row.resource_name) {
                Some(resource) => groups
                    .entry(row.group_name)
                    .or_default()
                    .push(Arc::clone(resource)),
                None => warn!(
                    group = %row.group_name,
                    resource = %row.resource_name,
                    "group member is not a configured resource; skipped"
                ),
            }
        }
        debug!(count = groups.len(), "resource groups loaded");
        cache.groups = Some(groups);
        Ok(())
    }

    /// Lenient lookup: `Ok(None)` when `name` is not a configured resource.
    pub fn find_resource(
        &self,
        catalog: &dyn CatalogQuery,
        name: &str,
    ) -> Result<Option<Arc<ResourceRecord>>, CatalogError> {
        self.ensure_loaded(catalog)?;
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        Ok(cache.resources.get(name).cloned())
    }

    /// Resolve `name` to its resource record.
    ///
    /// # Errors
    ///
    /// [`ResourceError::ResourceNotConfigured`] when no resource carries the
    /// name.
    pub fn resolve_resource(
        &self,
        catalog: &dyn CatalogQuery,
        name: &str,
    ) -> Result<Arc<ResourceRecord>, ResourceError> {
        self.find_resource(catalog, name)?
            .ok_or_else(|| ResourceError::ResourceNotConfigured(name.to_string()))
    }

    /// Resolve `name` as a candidate list: a plain resource yields a
    /// single-entry ad hoc set, a group name yields every member in group
    /// order.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::ResourceIsDown`] for a plain resource that is down;
    /// - [`ResourceError::GroupNotFound`] when the name matches neither a
    ///   resource nor a group.
    pub fn resolve_group(
        &self,
        catalog: &dyn CatalogQuery,
        name: &str,
    ) -> Result<GroupSet, ResourceError> {
        if let Some(resource) = self.find_resource(catalog, name)? {
            if !resource.is_up() {
                return Err(ResourceError::ResourceIsDown(name.to_string()));
            }
            return Ok(GroupSet::single(resource));
        }

        self.ensure_groups(catalog)?;
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let members = cache
            .groups
            .as_ref()
            .and_then(|groups| groups.get(name))
            .ok_or_else(|| ResourceError::GroupNotFound(name.to_string()))?;

        let mut set = GroupSet::new();
        for resource in members {
            set.push(GroupEntry {
                group_name: name.to_string(),
                resource: Arc::clone(resource),
            });
        }
        Ok(set)
    }

    /// Up/down status of a resource or group. A group is up iff at least one
    /// member is up.
    pub fn status(
        &self,
        catalog: &dyn CatalogQuery,
        name: &str,
    ) -> Result<ResourceStatus, ResourceError> {
        if let Some(resource) = self.find_resource(catalog, name)? {
            return Ok(resource.status);
        }
        self.ensure_groups(catalog)?;
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let members = cache
            .groups
            .as_ref()
            .and_then(|groups| groups.get(name))
            .ok_or_else(|| ResourceError::GroupNotFound(name.to_string()))?;
        if members.iter().any(|r| r.is_up()) {
            Ok(ResourceStatus::Up)
        } else {
            Ok(ResourceStatus::Down)
        }
    }

    #[cfg(test)]
    pub(crate) fn create_test(local_host: &str) -> Self {
        Self::new(local_host)
    }
}
