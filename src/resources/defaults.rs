use rand::Rng;
use tracing::{debug, warn};

use crate::catalog::CatalogQuery;
use crate::conditions::ConditionSet;
use crate::config::PlacementConfig;

use super::{GroupSet, ResourceCatalog, ResourceError};

/// How the caller-supplied resource designation interacts with the
/// configured default-resource list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultPolicy {
    /// Ignore the caller's designation unless the caller holds elevated
    /// privilege; pick from the default list.
    Forced,
    /// Honor the caller's designation, but float the earliest default-list
    /// member of the resolved group to the front.
    Preferred,
    /// Prefer the caller's designation; fall back to the default list when
    /// it is absent or not viable.
    Fallback,
}

impl ResourceCatalog {
    /// Choose the resource (or group) that should host a new write.
    ///
    /// Candidates are validated for existence and up-status before being
    /// offered and skipped in order otherwise. The starting offset into the
    /// default list is randomized per call so repeated calls spread load
    /// across the configured defaults. Resources on the taboo list are
    /// never offered.
    ///
    /// # Errors
    ///
    /// - [`ResourceError::NoResourceInput`] when nothing was designated and
    ///   no default list is configured;
    /// - [`ResourceError::ResourceIsDown`] when every candidate failed
    ///   validation.
    pub fn set_default_resource(
        &self,
        catalog: &dyn CatalogQuery,
        placement: &PlacementConfig,
        policy: DefaultPolicy,
        conditions: &ConditionSet,
        privileged: bool,
    ) -> Result<GroupSet, ResourceError> {
        let requested = conditions
            .designated_resource()
            .filter(|name| !placement.is_taboo(name));

        match policy {
            DefaultPolicy::Forced => {
                if privileged {
                    if let Some(name) = requested {
                        match self.resolve_group(catalog, name) {
                            Ok(set) if set.any_up() => return Ok(set),
                            _ => warn!(
                                resource = %name,
                                "privileged designation not viable; using defaults"
                            ),
                        }
                    }
                }
                self.pick_default(catalog, placement)
            }
            DefaultPolicy::Preferred => {
                if let Some(name) = requested {
                    match self.resolve_group(catalog, name) {
                        Ok(mut set) if set.any_up() => {
                            for default in &placement.default_resources {
                                if let Some(index) = set.position_of(default) {
                                    set.promote(index);
                                    break;
                                }
                            }
                            return Ok(set);
                        }
                        _ => warn!(
                            resource = %name,
                            "preferred designation not viable; using defaults"
                        ),
                    }
                }
                self.pick_default(catalog, placement)
            }
            DefaultPolicy::Fallback => {
                if let Some(name) = requested {
                    match self.resolve_group(catalog, name) {
                        Ok(set) if set.any_up() => return Ok(set),
                        Ok(_) => {
                            warn!(resource = %name, "designated group has no member up; using defaults");
                        }
                        Err(err) => {
                            warn!(resource = %name, error = %err, "designated resource not viable; using defaults");
                        }
                    }
                }
                self.pick_default(catalog, placement)
            }
        }
    }

    fn pick_default(
        &self,
        catalog: &dyn CatalogQuery,
        placement: &PlacementConfig,
    ) -> Result<GroupSet, ResourceError> {
        let list = &placement.default_resources;
        if list.is_empty() {
            return Err(ResourceError::NoResourceInput);
        }
        let start = rand::thread_rng().gen_range(0..list.len());
        for offset in 0..list.len() {
            let name = &list[(start + offset) % list.len()];
            if placement.is_taboo(name) {
                warn!(resource = %name, "default-list entry is on the taboo list; skipped");
                continue;
            }
            match self.resolve_group(catalog, name) {
                Ok(set) if set.any_up() => {
                    debug!(resource = %name, "default resource selected");
                    return Ok(set);
                }
                Ok(_) => warn!(resource = %name, "default resource has no member up; skipped"),
                Err(err) => warn!(resource = %name, error = %err, "default resource not viable; skipped"),
            }
        }
        Err(ResourceError::ResourceIsDown(list.join(",")))
    }
}
