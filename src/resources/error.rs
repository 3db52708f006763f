use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors raised while resolving or selecting resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The name matches no registered resource.
    #[error("resource '{0}' is not configured")]
    ResourceNotConfigured(String),

    /// The name matches neither a resource nor a resource group.
    #[error("resource group '{0}' does not exist")]
    GroupNotFound(String),

    /// The resource (or every viable candidate) is marked down.
    #[error("resource '{0}' is down")]
    ResourceIsDown(String),

    /// No resource was specified and no default list is configured.
    #[error("no resource specified and no default resource configured")]
    NoResourceInput,

    /// Topology load or side-table query failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
