use thiserror::Error;

use crate::catalog::CatalogError;

/// Failure taxonomy shared by the four resolution policies.
#[derive(Debug, Error)]
pub enum SelectError {
    /// No replica sits at the requested hierarchy.
    #[error("no replica matches hierarchy '{0}'")]
    HierarchyNotFound(String),

    /// A condition was given but no replica satisfies it.
    #[error("no source copy satisfies the given conditions")]
    NoSourceCopy,

    /// Every viable destination is unavailable.
    #[error("resource '{0}' is down")]
    ResourceIsDown(String),

    /// The requested mutation is a no-op: the data is already where it was
    /// asked to go.
    #[error("a copy is already present on the destination")]
    CopyAlreadyPresent,

    /// The caller omitted the hierarchy condition an open requires.
    #[error("an exact hierarchy condition is required")]
    MissingHierarchy,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
