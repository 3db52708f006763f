//! External catalog collaborator surface.
//!
//! The metadata catalog of record lives outside this crate. Everything the
//! resolution engine needs from it goes through the [`CatalogQuery`] trait:
//! replica rows for one logical object, the resource and resource-group
//! topology, and the load-sample side table used by load-based sorting.
//!
//! Queries are paginated: a page carries an opaque continuation token that
//! must be re-submitted until the catalog reports exhaustion. Registration,
//! modification, commit, and rollback of catalog state stay entirely with
//! the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by catalog queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport or backend failure; the query may be retried by the caller.
    #[error("catalog query failed: {0}")]
    QueryFailed(String),

    /// The query matched nothing. Expected and non-fatal.
    #[error("catalog query returned no rows")]
    NoRows,

    /// A column the engine relies on was absent from a result page. This is
    /// a contract violation between catalog and engine.
    #[error("expected column '{0}' missing from catalog result")]
    MissingColumn(&'static str),

    /// A row could not be decoded into its typed form.
    #[error("malformed catalog row: {0}")]
    BadRow(String),
}

/// Opaque pagination cursor returned by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(pub u64);

/// One page of a paginated query result.
#[derive(Debug)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// `Some` when more pages remain; re-submit to continue.
    pub next: Option<ContinuationToken>,
}

impl<T> Page<T> {
    pub fn last(rows: Vec<T>) -> Self {
        Self { rows, next: None }
    }
}

/// Access level a caller holds (or requests) on a logical object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    Read,
    Modify,
    Delete,
}

/// Identity and permission the replica query is evaluated under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPermission {
    pub user: String,
    pub zone: String,
    pub level: PermissionLevel,
}

impl AccessPermission {
    pub fn wants_write(&self) -> bool {
        matches!(self.level, PermissionLevel::Modify | PermissionLevel::Delete)
    }
}

/// Addressing for a replica query: by logical path or by data id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    Path(String),
    DataId(i64),
}

/// Typed replica query specification.
#[derive(Debug, Clone)]
pub struct ReplicaQuery {
    pub object: ObjectRef,
    pub access: Option<AccessPermission>,
    /// Restrict to one replica number.
    pub replica_number: Option<i32>,
    /// Restrict to one resource.
    pub resource_name: Option<String>,
}

impl ReplicaQuery {
    pub fn new(object: ObjectRef) -> Self {
        Self {
            object,
            access: None,
            replica_number: None,
            resource_name: None,
        }
    }
}

/// One catalog row describing one physical replica.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicaRow {
    pub data_id: i64,
    pub collection_id: i64,
    pub logical_path: String,
    pub replica_number: i32,
    pub version: String,
    pub data_type: String,
    pub size: i64,
    pub resource_group: String,
    pub resource_name: String,
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
}

/// One catalog row describing one registered resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRow {
    pub id: i64,
    pub name: String,
    pub zone: String,
    pub location: String,
    pub driver_type: String,
    pub class: String,
    pub vault_path: String,
    pub free_space: i64,
    pub comments: String,
    /// Raw status string; anything containing "down" marks the resource down.
    pub status: String,
}

/// One catalog row pairing a resource group with a member resource.
/// Rows arrive ordered by group name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub group_name: String,
    pub resource_name: String,
}

/// One entry of the load side table written by the monitoring service.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSample {
    pub resource_name: String,
    /// Load factor in percent; negative values are invalid and ignored.
    pub load_factor: i32,
    pub sampled_at: DateTime<Utc>,
}

/// Read-only query surface of the external catalog.
///
/// Implementations are expected to be side-effect free. A query that matches
/// nothing returns [`CatalogError::NoRows`] so callers can distinguish an
/// empty result from a transport failure.
pub trait CatalogQuery {
    /// Replica rows for one logical object, one page at a time.
    fn replica_rows(
        &self,
        query: &ReplicaQuery,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ReplicaRow>, CatalogError>;

    /// All registered resources, one page at a time.
    fn resource_rows(
        &self,
        token: Option<ContinuationToken>,
    ) -> Result<Page<ResourceRow>, CatalogError>;

    /// All resource-group memberships, ordered by group name.
    fn group_rows(&self) -> Result<Vec<GroupRow>, CatalogError>;

    /// Current load samples, one per reporting resource.
    fn load_samples(&self) -> Result<Vec<LoadSample>, CatalogError>;
}
