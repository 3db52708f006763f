//! Strata - replica resolution and resource selection for a distributed
//! storage federation.
//!
//! This library implements the in-memory decision engine that sits between a
//! metadata catalog and the data-movement layer: given the catalog's view of
//! a logical object's replicas and the available storage resources, it
//! decides which replica satisfies a read, which replicas must be created or
//! overwritten for a write, replicate, or physical move, which replicas are
//! redundant and may be trimmed, and which resource should host new data.
//!
//! The catalog itself is an external collaborator reached through the
//! [`catalog::CatalogQuery`] trait; this crate never mutates catalog state
//! and never commits or rolls back on the caller's behalf.

pub mod catalog;
pub mod classify;
pub mod conditions;
pub mod config;
pub mod reconcile;
pub mod replica;
pub mod resources;
pub mod select;
