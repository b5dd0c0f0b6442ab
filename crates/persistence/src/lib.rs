//! Persistence layer for the network inventory backend.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - The entity model registry and audit-table derivation
//! - Entity definitions (database row mappings)
//! - The generic repository and the audit trail store

pub mod db;
pub mod entities;
pub mod entity;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod repositories;

pub use entity::{Entity, Loaded, PrimaryKey, Relation};
pub use error::RepositoryError;
pub use registry::{default_registry, AuditTable, EntityRegistry, RegistryError};
