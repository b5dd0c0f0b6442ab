//! Domain layer for the network inventory backend.
//!
//! This crate contains:
//! - The per-request context carrier (actor, request id, locale)
//! - Audit trail models and the change-diff engine
//! - Query filter models and request shapes for inventory entities

pub mod context;
pub mod models;
pub mod services;
