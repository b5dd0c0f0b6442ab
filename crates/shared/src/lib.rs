//! Shared utilities and common types for the network inventory backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Offset pagination (page/per_page normalization)
//! - Partial-update deserialization helpers
//! - SQL identifier and slug validation
//! - JWT access-token issuing and validation

pub mod jwt;
pub mod pagination;
pub mod patch;
pub mod validation;
