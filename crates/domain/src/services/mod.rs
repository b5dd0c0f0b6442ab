//! Domain services for the network inventory.
//!
//! Services contain logic that operates on domain models without touching
//! the database.

pub mod diff;

pub use diff::{compute_diff, diff_values, snapshot_of, DiffError};
