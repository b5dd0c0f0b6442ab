//! Change-diff engine.
//!
//! Rows are compared as JSON snapshots taken over an explicit column list.
//! The persistence layer captures the pre-image with `SELECT ... FOR UPDATE`
//! inside the mutating transaction, so the before value of every column is the
//! value loaded from the database, never an in-memory history.

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::models::audit_log::{Diff, FieldChange, Snapshot};

/// Errors raised while turning an entity into a snapshot.
#[derive(Debug, Error)]
pub enum DiffError {
    #[error("Failed to serialize entity: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Entity did not serialize to a JSON object")]
    NotAnObject,
}

/// Serializes `value` and keeps only `columns`.
///
/// Columns missing from the serialized form are recorded as `null` so that two
/// snapshots over the same column list always have the same keys. Nested
/// objects and arrays (preloaded relations) never appear because only the
/// listed scalar columns are copied.
pub fn snapshot_of<T: Serialize>(value: &T, columns: &[&str]) -> Result<Snapshot, DiffError> {
    let mut object = match serde_json::to_value(value)? {
        JsonValue::Object(map) => map,
        _ => return Err(DiffError::NotAnObject),
    };

    Ok(columns
        .iter()
        .map(|column| {
            let value = object.remove(*column).unwrap_or(JsonValue::Null);
            (column.to_string(), value)
        })
        .collect())
}

/// Computes the minimal diff between two snapshots.
///
/// Only the given columns are compared and only unequal pairs are emitted, so
/// an update that writes every column back to its current value yields an
/// empty diff.
pub fn compute_diff(before: &Snapshot, after: &Snapshot, columns: &[&str]) -> Diff {
    let mut diff = Diff::new();
    for column in columns {
        let old = before.get(*column).unwrap_or(&JsonValue::Null);
        let new = after.get(*column).unwrap_or(&JsonValue::Null);
        if old != new {
            diff.insert(column.to_string(), FieldChange::new(old.clone(), new.clone()));
        }
    }
    diff
}

/// Snapshots both values over `columns` and diffs them.
pub fn diff_values<T: Serialize>(before: &T, after: &T, columns: &[&str]) -> Result<Diff, DiffError> {
    let before = snapshot_of(before, columns)?;
    let after = snapshot_of(after, columns)?;
    Ok(compute_diff(&before, &after, columns))
}
