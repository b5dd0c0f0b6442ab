//! Audit trail domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use shared::pagination::PageRequest;

/// Column name → JSON value for one entity row.
pub type Snapshot = BTreeMap<String, JsonValue>;

/// Column name → before/after pair, only for columns that changed.
pub type Diff = BTreeMap<String, FieldChange>;

/// Kind of mutation an audit record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
        }
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(AuditAction::Create),
            "update" => Ok(AuditAction::Update),
            "delete" => Ok(AuditAction::Delete),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: JsonValue,
    pub after: JsonValue,
}

impl FieldChange {
    pub fn new(before: JsonValue, after: JsonValue) -> Self {
        Self { before, after }
    }
}

/// One immutable row of an entity's audit trail.
///
/// `parent_id` is the set-null foreign key to the audited row and becomes
/// `None` once that row is deleted; `entity_id` keeps the id regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub request_id: String,
    pub action: AuditAction,
    /// Changed columns, present for updates only.
    pub diff: Option<Diff>,
    /// Full column snapshot, present for creates and deletes.
    pub snapshot: Option<Snapshot>,
    pub user_id: Option<Uuid>,
    pub parent_id: Option<String>,
    pub entity_id: String,
}

/// Query parameters for reading an entity's audit trail.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListAuditLogQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListAuditLogQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_string_roundtrip() {
        for action in [AuditAction::Create, AuditAction::Update, AuditAction::Delete] {
            assert_eq!(action.to_string().parse::<AuditAction>().unwrap(), action);
        }
        assert!("purge".parse::<AuditAction>().is_err());
    }

    #[test]
    fn test_action_serializes_lowercase() {
        assert_eq!(serde_json::to_value(AuditAction::Update).unwrap(), json!("update"));
    }

    #[test]
    fn test_record_serialization_shape() {
        let mut diff = Diff::new();
        diff.insert("name".to_string(), FieldChange::new(json!("X"), json!("Y")));

        let record = AuditRecord {
            id: 2,
            created_at: Utc::now(),
            request_id: "req-9".to_string(),
            action: AuditAction::Update,
            diff: Some(diff),
            snapshot: None,
            user_id: None,
            parent_id: Some("b7d5...".to_string()),
            entity_id: "b7d5...".to_string(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["action"], "update");
        assert_eq!(value["diff"]["name"]["before"], "X");
        assert_eq!(value["diff"]["name"]["after"], "Y");
        assert!(value["user_id"].is_null());
    }

    #[test]
    fn test_list_query_page_request() {
        let query = ListAuditLogQuery {
            page: Some(2),
            per_page: Some(10),
        };
        assert_eq!(query.page_request().offset(), 10);
    }
}
