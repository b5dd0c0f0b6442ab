//! Audit log entity (database row mapping).

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{AuditAction, AuditRecord};

/// Database row mapping shared by every `<table>_audit_log` table.
///
/// `entity_id` and `parent_id` are selected as text so one row type serves
/// tables with any supported primary key type.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub request_id: String,
    pub action: String,
    pub diff: Option<JsonValue>,
    pub snapshot: Option<JsonValue>,
    pub user_id: Option<Uuid>,
    pub parent_id: Option<String>,
    pub entity_id: String,
}

impl TryFrom<AuditLogEntity> for AuditRecord {
    type Error = String;

    fn try_from(entity: AuditLogEntity) -> Result<Self, Self::Error> {
        let action = entity.action.parse::<AuditAction>()?;
        let diff = entity
            .diff
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| format!("Malformed audit diff {}: {}", entity.id, e))?;
        let snapshot = entity
            .snapshot
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| format!("Malformed audit snapshot {}: {}", entity.id, e))?;

        Ok(AuditRecord {
            id: entity.id,
            created_at: entity.created_at,
            request_id: entity.request_id,
            action,
            diff,
            snapshot,
            user_id: entity.user_id,
            parent_id: entity.parent_id,
            entity_id: entity.entity_id,
        })
    }
}
