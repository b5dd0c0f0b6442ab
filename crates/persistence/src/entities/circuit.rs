//! Circuit entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::entity::{Entity, Relation};

/// Database row mapping for the circuits table.
///
/// `device_id` and `site_id` are derived from `interface_id` when the circuit
/// is created.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CircuitEntity {
    pub id: Uuid,
    pub cid: String,
    pub provider: String,
    pub kind: String,
    pub status: String,
    pub commit_rate_kbps: Option<i64>,
    pub interface_id: Option<Uuid>,
    pub device_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for CircuitEntity {
    type Id = Uuid;

    const NAME: &'static str = "Circuit";
    const TABLE: &'static str = "circuits";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "cid",
        "provider",
        "kind",
        "status",
        "commit_rate_kbps",
        "interface_id",
        "device_id",
        "site_id",
        "description",
        "created_at",
        "updated_at",
    ];
    const RELATIONS: &'static [Relation] = &[
        Relation::BelongsTo {
            name: "interface",
            column: "interface_id",
            target: "interfaces",
        },
        Relation::BelongsTo {
            name: "device",
            column: "device_id",
            target: "devices",
        },
        Relation::BelongsTo {
            name: "site",
            column: "site_id",
            target: "sites",
        },
    ];
    const AUDITED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }
}
