//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::FromRow;
use uuid::Uuid;

use crate::entity::{Entity, Relation};

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeviceEntity {
    pub id: Uuid,
    pub name: String,
    pub site_id: Uuid,
    pub role: String,
    pub platform: Option<String>,
    pub serial: Option<String>,
    pub status: String,
    pub management_ip: Option<IpNetwork>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for DeviceEntity {
    type Id = Uuid;

    const NAME: &'static str = "Device";
    const TABLE: &'static str = "devices";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "site_id",
        "role",
        "platform",
        "serial",
        "status",
        "management_ip",
        "created_at",
        "updated_at",
    ];
    const RELATIONS: &'static [Relation] = &[
        Relation::BelongsTo {
            name: "site",
            column: "site_id",
            target: "sites",
        },
        Relation::HasMany {
            name: "interfaces",
            target: "interfaces",
            foreign_column: "device_id",
        },
    ];
    const AUDITED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }
}
