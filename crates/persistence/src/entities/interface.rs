//! Interface entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::entity::{Entity, Relation};

/// Database row mapping for the interfaces table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InterfaceEntity {
    pub id: Uuid,
    pub device_id: Uuid,
    pub name: String,
    pub kind: String,
    pub enabled: bool,
    pub mac_address: Option<String>,
    pub mtu: Option<i32>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for InterfaceEntity {
    type Id = Uuid;

    const NAME: &'static str = "Interface";
    const TABLE: &'static str = "interfaces";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "device_id",
        "name",
        "kind",
        "enabled",
        "mac_address",
        "mtu",
        "description",
        "created_at",
        "updated_at",
    ];
    const RELATIONS: &'static [Relation] = &[
        Relation::BelongsTo {
            name: "device",
            column: "device_id",
            target: "devices",
        },
        Relation::HasMany {
            name: "ip_addresses",
            target: "ip_addresses",
            foreign_column: "interface_id",
        },
    ];
    const AUDITED: bool = true;
    const ORDER_BY: &'static str = "device_id ASC, name ASC, id ASC";

    fn id(&self) -> Uuid {
        self.id
    }
}
