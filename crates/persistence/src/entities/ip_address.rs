//! IP address entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::FromRow;
use uuid::Uuid;

use crate::entity::{Entity, Relation};

/// Database row mapping for the ip_addresses table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IpAddressEntity {
    pub id: Uuid,
    pub address: IpNetwork,
    pub interface_id: Option<Uuid>,
    pub status: String,
    pub dns_name: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for IpAddressEntity {
    type Id = Uuid;

    const NAME: &'static str = "IP address";
    const TABLE: &'static str = "ip_addresses";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "address",
        "interface_id",
        "status",
        "dns_name",
        "description",
        "created_at",
        "updated_at",
    ];
    const RELATIONS: &'static [Relation] = &[Relation::BelongsTo {
        name: "interface",
        column: "interface_id",
        target: "interfaces",
    }];
    const AUDITED: bool = true;
    const ORDER_BY: &'static str = "address ASC, id ASC";

    fn id(&self) -> Uuid {
        self.id
    }
}
