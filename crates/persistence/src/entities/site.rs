//! Site entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::entity::{Entity, Relation};

/// Database row mapping for the sites table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SiteEntity {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub region: Option<String>,
    pub facility: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for SiteEntity {
    type Id = Uuid;

    const NAME: &'static str = "Site";
    const TABLE: &'static str = "sites";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "slug",
        "status",
        "region",
        "facility",
        "description",
        "created_at",
        "updated_at",
    ];
    const RELATIONS: &'static [Relation] = &[Relation::HasMany {
        name: "devices",
        target: "devices",
        foreign_column: "site_id",
    }];
    const AUDITED: bool = true;
    const ORDER_BY: &'static str = "name ASC, id ASC";

    fn id(&self) -> Uuid {
        self.id
    }
}
