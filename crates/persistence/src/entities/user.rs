//! User entity (database row mapping).

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::entity::Entity;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserEntity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for UserEntity {
    type Id = Uuid;

    const NAME: &'static str = "User";
    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "username",
        "email",
        "display_name",
        "is_active",
        "created_at",
        "updated_at",
    ];
    const AUDITED: bool = true;
    const ORDER_BY: &'static str = "username ASC, id ASC";

    fn id(&self) -> Uuid {
        self.id
    }
}
