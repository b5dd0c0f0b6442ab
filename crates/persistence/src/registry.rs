//! Entity model registry and audit-table derivation.
//!
//! Every entity type is registered once at startup. Registration validates the
//! declaration and, for audited entities, derives the companion
//! `<table>_audit_log` table. [`EntityRegistry::install`] then creates the
//! derived tables idempotently.

use sqlx::PgPool;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info};

use shared::validation::is_sql_identifier;

use crate::entities::{
    CircuitEntity, DeviceEntity, InterfaceEntity, IpAddressEntity, SiteEntity, UserEntity,
};
use crate::entity::{Entity, PrimaryKey, Relation};

/// Suffix appended to an entity table name to name its audit table.
pub const AUDIT_TABLE_SUFFIX: &str = "_audit_log";

/// Table holding the actors referenced by audit rows.
pub const ACTOR_TABLE: &str = "users";

const SUPPORTED_KEY_TYPES: &[&str] = &["uuid", "bigint", "integer"];

/// Foreign keys on the given tables whose delete action rewrites or removes
/// the referencing row.
const UNAUDITED_ACTIONS_SQL: &str = r#"
    SELECT conrelid::regclass::text, conname::text
    FROM pg_constraint
    WHERE contype = 'f'
      AND confdeltype IN ('c', 'n', 'd')
      AND conrelid::regclass::text = ANY($1)
    ORDER BY 1, 2
"#;

/// Advisory lock key serializing audit-table installation across processes.
const INSTALL_LOCK_KEY: i64 = 0x6e65_7469_6e76;

/// Errors raised while registering or installing entity declarations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{entity}: '{name}' is not a valid SQL identifier")]
    InvalidIdentifier { entity: &'static str, name: String },

    #[error("{entity}: primary key type '{sql_type}' is not supported")]
    UnsupportedPrimaryKey {
        entity: &'static str,
        sql_type: &'static str,
    },

    #[error("{entity}: primary key '{column}' is not one of its columns")]
    PrimaryKeyNotAColumn {
        entity: &'static str,
        column: &'static str,
    },

    #[error("{entity}: column '{column}' is not declared")]
    UnknownColumn {
        entity: &'static str,
        column: &'static str,
    },

    #[error("{entity}: relation '{name}' clashes with a column or another relation")]
    DuplicateRelation {
        entity: &'static str,
        name: &'static str,
    },

    #[error("Table '{0}' is already registered")]
    DuplicateTable(&'static str),

    #[error("{table}: foreign key '{constraint}' deletes or rewrites audited rows behind the repository")]
    UnauditedReferentialAction { table: String, constraint: String },

    #[error("Failed to install audit table: {0}")]
    Install(#[from] sqlx::Error),
}

/// Companion audit table derived from an audited entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTable {
    name: String,
    parent_table: &'static str,
    primary_key: PrimaryKey,
}

impl AuditTable {
    /// Derives the audit table for `E` after validating its declaration.
    pub fn derive<E: Entity>() -> Result<Self, RegistryError> {
        validate::<E>()?;
        Ok(Self::from_parts(E::TABLE, E::PRIMARY_KEY))
    }

    fn from_parts(parent_table: &'static str, primary_key: PrimaryKey) -> Self {
        Self {
            name: Self::name_for(parent_table),
            parent_table,
            primary_key,
        }
    }

    /// Audit table name for an entity table.
    pub fn name_for(table: &str) -> String {
        format!("{}{}", table, AUDIT_TABLE_SUFFIX)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_table(&self) -> &'static str {
        self.parent_table
    }

    /// DDL creating the table and its lookup index. Every statement is
    /// idempotent.
    pub fn create_statements(&self) -> Vec<String> {
        let table = &self.name;
        let parent = self.parent_table;
        let pk = self.primary_key.column;
        let pk_type = self.primary_key.sql_type;

        vec![
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id BIGSERIAL PRIMARY KEY,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                    request_id TEXT NOT NULL,
                    action TEXT NOT NULL CHECK (action IN ('create', 'update', 'delete')),
                    diff JSONB,
                    snapshot JSONB,
                    entity_id {pk_type} NOT NULL,
                    parent_id {pk_type} REFERENCES {parent} ({pk}) ON DELETE SET NULL,
                    user_id UUID REFERENCES {ACTOR_TABLE} (id) ON DELETE SET NULL
                )
                "#
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_entity ON {table} (entity_id, created_at DESC, id DESC)"
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_{table}_user ON {table} (user_id)"),
        ]
    }
}

/// What the registry knows about one entity type.
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub name: &'static str,
    pub table: &'static str,
    pub relations: &'static [Relation],
    pub audit: Option<AuditTable>,
}

/// All entity types known to the process.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<&'static str, EntityDescriptor>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `E` and records it, deriving its audit table when audited.
    pub fn register<E: Entity>(&mut self) -> Result<&mut Self, RegistryError> {
        if self.entities.contains_key(E::TABLE) {
            return Err(RegistryError::DuplicateTable(E::TABLE));
        }

        validate::<E>()?;
        let audit = E::AUDITED.then(|| AuditTable::from_parts(E::TABLE, E::PRIMARY_KEY));

        self.entities.insert(
            E::TABLE,
            EntityDescriptor {
                name: E::NAME,
                table: E::TABLE,
                relations: E::RELATIONS,
                audit,
            },
        );
        Ok(self)
    }

    pub fn get(&self, table: &str) -> Option<&EntityDescriptor> {
        self.entities.get(table)
    }

    pub fn is_audited(&self, table: &str) -> bool {
        self.get(table).map_or(false, |d| d.audit.is_some())
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.entities.values()
    }

    pub fn audit_tables(&self) -> impl Iterator<Item = &AuditTable> {
        self.entities.values().filter_map(|d| d.audit.as_ref())
    }

    /// Tables of the audited entities.
    pub fn audited_tables(&self) -> Vec<String> {
        self.entities
            .values()
            .filter(|d| d.audit.is_some())
            .map(|d| d.table.to_string())
            .collect()
    }

    /// Creates every derived audit table that does not exist yet.
    ///
    /// Fails when a foreign key on an audited table has any delete action other
    /// than RESTRICT or NO ACTION, since the database would then change audited
    /// rows without an audit record.
    pub async fn install(&self, pool: &PgPool) -> Result<(), RegistryError> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(INSTALL_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        for audit in self.audit_tables() {
            for statement in audit.create_statements() {
                sqlx::query(&statement).execute(&mut *tx).await?;
            }
            info!(table = %audit.name(), parent = %audit.parent_table(), "Audit table ready");
        }

        let offending: Vec<(String, String)> = sqlx::query_as(UNAUDITED_ACTIONS_SQL)
            .bind(self.audited_tables())
            .fetch_all(&mut *tx)
            .await?;
        if let Some((table, constraint)) = offending.into_iter().next() {
            error!(table = %table, constraint = %constraint, "Referential action bypasses the audit trail");
            return Err(RegistryError::UnauditedReferentialAction { table, constraint });
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Registers every inventory entity.
pub fn default_registry() -> Result<EntityRegistry, RegistryError> {
    let mut registry = EntityRegistry::new();
    registry
        .register::<UserEntity>()?
        .register::<SiteEntity>()?
        .register::<DeviceEntity>()?
        .register::<InterfaceEntity>()?
        .register::<CircuitEntity>()?
        .register::<IpAddressEntity>()?;
    Ok(registry)
}

fn validate<E: Entity>() -> Result<(), RegistryError> {
    let entity = E::NAME;

    check_identifier(entity, E::TABLE)?;
    check_identifier(entity, &AuditTable::name_for(E::TABLE))?;
    for column in E::COLUMNS {
        check_identifier(entity, column)?;
    }

    let pk = E::PRIMARY_KEY;
    if !SUPPORTED_KEY_TYPES.contains(&pk.sql_type) {
        return Err(RegistryError::UnsupportedPrimaryKey {
            entity,
            sql_type: pk.sql_type,
        });
    }
    if !E::COLUMNS.contains(&pk.column) {
        return Err(RegistryError::PrimaryKeyNotAColumn {
            entity,
            column: pk.column,
        });
    }

    let mut managed = E::READ_ONLY.to_vec();
    managed.extend(E::TOUCH_COLUMN);
    for column in managed {
        if !E::COLUMNS.contains(&column) {
            return Err(RegistryError::UnknownColumn { entity, column });
        }
    }

    let mut names: Vec<&str> = Vec::new();
    for relation in E::RELATIONS {
        let name = relation.name();
        check_identifier(entity, name)?;
        check_identifier(entity, relation.target())?;
        match *relation {
            Relation::BelongsTo { column, .. } => {
                if !E::COLUMNS.contains(&column) {
                    return Err(RegistryError::UnknownColumn { entity, column });
                }
            }
            Relation::HasMany { foreign_column, .. } => check_identifier(entity, foreign_column)?,
        }
        if E::COLUMNS.contains(&name) || names.contains(&name) {
            return Err(RegistryError::DuplicateRelation { entity, name });
        }
        names.push(name);
    }

    Ok(())
}

fn check_identifier(entity: &'static str, name: &str) -> Result<(), RegistryError> {
    if is_sql_identifier(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidIdentifier {
            entity,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use sqlx::FromRow;

    #[derive(Debug, Clone, Serialize, FromRow)]
    struct Widget {
        id: i64,
        label: String,
    }

    impl Entity for Widget {
        type Id = i64;
        const NAME: &'static str = "Widget";
        const TABLE: &'static str = "widgets";
        const COLUMNS: &'static [&'static str] = &["id", "label"];
        const PRIMARY_KEY: PrimaryKey = PrimaryKey::bigint("id");
        const READ_ONLY: &'static [&'static str] = &["id"];
        const TOUCH_COLUMN: Option<&'static str> = None;
        const AUDITED: bool = true;
        const ORDER_BY: &'static str = "id DESC";

        fn id(&self) -> i64 {
            self.id
        }
    }

    #[derive(Debug, Clone, Serialize, FromRow)]
    struct TextKeyed {
        code: String,
    }

    impl Entity for TextKeyed {
        type Id = i64;
        const NAME: &'static str = "TextKeyed";
        const TABLE: &'static str = "text_keyed";
        const COLUMNS: &'static [&'static str] = &["code"];
        const PRIMARY_KEY: PrimaryKey = PrimaryKey {
            column: "code",
            sql_type: "text",
        };
        const READ_ONLY: &'static [&'static str] = &[];
        const TOUCH_COLUMN: Option<&'static str> = None;

        fn id(&self) -> i64 {
            0
        }
    }

    #[derive(Debug, Clone, Serialize, FromRow)]
    struct MissingKey {
        name: String,
    }

    impl Entity for MissingKey {
        type Id = i64;
        const NAME: &'static str = "MissingKey";
        const TABLE: &'static str = "missing_key";
        const COLUMNS: &'static [&'static str] = &["name"];
        const READ_ONLY: &'static [&'static str] = &[];
        const TOUCH_COLUMN: Option<&'static str> = None;

        fn id(&self) -> i64 {
            0
        }
    }

    #[derive(Debug, Clone, Serialize, FromRow)]
    struct BadName {
        id: i64,
    }

    impl Entity for BadName {
        type Id = i64;
        const NAME: &'static str = "BadName";
        const TABLE: &'static str = "bad; DROP TABLE users";
        const COLUMNS: &'static [&'static str] = &["id"];
        const PRIMARY_KEY: PrimaryKey = PrimaryKey::bigint("id");
        const READ_ONLY: &'static [&'static str] = &["id"];
        const TOUCH_COLUMN: Option<&'static str> = None;

        fn id(&self) -> i64 {
            self.id
        }
    }

    #[test]
    fn test_derives_audit_table_from_entity() {
        let audit = AuditTable::derive::<Widget>().unwrap();
        assert_eq!(audit.name(), "widgets_audit_log");
        assert_eq!(audit.parent_table(), "widgets");

        let statements = audit.create_statements();
        let ddl = &statements[0];
        assert!(ddl.contains("CREATE TABLE IF NOT EXISTS widgets_audit_log"));
        assert!(ddl.contains("entity_id bigint NOT NULL"));
        assert!(ddl.contains("parent_id bigint REFERENCES widgets (id) ON DELETE SET NULL"));
        assert!(ddl.contains("user_id UUID REFERENCES users (id) ON DELETE SET NULL"));
        assert!(statements.iter().all(|s| s.contains("IF NOT EXISTS")));
    }

    #[test]
    fn test_rejects_unsupported_primary_key() {
        let err = AuditTable::derive::<TextKeyed>().unwrap_err();
        assert!(matches!(err, RegistryError::UnsupportedPrimaryKey { sql_type: "text", .. }));
    }

    #[test]
    fn test_rejects_primary_key_outside_columns() {
        let err = EntityRegistry::new().register::<MissingKey>().unwrap_err();
        assert!(matches!(err, RegistryError::PrimaryKeyNotAColumn { column: "id", .. }));
    }

    #[test]
    fn test_rejects_invalid_identifiers() {
        let err = EntityRegistry::new().register::<BadName>().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_rejects_duplicate_registration() {
        let mut registry = EntityRegistry::new();
        registry.register::<Widget>().unwrap();
        let err = registry.register::<Widget>().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTable("widgets")));
    }

    #[test]
    fn test_default_registry_audits_every_inventory_entity() {
        let registry = default_registry().unwrap();
        let mut tables: Vec<&str> = registry.audit_tables().map(|a| a.name()).collect();
        tables.sort_unstable();

        assert_eq!(
            tables,
            vec![
                "circuits_audit_log",
                "devices_audit_log",
                "interfaces_audit_log",
                "ip_addresses_audit_log",
                "sites_audit_log",
                "users_audit_log",
            ]
        );
        assert_eq!(registry.entities().count(), 6);
        assert_eq!(registry.audited_tables().len(), 6);
        assert!(registry.is_audited("devices"));
        assert_eq!(registry.get("devices").map(|d| d.name), Some("Device"));
    }
}
