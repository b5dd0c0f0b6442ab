//! Entity declarations consumed by the generic repository.
//!
//! An entity is a row type plus a handful of associated constants describing
//! its table. Marking an entity audited is the single line
//! `const AUDITED: bool = true;`; the registry derives the audit table from the
//! rest of the declaration.

use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::{Encode, FromRow, Postgres, Type};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Primary key column and its PostgreSQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKey {
    pub column: &'static str,
    pub sql_type: &'static str,
}

impl PrimaryKey {
    pub const fn uuid(column: &'static str) -> Self {
        Self {
            column,
            sql_type: "uuid",
        }
    }

    pub const fn bigint(column: &'static str) -> Self {
        Self {
            column,
            sql_type: "bigint",
        }
    }
}

/// A preloadable relation to another table.
///
/// Targets are assumed to use `id` as their primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// This row holds `column` referencing one row of `target`.
    BelongsTo {
        name: &'static str,
        column: &'static str,
        target: &'static str,
    },
    /// Rows of `target` reference this row through `foreign_column`.
    HasMany {
        name: &'static str,
        target: &'static str,
        foreign_column: &'static str,
    },
}

impl Relation {
    pub fn name(&self) -> &'static str {
        match self {
            Relation::BelongsTo { name, .. } | Relation::HasMany { name, .. } => *name,
        }
    }

    pub fn target(&self) -> &'static str {
        match self {
            Relation::BelongsTo { target, .. } | Relation::HasMany { target, .. } => *target,
        }
    }

    /// Correlated sub-select producing this relation as one JSONB value.
    ///
    /// `alias` is the alias of the owning table in the outer query.
    pub fn select_sql(&self, alias: &str, primary_key: &str) -> String {
        match self {
            Relation::BelongsTo {
                name,
                column,
                target,
            } => format!(
                r#"(SELECT to_jsonb(r) FROM {target} r WHERE r.id = {alias}.{column}) AS "{name}""#
            ),
            Relation::HasMany {
                name,
                target,
                foreign_column,
            } => format!(
                r#"(SELECT COALESCE(jsonb_agg(to_jsonb(r) ORDER BY r.created_at, r.id), '[]'::jsonb) FROM {target} r WHERE r.{foreign_column} = {alias}.{primary_key}) AS "{name}""#
            ),
        }
    }
}

/// A persistent row type managed by [`crate::repositories::Repository`].
pub trait Entity:
    for<'r> FromRow<'r, PgRow> + Serialize + Clone + Send + Sync + Unpin + 'static
{
    /// Primary key value type.
    type Id: for<'q> Encode<'q, Postgres> + Type<Postgres> + Copy + Send + Sync + Display + 'static;

    /// Human-readable name used in error messages.
    const NAME: &'static str;

    const TABLE: &'static str;

    /// Every column of the table, primary key included.
    const COLUMNS: &'static [&'static str];

    const PRIMARY_KEY: PrimaryKey = PrimaryKey::uuid("id");

    /// Columns never written from payloads.
    const READ_ONLY: &'static [&'static str] = &["id", "created_at", "updated_at"];

    /// Column bumped to `now()` when an update changes something.
    /// It is excluded from diffs.
    const TOUCH_COLUMN: Option<&'static str> = Some("updated_at");

    const RELATIONS: &'static [Relation] = &[];

    /// Opt-in for the automatic audit trail.
    const AUDITED: bool = false;

    /// Total order used for listing; must end with a unique column.
    const ORDER_BY: &'static str = "created_at DESC, id DESC";

    fn id(&self) -> Self::Id;

    /// Columns accepted from create and update payloads.
    fn writable_columns() -> Vec<&'static str> {
        Self::COLUMNS
            .iter()
            .copied()
            .filter(|c| !Self::READ_ONLY.contains(c))
            .collect()
    }

    /// Columns compared by the diff engine.
    fn tracked_columns() -> Vec<&'static str> {
        Self::COLUMNS
            .iter()
            .copied()
            .filter(|c| Some(*c) != Self::TOUCH_COLUMN)
            .collect()
    }

    fn relation(name: &str) -> Option<&'static Relation> {
        Self::RELATIONS.iter().find(|r| r.name() == name)
    }
}

/// An entity together with the relations requested for it.
#[derive(Debug, Clone, Serialize)]
pub struct Loaded<E> {
    #[serde(flatten)]
    pub entity: E,

    #[serde(flatten)]
    pub related: BTreeMap<String, JsonValue>,
}

impl<E> Loaded<E> {
    pub fn new(entity: E) -> Self {
        Self {
            entity,
            related: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_belongs_to_sql() {
        let relation = Relation::BelongsTo {
            name: "site",
            column: "site_id",
            target: "sites",
        };
        assert_eq!(
            relation.select_sql("t", "id"),
            r#"(SELECT to_jsonb(r) FROM sites r WHERE r.id = t.site_id) AS "site""#
        );
    }

    #[test]
    fn test_has_many_sql_defaults_to_empty_array() {
        let relation = Relation::HasMany {
            name: "interfaces",
            target: "interfaces",
            foreign_column: "device_id",
        };
        let sql = relation.select_sql("t", "id");
        assert!(sql.contains("COALESCE(jsonb_agg("));
        assert!(sql.contains("'[]'::jsonb"));
        assert!(sql.contains("r.device_id = t.id"));
        assert!(sql.ends_with(r#"AS "interfaces""#));
    }

    #[test]
    fn test_loaded_flattens_relations() {
        #[derive(Clone, Serialize)]
        struct Row {
            id: u32,
            name: &'static str,
        }

        let mut loaded = Loaded::new(Row { id: 1, name: "edge" });
        loaded
            .related
            .insert("site".to_string(), serde_json::json!({"name": "ams-1"}));

        let value = serde_json::to_value(&loaded).unwrap();
        assert_eq!(value["name"], "edge");
        assert_eq!(value["site"]["name"], "ams-1");
    }
}
