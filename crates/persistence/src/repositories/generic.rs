//! Generic repository.
//!
//! One implementation of create/read/update/delete/list for every
//! [`Entity`]. Each mutation runs in a single transaction that also writes the
//! audit row, so the entity table and its audit table never diverge.
//!
//! Payloads are serialized to a JSON object, reduced to the entity's writable
//! columns and written through `jsonb_populate_record`, which lets PostgreSQL
//! convert each value to its column type.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Row, Transaction};
use std::marker::PhantomData;
use tracing::debug;

use domain::models::{AuditAction, AuditRecord, QueryShape};
use domain::services::diff::diff_values;
use shared::pagination::PageRequest;

use super::audit_log::{self, AuditLogRepository};
use super::filter::{bind_filter_values, FilterBuilder};
use crate::entity::{Entity, Loaded, Relation};
use crate::error::RepositoryError;
use crate::metrics::{record_audit_written, QueryTimer};

/// Alias of the entity table in generated SELECTs.
const ALIAS: &str = "t";

/// Data access for entity `E`, created from `C`, updated from `U` and listed
/// with `Q`.
pub struct Repository<E, C = (), U = (), Q = ()> {
    pool: PgPool,
    _shape: PhantomData<fn() -> (E, C, U, Q)>,
}

impl<E, C, U, Q> Clone for Repository<E, C, U, Q> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _shape: PhantomData,
        }
    }
}

impl<E, C, U, Q> Repository<E, C, U, Q>
where
    E: Entity,
    C: Serialize + Sync,
    U: Serialize + Sync,
    Q: QueryShape + Sync,
{
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _shape: PhantomData,
        }
    }

    /// Inserts a row built from `payload` and records its creation.
    pub async fn create(&self, payload: &C) -> Result<E, RepositoryError> {
        self.create_deferred(payload).await?.commit().await
    }

    /// Inserts a row but leaves the transaction open.
    ///
    /// The returned [`PendingCreate`] can write further columns before
    /// [`PendingCreate::commit`] records the creation once and commits.
    pub async fn create_deferred(&self, payload: &C) -> Result<PendingCreate<E>, RepositoryError> {
        let values = writable_values::<E>(payload)?;
        let mut tx = self.pool.begin().await?;

        let sql = insert_sql::<E>(&values);
        let timer = QueryTimer::new(format!("{}.insert", E::TABLE));
        let query = sqlx::query_as::<_, E>(&sql);
        let query = if values.is_empty() {
            query
        } else {
            query.bind(JsonValue::Object(values))
        };
        let entity = query.fetch_one(&mut *tx).await?;
        timer.record();

        Ok(PendingCreate { tx, entity })
    }

    /// Applies the fields present in `payload` to `existing`.
    pub async fn update(&self, existing: &E, payload: &U) -> Result<E, RepositoryError> {
        self.update_by_id(existing.id(), payload).await
    }

    /// Applies the fields present in `payload` to the row `id`.
    ///
    /// Absent fields are untouched and explicit nulls clear the column. When
    /// nothing changes the transaction is rolled back and no audit row is
    /// written.
    pub async fn update_by_id(&self, id: E::Id, payload: &U) -> Result<E, RepositoryError> {
        let values = writable_values::<E>(payload)?;
        let mut tx = self.pool.begin().await?;

        let before = lock_row::<E>(&mut tx, id).await?;
        if values.is_empty() {
            tx.rollback().await?;
            return Ok(before);
        }

        let timer = QueryTimer::new(format!("{}.update", E::TABLE));
        let after = sqlx::query_as::<_, E>(&update_sql::<E>(&values))
            .bind(JsonValue::Object(values))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        timer.record();

        let diff = diff_values(&before, &after, &E::tracked_columns())
            .map_err(RepositoryError::audit)?;
        if diff.is_empty() {
            debug!(table = E::TABLE, id = %id, "Update changed nothing");
            tx.rollback().await?;
            return Ok(before);
        }

        let after = match E::TOUCH_COLUMN {
            Some(touch) => touch_row::<E>(&mut tx, id, touch).await?,
            None => after,
        };

        if E::AUDITED {
            audit_log::record_update(&mut tx, &after, &diff).await?;
        }
        tx.commit().await?;
        if E::AUDITED {
            record_audit_written(E::TABLE, AuditAction::Update.as_str());
        }

        Ok(after)
    }

    /// Deletes `existing`, recording its final state first.
    pub async fn delete(&self, existing: &E) -> Result<(), RepositoryError> {
        self.delete_by_id(existing.id()).await
    }

    /// Deletes the row `id`.
    ///
    /// Fails with [`RepositoryError::ReferentialConflict`] when a restricting
    /// relation still points at the row; nothing is removed or recorded then.
    pub async fn delete_by_id(&self, id: E::Id) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = lock_row::<E>(&mut tx, id).await?;
        if E::AUDITED {
            audit_log::record_delete(&mut tx, &row).await?;
        }

        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            E::TABLE,
            E::PRIMARY_KEY.column
        );
        let timer = QueryTimer::new(format!("{}.delete", E::TABLE));
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::from_delete(e, E::NAME))?;
        timer.record();

        tx.commit().await?;
        if E::AUDITED {
            record_audit_written(E::TABLE, AuditAction::Delete.as_str());
        }

        Ok(())
    }

    /// Find a row by primary key.
    pub async fn find_by_id(&self, id: E::Id) -> Result<Option<E>, RepositoryError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1",
            E::TABLE,
            E::PRIMARY_KEY.column
        );
        let timer = QueryTimer::new(format!("{}.find", E::TABLE));
        let entity = sqlx::query_as::<_, E>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();
        Ok(entity)
    }

    /// Fetches the row `id` with the named relations in one statement.
    pub async fn get_one_or_fail(
        &self,
        id: E::Id,
        relations: &[&str],
    ) -> Result<Loaded<E>, RepositoryError> {
        let relations = resolve_relations::<E>(relations)?;
        let sql = format!(
            "{} WHERE {}.{} = $1",
            select_clause::<E>(&relations),
            ALIAS,
            E::PRIMARY_KEY.column
        );

        let timer = QueryTimer::new(format!("{}.get", E::TABLE));
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        timer.record();

        match row {
            Some(row) => load_row::<E>(&row, &relations),
            None => Err(not_found::<E>(id)),
        }
    }

    /// Counts the rows matching `query` and returns the requested page.
    ///
    /// Both statements are built from the same predicate and bind values.
    pub async fn list_and_count(
        &self,
        query: &Q,
        relations: &[&str],
    ) -> Result<(i64, Vec<Loaded<E>>), RepositoryError> {
        let relations = resolve_relations::<E>(relations)?;
        let filter = FilterBuilder::build::<E>(&query.filters(), ALIAS, 0)?;
        let where_clause = filter.where_clause();
        let page = query.page_request();

        let count_sql = format!(
            "SELECT COUNT(*) FROM {} {} WHERE {}",
            E::TABLE,
            ALIAS,
            where_clause
        );
        let timer = QueryTimer::new(format!("{}.count", E::TABLE));
        let count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let total = bind_filter_values!(count_query, filter.values())
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        let list_sql = format!(
            "{} WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            select_clause::<E>(&relations),
            where_clause,
            E::ORDER_BY,
            filter.param_count() + 1,
            filter.param_count() + 2
        );
        let timer = QueryTimer::new(format!("{}.list", E::TABLE));
        let list_query = sqlx::query(&list_sql);
        let rows = bind_filter_values!(list_query, filter.values())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        let items = rows
            .iter()
            .map(|row| load_row::<E>(row, &relations))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, items))
    }

    /// Reads the audit trail of the row `id`, newest first.
    pub async fn get_audit_log(
        &self,
        id: E::Id,
        page: &PageRequest,
    ) -> Result<(i64, Vec<AuditRecord>), RepositoryError> {
        if !E::AUDITED {
            return Err(RepositoryError::InvalidPayload(format!(
                "{} has no audit trail",
                E::NAME
            )));
        }
        AuditLogRepository::<E>::new(self.pool.clone())
            .list_for_entity(id, page)
            .await
    }
}

/// A created row whose transaction is still open.
///
/// Dropping it without calling [`PendingCreate::commit`] rolls the insert back.
pub struct PendingCreate<E> {
    tx: Transaction<'static, Postgres>,
    entity: E,
}

impl<E: Entity> PendingCreate<E> {
    /// The row as currently written inside the transaction.
    pub fn entity(&self) -> &E {
        &self.entity
    }

    /// Writes further columns without recording an audit row.
    pub async fn assign<P: Serialize + Sync>(&mut self, payload: &P) -> Result<&E, RepositoryError> {
        let values = writable_values::<E>(payload)?;
        if values.is_empty() {
            return Ok(&self.entity);
        }

        self.entity = sqlx::query_as::<_, E>(&update_sql::<E>(&values))
            .bind(JsonValue::Object(values))
            .bind(self.entity.id())
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(&self.entity)
    }

    /// Reads the row `id` of `R` inside this transaction and holds a share lock
    /// on it until commit, so columns derived from it cannot go stale.
    pub async fn lock_shared<R: Entity>(&mut self, id: R::Id) -> Result<R, RepositoryError> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = $1 FOR SHARE",
            R::TABLE,
            R::PRIMARY_KEY.column
        );
        let timer = QueryTimer::new(format!("{}.lock_shared", R::TABLE));
        let row = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        timer.record();
        row.ok_or_else(|| not_found::<R>(id))
    }

    /// Records the creation with the final column values and commits.
    pub async fn commit(mut self) -> Result<E, RepositoryError> {
        if E::AUDITED {
            audit_log::record_create(&mut self.tx, &self.entity).await?;
        }
        self.tx.commit().await?;
        if E::AUDITED {
            record_audit_written(E::TABLE, AuditAction::Create.as_str());
        }
        Ok(self.entity)
    }

    /// Discards the insert and everything assigned since.
    pub async fn rollback(self) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Serializes `payload` and keeps the keys naming writable columns.
fn writable_values<E: Entity>(
    payload: &impl Serialize,
) -> Result<Map<String, JsonValue>, RepositoryError> {
    let value = serde_json::to_value(payload)
        .map_err(|e| RepositoryError::InvalidPayload(e.to_string()))?;
    let JsonValue::Object(mut values) = value else {
        return Err(RepositoryError::InvalidPayload(format!(
            "{} payload must be an object",
            E::NAME
        )));
    };

    let writable = E::writable_columns();
    values.retain(|key, _| writable.contains(&key.as_str()));
    Ok(values)
}

fn insert_sql<E: Entity>(values: &Map<String, JsonValue>) -> String {
    if values.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES RETURNING *", E::TABLE);
    }

    let columns = values.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!(
        "INSERT INTO {table} ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) RETURNING *",
        table = E::TABLE,
        columns = columns
    )
}

fn update_sql<E: Entity>(values: &Map<String, JsonValue>) -> String {
    let assignments = values
        .keys()
        .map(|c| format!("{c} = p.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {table} SET {assignments} FROM jsonb_populate_record(NULL::{table}, $1) AS p WHERE {table}.{pk} = $2 RETURNING {table}.*",
        table = E::TABLE,
        assignments = assignments,
        pk = E::PRIMARY_KEY.column
    )
}

fn select_clause<E: Entity>(relations: &[&'static Relation]) -> String {
    let mut columns = vec![format!("{}.*", ALIAS)];
    columns.extend(
        relations
            .iter()
            .map(|r| r.select_sql(ALIAS, E::PRIMARY_KEY.column)),
    );
    format!("SELECT {} FROM {} {}", columns.join(", "), E::TABLE, ALIAS)
}

fn resolve_relations<E: Entity>(names: &[&str]) -> Result<Vec<&'static Relation>, RepositoryError> {
    let mut resolved: Vec<&'static Relation> = Vec::with_capacity(names.len());
    for name in names {
        let relation = E::relation(name).ok_or_else(|| RepositoryError::UnknownRelation {
            entity: E::NAME,
            relation: name.to_string(),
        })?;
        if !resolved.contains(&relation) {
            resolved.push(relation);
        }
    }
    Ok(resolved)
}

fn load_row<E: Entity>(row: &PgRow, relations: &[&'static Relation]) -> Result<Loaded<E>, RepositoryError> {
    let mut loaded = Loaded::new(E::from_row(row)?);
    for relation in relations {
        let value: Option<JsonValue> = row.try_get(relation.name())?;
        loaded
            .related
            .insert(relation.name().to_string(), value.unwrap_or(JsonValue::Null));
    }
    Ok(loaded)
}

/// Loads the pre-image of `id` and locks it for the rest of the transaction.
async fn lock_row<E: Entity>(conn: &mut PgConnection, id: E::Id) -> Result<E, RepositoryError> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = $1 FOR UPDATE",
        E::TABLE,
        E::PRIMARY_KEY.column
    );
    sqlx::query_as::<_, E>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| not_found::<E>(id))
}

async fn touch_row<E: Entity>(
    conn: &mut PgConnection,
    id: E::Id,
    column: &str,
) -> Result<E, RepositoryError> {
    let sql = format!(
        "UPDATE {} SET {} = now() WHERE {} = $1 RETURNING *",
        E::TABLE,
        column,
        E::PRIMARY_KEY.column
    );
    Ok(sqlx::query_as::<_, E>(&sql).bind(id).fetch_one(conn).await?)
}

fn not_found<E: Entity>(id: E::Id) -> RepositoryError {
    RepositoryError::NotFound(format!("{} {} not found", E::NAME, id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DeviceEntity, SiteEntity};
    use domain::models::{CreateDevice, DeviceStatus, UpdateDevice};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_writable_values_drop_unknown_and_read_only_keys() {
        let payload = json!({
            "id": Uuid::new_v4(),
            "name": "edge-01",
            "created_at": "2024-01-01T00:00:00Z",
            "owner": "someone",
            "serial": null
        });

        let values = writable_values::<DeviceEntity>(&payload).unwrap();
        let keys: Vec<&str> = values.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "serial"]);
        assert!(values["serial"].is_null());
    }

    #[test]
    fn test_writable_values_reject_non_objects() {
        let err = writable_values::<DeviceEntity>(&vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidPayload(_)));
    }

    #[test]
    fn test_partial_update_only_writes_present_fields() {
        let update: UpdateDevice =
            serde_json::from_str(r#"{"status": "offline", "platform": null}"#).unwrap();
        let values = writable_values::<DeviceEntity>(&update).unwrap();

        assert_eq!(
            update_sql::<DeviceEntity>(&values),
            "UPDATE devices SET platform = p.platform, status = p.status \
             FROM jsonb_populate_record(NULL::devices, $1) AS p \
             WHERE devices.id = $2 RETURNING devices.*"
        );
    }

    #[test]
    fn test_insert_sql_lists_payload_columns() {
        let create = CreateDevice {
            name: "edge-01".to_string(),
            site_id: Uuid::new_v4(),
            role: "edge".to_string(),
            platform: None,
            serial: None,
            status: DeviceStatus::Planned,
            management_ip: None,
        };
        let values = writable_values::<DeviceEntity>(&create).unwrap();
        assert_eq!(
            insert_sql::<DeviceEntity>(&values),
            "INSERT INTO devices (management_ip, name, platform, role, serial, site_id, status) \
             SELECT management_ip, name, platform, role, serial, site_id, status \
             FROM jsonb_populate_record(NULL::devices, $1) RETURNING *"
        );
    }

    #[test]
    fn test_insert_sql_without_columns_uses_defaults() {
        assert_eq!(
            insert_sql::<SiteEntity>(&Map::new()),
            "INSERT INTO sites DEFAULT VALUES RETURNING *"
        );
    }

    #[test]
    fn test_select_clause_with_relations() {
        let relations = resolve_relations::<DeviceEntity>(&["site", "interfaces", "site"]).unwrap();
        assert_eq!(relations.len(), 2);

        let sql = select_clause::<DeviceEntity>(&relations);
        assert!(sql.starts_with("SELECT t.*, (SELECT to_jsonb(r) FROM sites r WHERE r.id = t.site_id)"));
        assert!(sql.ends_with("FROM devices t"));
    }

    #[test]
    fn test_unknown_relation_is_rejected() {
        let err = resolve_relations::<DeviceEntity>(&["owner"]).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::UnknownRelation { entity: "Device", .. }
        ));
    }
}
