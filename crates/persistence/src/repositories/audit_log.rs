//! Audit trail store.
//!
//! Writes run on the caller's connection so they commit or roll back with the
//! mutation they describe. Actor and request id come from the ambient
//! [`domain::context`] at the moment of the write.

use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use std::marker::PhantomData;
use tracing::{debug, error};

use domain::context;
use domain::models::{AuditAction, AuditRecord, Diff};
use domain::services::diff::snapshot_of;
use shared::pagination::PageRequest;

use crate::entities::AuditLogEntity;
use crate::entity::Entity;
use crate::error::RepositoryError;
use crate::metrics::QueryTimer;
use crate::registry::AuditTable;

/// Records a `create` with the full column snapshot.
pub async fn record_create<E: Entity>(
    conn: &mut PgConnection,
    entity: &E,
) -> Result<(), RepositoryError> {
    let snapshot = full_snapshot(entity, AuditAction::Create)?;
    insert::<E>(conn, entity.id(), AuditAction::Create, None, Some(snapshot)).await
}

/// Records an `update` carrying `diff`.
///
/// Returns `false` without writing when the diff is empty.
pub async fn record_update<E: Entity>(
    conn: &mut PgConnection,
    entity: &E,
    diff: &Diff,
) -> Result<bool, RepositoryError> {
    if diff.is_empty() {
        return Ok(false);
    }
    let diff = serde_json::to_value(diff).map_err(|e| audit_failure::<E>(AuditAction::Update, e))?;
    insert::<E>(conn, entity.id(), AuditAction::Update, Some(diff), None).await?;
    Ok(true)
}

/// Records a `delete` with the full column snapshot.
///
/// Must run while the row still exists; the snapshot is taken from `entity`,
/// which the caller loaded inside the deleting transaction.
pub async fn record_delete<E: Entity>(
    conn: &mut PgConnection,
    entity: &E,
) -> Result<(), RepositoryError> {
    let snapshot = full_snapshot(entity, AuditAction::Delete)?;
    insert::<E>(conn, entity.id(), AuditAction::Delete, None, Some(snapshot)).await
}

fn full_snapshot<E: Entity>(entity: &E, action: AuditAction) -> Result<JsonValue, RepositoryError> {
    let snapshot = snapshot_of(entity, E::COLUMNS).map_err(|e| audit_failure::<E>(action, e))?;
    serde_json::to_value(snapshot).map_err(|e| audit_failure::<E>(action, e))
}

async fn insert<E: Entity>(
    conn: &mut PgConnection,
    id: E::Id,
    action: AuditAction,
    diff: Option<JsonValue>,
    snapshot: Option<JsonValue>,
) -> Result<(), RepositoryError> {
    let ctx = context::current();
    let sql = format!(
        r#"
        INSERT INTO {} (request_id, action, diff, snapshot, entity_id, parent_id, user_id)
        VALUES ($1, $2, $3, $4, $5, $5, $6)
        "#,
        AuditTable::name_for(E::TABLE)
    );

    let timer = QueryTimer::new("audit_insert");
    let result = sqlx::query(&sql)
        .bind(&ctx.request_id)
        .bind(action.as_str())
        .bind(diff)
        .bind(snapshot)
        .bind(id)
        .bind(ctx.actor_id)
        .execute(conn)
        .await;
    timer.record();

    match result {
        Ok(_) => {
            debug!(
                table = E::TABLE,
                entity_id = %id,
                action = %action,
                request_id = %ctx.request_id,
                user_id = ?ctx.actor_id,
                "Audit record written"
            );
            Ok(())
        }
        Err(e) => Err(audit_failure::<E>(action, e)),
    }
}

fn audit_failure<E: Entity>(action: AuditAction, err: impl std::fmt::Display) -> RepositoryError {
    error!(table = E::TABLE, action = %action, error = %err, "Audit write failed");
    RepositoryError::audit(err)
}

/// Read side of one entity's audit trail.
pub struct AuditLogRepository<E> {
    pool: PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for AuditLogRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> AuditLogRepository<E> {
    /// Create a new repository instance.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    /// Lists the audit trail of one entity, newest first.
    ///
    /// Records stay readable after the entity itself is deleted.
    pub async fn list_for_entity(
        &self,
        id: E::Id,
        page: &PageRequest,
    ) -> Result<(i64, Vec<AuditRecord>), RepositoryError> {
        let table = AuditTable::name_for(E::TABLE);

        let timer = QueryTimer::new("audit_count");
        let count_query = format!("SELECT COUNT(*) FROM {} WHERE entity_id = $1", table);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        timer.record();

        let list_query = format!(
            r#"
            SELECT id, created_at, request_id, action, diff, snapshot, user_id,
                   parent_id::text AS parent_id, entity_id::text AS entity_id
            FROM {}
            WHERE entity_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
            table
        );

        let timer = QueryTimer::new("audit_list");
        let entities = sqlx::query_as::<_, AuditLogEntity>(&list_query)
            .bind(id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        timer.record();

        let records = entities
            .into_iter()
            .map(AuditRecord::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::Database(sqlx::Error::Decode(e.into())))?;

        Ok((total, records))
    }
}
