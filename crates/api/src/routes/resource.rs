//! CRUD handlers shared by every inventory collection.
//!
//! Each collection mounts the same handlers instantiated for its entity and
//! request shapes; all behavior lives in the generic repository.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, MethodRouter},
    Json, Router,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::Validate;

use domain::models::query::split_list;
use domain::models::{AuditRecord, ListAuditLogQuery, QueryShape};
use persistence::repositories::Repository;
use persistence::{Entity, Loaded};
use shared::pagination::Page;

use crate::app::AppState;
use crate::error::ApiError;

/// `?include=a,b` relation list accepted by the read endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludeQuery {
    pub include: Option<String>,
}

impl IncludeQuery {
    pub fn relations(&self) -> Vec<String> {
        split_list(self.include.as_deref()).unwrap_or_default()
    }
}

/// Audit trail page returned by `GET /<collection>/:id/audit-log`.
#[derive(Debug, Serialize)]
pub struct AuditLogResponse {
    pub count: i64,
    pub results: Vec<AuditRecord>,
}

/// Routes for one collection with the generic create handler.
pub fn routes<E, C, U, Q>() -> Router<AppState>
where
    E: Entity,
    E::Id: DeserializeOwned,
    C: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
    U: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
    Q: DeserializeOwned + QueryShape + Send + Sync + 'static,
{
    routes_with_create::<E, C, U, Q>(post(create::<E, C, U, Q>))
}

/// Routes for one collection whose `POST /` is handled by `create`.
pub fn routes_with_create<E, C, U, Q>(create: MethodRouter<AppState>) -> Router<AppState>
where
    E: Entity,
    E::Id: DeserializeOwned,
    C: Serialize + Send + Sync + 'static,
    U: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
    Q: DeserializeOwned + QueryShape + Send + Sync + 'static,
{
    Router::new()
        .route("/", create.get(list::<E, C, U, Q>))
        .route(
            "/:id",
            get(get_one::<E, C, U, Q>)
                .patch(update::<E, C, U, Q>)
                .delete(remove::<E, C, U, Q>),
        )
        .route("/:id/audit-log", get(audit_log::<E, C, U, Q>))
}

fn repository<E, C, U, Q>(state: &AppState) -> Repository<E, C, U, Q>
where
    E: Entity,
    C: Serialize + Sync,
    U: Serialize + Sync,
    Q: QueryShape + Sync,
{
    Repository::new(state.pool.clone())
}

/// List the collection with filters, pagination and optional relations.
pub async fn list<E, C, U, Q>(
    State(state): State<AppState>,
    Query(query): Query<Q>,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<Page<Loaded<E>>>, ApiError>
where
    E: Entity,
    C: Serialize + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
    Q: DeserializeOwned + QueryShape + Send + Sync + 'static,
{
    let relations = include.relations();
    let relations: Vec<&str> = relations.iter().map(String::as_str).collect();

    let (count, results) = repository::<E, C, U, Q>(&state)
        .list_and_count(&query, &relations)
        .await?;

    Ok(Json(Page::new(query.page_request(), count, results)))
}

/// Create one entity from a validated payload.
pub async fn create<E, C, U, Q>(
    State(state): State<AppState>,
    Json(payload): Json<C>,
) -> Result<(StatusCode, Json<E>), ApiError>
where
    E: Entity,
    C: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
    Q: QueryShape + Send + Sync + 'static,
{
    payload.validate()?;

    let entity = repository::<E, C, U, Q>(&state).create(&payload).await?;
    tracing::info!(entity = E::NAME, id = %entity.id(), "Created");

    Ok((StatusCode::CREATED, Json(entity)))
}

/// Fetch one entity, preloading the relations named in `include`.
pub async fn get_one<E, C, U, Q>(
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
    Query(include): Query<IncludeQuery>,
) -> Result<Json<Loaded<E>>, ApiError>
where
    E: Entity,
    E::Id: DeserializeOwned,
    C: Serialize + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
    Q: QueryShape + Send + Sync + 'static,
{
    let relations = include.relations();
    let relations: Vec<&str> = relations.iter().map(String::as_str).collect();

    let loaded = repository::<E, C, U, Q>(&state)
        .get_one_or_fail(id, &relations)
        .await?;

    Ok(Json(loaded))
}

/// Apply a partial update. Absent fields stay, `null` clears.
pub async fn update<E, C, U, Q>(
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
    Json(payload): Json<U>,
) -> Result<Json<E>, ApiError>
where
    E: Entity,
    E::Id: DeserializeOwned,
    C: Serialize + Send + Sync + 'static,
    U: DeserializeOwned + Serialize + Validate + Send + Sync + 'static,
    Q: QueryShape + Send + Sync + 'static,
{
    payload.validate()?;

    let entity = repository::<E, C, U, Q>(&state)
        .update_by_id(id, &payload)
        .await?;

    Ok(Json(entity))
}

/// Delete one entity.
pub async fn remove<E, C, U, Q>(
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
) -> Result<StatusCode, ApiError>
where
    E: Entity,
    E::Id: DeserializeOwned,
    C: Serialize + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
    Q: QueryShape + Send + Sync + 'static,
{
    repository::<E, C, U, Q>(&state).delete_by_id(id).await?;
    tracing::info!(entity = E::NAME, id = %id, "Deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Read the audit trail of one entity, newest first.
///
/// Works for deleted entities too.
pub async fn audit_log<E, C, U, Q>(
    State(state): State<AppState>,
    Path(id): Path<E::Id>,
    Query(query): Query<ListAuditLogQuery>,
) -> Result<Json<AuditLogResponse>, ApiError>
where
    E: Entity,
    E::Id: DeserializeOwned,
    C: Serialize + Send + Sync + 'static,
    U: Serialize + Send + Sync + 'static,
    Q: QueryShape + Send + Sync + 'static,
{
    let (count, results) = repository::<E, C, U, Q>(&state)
        .get_audit_log(id, &query.page_request())
        .await?;

    Ok(Json(AuditLogResponse { count, results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_relations() {
        let include = IncludeQuery {
            include: Some("site, interfaces,,".to_string()),
        };
        assert_eq!(include.relations(), vec!["site", "interfaces"]);
        assert!(IncludeQuery::default().relations().is_empty());
    }

    #[test]
    fn test_include_query_ignores_other_parameters() {
        let include: IncludeQuery =
            parse_include("include=device&page=2&status=active");
        assert_eq!(include.relations(), vec!["device"]);
    }

    fn parse_include(query: &str) -> IncludeQuery {
        let uri: axum::http::Uri = format!("/?{}", query).parse().unwrap();
        Query::<IncludeQuery>::try_from_uri(&uri).unwrap().0
    }
}
