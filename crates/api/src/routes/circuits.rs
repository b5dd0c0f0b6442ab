//! Circuit routes.
//!
//! Reads, updates and deletes are the generic collection handlers; creation
//! goes through [`CircuitService`] to resolve the termination.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use validator::Validate;

use domain::models::{CircuitQuery, CreateCircuit, UpdateCircuit};
use persistence::entities::CircuitEntity;

use crate::app::AppState;
use crate::error::ApiError;
use crate::routes::resource;
use crate::services::CircuitService;

pub fn router() -> Router<AppState> {
    resource::routes_with_create::<CircuitEntity, CreateCircuit, UpdateCircuit, CircuitQuery>(
        post(create_circuit),
    )
}

/// Create a circuit terminated on an existing interface.
pub async fn create_circuit(
    State(state): State<AppState>,
    Json(request): Json<CreateCircuit>,
) -> Result<(StatusCode, Json<CircuitEntity>), ApiError> {
    request.validate()?;

    let circuit = CircuitService::new(state.pool.clone())
        .create(&request)
        .await?;

    Ok((StatusCode::CREATED, Json(circuit)))
}
