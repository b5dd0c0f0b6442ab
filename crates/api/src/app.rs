use axum::{middleware, routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use shared::jwt::{JwtConfig, JwtError};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, optional_user_auth, request_context, trace_id,
};
use crate::routes::{self, health};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Token verifier, `None` when authentication is not configured.
    pub jwt: Option<Arc<JwtConfig>>,
}

/// Builds the router. Fails when the configured key material is unusable.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let jwt = config.auth.jwt_config()?.map(Arc::new);
    if jwt.is_none() {
        tracing::warn!("No token verifier configured; requests run without an actor");
    }

    let config = Arc::new(config);
    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
    };

    let cors = if config.server.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .server
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Auth runs first (outermost layer), then the context scope opens.
    let api_routes = Router::new()
        .nest("/api/v1", routes::inventory())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            request_context,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_user_auth,
        ));

    let public_routes = Router::new()
        .nest("/api/health", health::router())
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
