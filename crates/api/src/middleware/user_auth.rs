//! Bearer token authentication.
//!
//! Authentication is optional: a request without an `Authorization` header
//! runs without an actor. A presented token must verify, otherwise the request
//! is rejected before it can touch any data.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use shared::jwt::{extract_user_id, JwtConfig};

/// Authenticated user information extracted from JWT.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
    /// JWT ID (jti) for session tracking.
    pub jti: String,
}

impl UserAuth {
    /// Validates an access token and returns user authentication info.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, String> {
        let claims = jwt_config
            .validate_token(token)
            .map_err(|e| format!("Invalid token: {}", e))?;

        let user_id = extract_user_id(&claims).map_err(|_| "Invalid user ID in token".to_string())?;

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
        })
    }
}

/// Middleware that validates a Bearer token when one is presented.
///
/// The authenticated user is stored in request extensions and becomes the
/// actor of the request context.
pub async fn optional_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = match bearer_token(&req) {
        Ok(Some(token)) => token.to_string(),
        Ok(None) => return next.run(req).await,
        Err(message) => return ApiError::Unauthorized(message.into()).into_response(),
    };

    let Some(jwt_config) = state.jwt.as_deref() else {
        tracing::debug!("Bearer token presented but token verification is not configured");
        return ApiError::Unauthorized("Token authentication is not enabled".into())
            .into_response();
    };

    match UserAuth::validate(jwt_config, &token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!("JWT validation failed: {}", e);
            ApiError::Unauthorized("Invalid or expired token".into()).into_response()
        }
    }
}

fn bearer_token(req: &Request<Body>) -> Result<Option<&str>, &'static str> {
    let Some(header) = req.headers().get("Authorization") else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| "Malformed Authorization header")?;
    header
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or("Authorization header must use the Bearer scheme")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt() -> JwtConfig {
        JwtConfig::from_secret("user-auth-test-secret", 900, 0)
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_validate_roundtrip() {
        let config = jwt();
        let user_id = Uuid::new_v4();
        let (token, jti) = config.generate_access_token(user_id).unwrap();

        let auth = UserAuth::validate(&config, &token).unwrap();
        assert_eq!(auth.user_id, user_id);
        assert_eq!(auth.jti, jti);
    }

    #[test]
    fn test_validate_rejects_foreign_signature() {
        let other = JwtConfig::from_secret("another-secret", 900, 0);
        let (token, _) = other.generate_access_token(Uuid::new_v4()).unwrap();
        assert!(UserAuth::validate(&jwt(), &token).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&request(None)), Ok(None));
        assert_eq!(bearer_token(&request(Some("Bearer abc"))), Ok(Some("abc")));
        assert!(bearer_token(&request(Some("Basic dXNlcjpwYXNz"))).is_err());
    }
}
