use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use persistence::RepositoryError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures of a request payload.
    #[error("Validation error: {} invalid field(s)", .0.len())]
    InvalidFields(Vec<ValidationDetail>),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationDetail>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationDetail {
    pub field: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            ApiError::InvalidFields(details) => {
                let message = match details.as_slice() {
                    [only] => only.message.clone(),
                    _ => format!("{} validation errors", details.len()),
                };
                (
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    message,
                    Some(details),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                    None,
                )
            }
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                msg,
                None,
            ),
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::AlreadyExists(msg) | RepositoryError::ReferentialConflict(msg) => {
                ApiError::Conflict(msg)
            }
            RepositoryError::UnknownRelation { .. } | RepositoryError::InvalidPayload(_) => {
                ApiError::Validation(err.to_string())
            }
            RepositoryError::AuditWriteFailure(_)
            | RepositoryError::Registry(_)
            | RepositoryError::Database(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationDetail> = errors
            .errors()
            .iter()
            .flat_map(|(field, kind)| match kind {
                validator::ValidationErrorsKind::Field(errors) => errors
                    .iter()
                    .map(|e| ValidationDetail {
                        field: field.to_string(),
                        message: e
                            .message
                            .clone()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("{} is invalid", field)),
                    })
                    .collect::<Vec<_>>(),
                _ => vec![ValidationDetail {
                    field: field.to_string(),
                    message: format!("{} is invalid", field),
                }],
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::InvalidFields(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct SampleForm {
        #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
        name: String,
        #[validate(range(min = 68, max = 65536))]
        mtu: i32,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Unauthorized("t".into()), StatusCode::UNAUTHORIZED),
            (ApiError::NotFound("t".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("t".into()), StatusCode::CONFLICT),
            (ApiError::Validation("t".into()), StatusCode::BAD_REQUEST),
            (ApiError::InvalidFields(vec![]), StatusCode::BAD_REQUEST),
            (ApiError::Internal("t".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                ApiError::ServiceUnavailable("t".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::NotFound("Site x not found".into()).into();
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Site x not found"));

        let err: ApiError = RepositoryError::ReferentialConflict("Site is referenced".into()).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = RepositoryError::AlreadyExists("duplicate".into()).into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = RepositoryError::UnknownRelation {
            entity: "Device",
            relation: "owner".into(),
        }
        .into();
        assert!(matches!(err, ApiError::Validation(_)));

        let err: ApiError = RepositoryError::AuditWriteFailure("fk".into()).into();
        assert!(matches!(err, ApiError::Internal(_)));

        let err: ApiError = RepositoryError::Database(sqlx::Error::PoolTimedOut).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[tokio::test]
    async fn test_internal_error_message_not_leaked() {
        let response = ApiError::Internal("password authentication failed".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_validation_errors_carry_details() {
        let form = SampleForm {
            name: "x".into(),
            mtu: 10,
        };
        let err: ApiError = form.validate().unwrap_err().into();
        let body = body_json(err.into_response()).await;

        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "2 validation errors");
        let details = body["details"].as_array().unwrap();
        assert_eq!(details[0]["field"], "mtu");
        assert_eq!(details[1]["field"], "name");
        assert_eq!(details[1]["message"], "Name must be at least 2 characters");
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).to_string(),
            "Not found: test"
        );
        assert_eq!(
            ApiError::Conflict("test".to_string()).to_string(),
            "Conflict: test"
        );
    }
}
