use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// The API error taxonomy. Every handler returns `ApiResult<T>` and maps
/// store outcomes onto one of these; internals collapse to a generic 500
/// with the cause logged server-side only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, "validation", message),
            ApiError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "unauthorized", message),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "forbidden", message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Internal(err) => {
                error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { kind, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_kinds() {
        let cases = [
            (
                ApiError::Validation("x".into()).into_response().status(),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Unauthorized("x".into()).into_response().status(),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiError::Forbidden("x".into()).into_response().status(),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::NotFound("x".into()).into_response().status(),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::Conflict("x".into()).into_response().status(),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::Internal(anyhow::anyhow!("boom"))
                    .into_response()
                    .status(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (got, want) in cases {
            assert_eq!(got, want);
        }
    }
}
