use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use shiori_db::DbError;
use shiori_types::ValidationError;
use shiori_types::api::ErrorResponse;

/// Handler failure, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(&'static str),
    Conflict,
    Unavailable,
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            ApiError::Conflict => (
                StatusCode::CONFLICT,
                "concurrent update, please retry".to_string(),
            ),
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service unavailable".to_string(),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
            ),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(_: JsonRejection) -> Self {
        ApiError::BadRequest("invalid request".to_string())
    }
}

/// Map a store error for an operation on `what` (e.g. "board").
pub fn db_error(what: &'static str) -> impl Fn(DbError) -> ApiError {
    move |e| match e {
        DbError::NotFound(_) => ApiError::NotFound(what),
        DbError::Conflict { attempts } => {
            warn!("Gave up on {} after {} conflicting attempts", what, attempts);
            ApiError::Conflict
        }
        other => {
            error!("Storage error on {}: {}", what, other);
            ApiError::Internal
        }
    }
}

/// A failed store ping on `/healthz`.
pub fn store_unavailable(e: DbError) -> ApiError {
    error!("Health check failed: {}", e);
    ApiError::Unavailable
}

/// Run blocking store work off the async runtime.
pub async fn blocking<F, T>(f: F) -> Result<shiori_db::Result<T>, ApiError>
where
    F: FnOnce() -> shiori_db::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal
    })
}
