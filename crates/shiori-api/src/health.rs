use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::error::{ApiError, blocking, store_unavailable};
use crate::state::AppState;

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    blocking(move || state.db.ping())
        .await?
        .map_err(store_unavailable)?;

    Ok(Json(json!({ "status": "ok" })))
}
