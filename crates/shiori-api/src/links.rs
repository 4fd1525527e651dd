use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use shiori_preview::resolve_preview;
use shiori_types::NewLink;
use shiori_types::api::{CreateLinkRequest, ToggleReactionRequest};

use crate::error::{ApiError, blocking, db_error};
use crate::state::AppState;

/// GET /api/boards/{board_id}/links
pub async fn list_links(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let links = blocking(move || state.links.list_links(&board_id))
        .await?
        .map_err(db_error("links"))?;

    Ok(Json(links))
}

/// POST /api/boards/{board_id}/links
///
/// Responds with the board's full link list so the client can replace its
/// copy in one go.
pub async fn create_link(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let req = req.validate()?;

    // Links only exist under a board.
    let check_state = state.clone();
    let check_id = board_id.clone();
    blocking(move || check_state.boards.get_board(&check_id))
        .await?
        .map_err(db_error("board"))?;

    let preview = resolve_preview(state.fetcher.as_ref(), &req.url).await;
    let link = NewLink {
        url: req.url,
        title: preview.title,
        image_url: preview.image_url,
        description: preview.description,
        domain: preview.domain,
        category: req.category,
        added_by: req.added_by,
        reactions: None,
    };

    let links = blocking(move || {
        state.links.create_link(&board_id, link)?;
        state.links.list_links(&board_id)
    })
    .await?
    .map_err(db_error("link"))?;

    Ok(Json(links))
}

/// DELETE /api/boards/{board_id}/links/{link_id}
pub async fn delete_link(
    State(state): State<AppState>,
    Path((board_id, link_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    blocking(move || state.links.delete_link(&board_id, &link_id))
        .await?
        .map_err(db_error("link"))?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/boards/{board_id}/links/{link_id}/reactions
pub async fn toggle_reaction(
    State(state): State<AppState>,
    Path((board_id, link_id)): Path<(String, String)>,
    payload: Result<Json<ToggleReactionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let req = req.validate()?;

    let link = blocking(move || {
        state
            .links
            .toggle_reaction(&board_id, &link_id, &req.emoji, &req.member)
    })
    .await?
    .map_err(db_error("link"))?;

    Ok(Json(link))
}
