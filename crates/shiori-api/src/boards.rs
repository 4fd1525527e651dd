use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::IntoResponse,
};
use uuid::Uuid;

use shiori_types::api::{CreateBoardRequest, CreateBoardResponse, ListBoardsQuery};
use shiori_types::{Board, BoardPatch, NewBoard};

use crate::error::{ApiError, blocking, db_error};
use crate::state::AppState;

/// POST /api/boards
pub async fn create_board(
    State(state): State<AppState>,
    payload: Result<Json<CreateBoardRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let valid = req.validate()?;

    let board_id = Uuid::new_v4().to_string();
    let board = NewBoard::new(board_id.clone(), valid.title, valid.members)
        .with_device_id(valid.device_id);

    blocking(move || state.boards.create_board(board))
        .await?
        .map_err(db_error("board"))?;

    Ok(Json(CreateBoardResponse { board_id }))
}

/// GET /api/me/boards?device_id=..&limit=..
pub async fn list_my_boards(
    State(state): State<AppState>,
    Query(query): Query<ListBoardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let device_id = query.device_id.trim().to_string();
    if device_id.is_empty() {
        return Ok(Json(Vec::<Board>::new()));
    }
    let limit = query.limit();

    let boards = blocking(move || state.boards.list_boards_by_device_id(&device_id, limit))
        .await?
        .map_err(db_error("boards"))?;

    Ok(Json(boards))
}

/// GET /api/boards/{board_id}
pub async fn get_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let board = blocking(move || state.boards.get_board(&board_id))
        .await?
        .map_err(db_error("board"))?;

    Ok(Json(board))
}

/// PATCH /api/boards/{board_id}: any subset of title, members, tags.
pub async fn update_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    payload: Result<Json<BoardPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = payload?;
    let patch = patch.validate()?;

    let board = blocking(move || state.boards.update_board(&board_id, &patch))
        .await?
        .map_err(db_error("board"))?;

    Ok(Json(board))
}
