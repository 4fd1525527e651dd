use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shiori_types::{Board, BoardPatch, NewBoard};

use crate::documents::{DocKey, Query};
use crate::models::encode_body;
use crate::{Database, DbError, Result};

pub const BOARDS: &str = "boards";

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 50;

/// Effective page size for device listings: anything outside
/// `1..=MAX_LIST_LIMIT` falls back to the default.
pub fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        Some(n) if (1..=i64::from(MAX_LIST_LIMIT)).contains(&n) => n as u32,
        _ => DEFAULT_LIST_LIMIT,
    }
}

pub fn board_key(board_id: &str) -> DocKey {
    DocKey::new(BOARDS, board_id)
}

#[derive(Clone)]
pub struct BoardStore {
    db: Arc<Database>,
}

impl BoardStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Persist a new board under its pre-assigned id, stamping `created_at`.
    pub fn create_board(&self, board: NewBoard) -> Result<Board> {
        let board = board.into_board(Utc::now());
        self.db.set(&board_key(&board.id), &encode_body(&board)?, false)?;

        info!("Board {} created ({} members)", board.id, board.members.len());
        Ok(board)
    }

    pub fn get_board(&self, board_id: &str) -> Result<Board> {
        let key = board_key(board_id);
        self.db
            .get(&key)?
            .ok_or_else(|| DbError::NotFound(key.to_string()))?
            .decode()
    }

    /// Apply the fields present in `patch` and return the re-read board.
    pub fn update_board(&self, board_id: &str, patch: &BoardPatch) -> Result<Board> {
        let fields = patch.to_fields();
        if !fields.is_empty() {
            self.db.update(&board_key(board_id), &fields)?;
            debug!(
                "Board {} updated: {}",
                board_id,
                fields.keys().cloned().collect::<Vec<_>>().join(", ")
            );
        }
        self.get_board(board_id)
    }

    /// Boards created from `device_id`, newest first.
    pub fn list_boards_by_device_id(
        &self,
        device_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Board>> {
        if device_id.is_empty() {
            return Ok(vec![]);
        }

        let query = Query::collection(BOARDS)
            .where_eq("created_by_device_id", device_id)
            .limit(clamp_limit(limit));

        self.db
            .query(&query)?
            .into_iter()
            .map(|row| row.decode())
            .collect()
    }
}
