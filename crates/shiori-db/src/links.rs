use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use shiori_types::{Link, NewLink, toggle_reaction};

use crate::boards::BOARDS;
use crate::documents::{DocKey, Query};
use crate::models::encode_body;
use crate::{Database, DbError, Result};

pub fn links_collection(board_id: &str) -> String {
    format!("{}/{}/links", BOARDS, board_id)
}

pub fn link_key(board_id: &str, link_id: &str) -> DocKey {
    DocKey::new(links_collection(board_id), link_id)
}

#[derive(Clone)]
pub struct LinkStore {
    db: Arc<Database>,
}

impl LinkStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// All links of a board, newest first.
    pub fn list_links(&self, board_id: &str) -> Result<Vec<Link>> {
        self.db
            .query(&Query::collection(links_collection(board_id)))?
            .into_iter()
            .map(|row| row.decode())
            .collect()
    }

    pub fn create_link(&self, board_id: &str, link: NewLink) -> Result<Link> {
        let link = link.into_link(String::new(), Utc::now());
        let id = self.db.add(&links_collection(board_id), &encode_body(&link)?)?;

        info!("Link {} added to board {} by {}", id, board_id, link.added_by);
        Ok(Link { id, ..link })
    }

    pub fn delete_link(&self, board_id: &str, link_id: &str) -> Result<()> {
        self.db.delete(&link_key(board_id, link_id))?;
        info!("Link {} removed from board {}", link_id, board_id);
        Ok(())
    }

    /// Toggle `member`'s `emoji` reaction on a link as one read-modify-write
    /// transaction, then return the link as read after commit.
    pub fn toggle_reaction(
        &self,
        board_id: &str,
        link_id: &str,
        emoji: &str,
        member: &str,
    ) -> Result<Link> {
        let key = link_key(board_id, link_id);

        let added = self.db.run_transaction(|tx| {
            let mut link: Link = tx
                .get(&key)?
                .ok_or_else(|| DbError::NotFound(key.to_string()))?
                .decode()?;

            let added = toggle_reaction(&mut link.reactions, emoji, member);
            tx.set(&key, encode_body(&link)?, true);
            Ok(added)
        })?;

        debug!(
            "Reaction {} by {} on {}: {}",
            emoji,
            member,
            key,
            if added { "added" } else { "removed" }
        );

        self.db
            .get(&key)?
            .ok_or_else(|| DbError::NotFound(key.to_string()))?
            .decode()
    }
}
