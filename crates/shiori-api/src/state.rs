use std::sync::Arc;

use shiori_db::{BoardStore, Database, LinkStore};
use shiori_preview::MetadataFetcher;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub boards: BoardStore,
    pub links: LinkStore,
    pub fetcher: Arc<dyn MetadataFetcher>,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>, fetcher: Arc<dyn MetadataFetcher>) -> AppState {
        Arc::new(Self {
            boards: BoardStore::new(db.clone()),
            links: LinkStore::new(db.clone()),
            db,
            fetcher,
        })
    }
}
