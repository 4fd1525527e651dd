use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Every board and link is a JSON document inside a named collection.
        -- Links live in 'boards/{board_id}/links'.
        CREATE TABLE IF NOT EXISTS documents (
            collection  TEXT NOT NULL,
            id          TEXT NOT NULL,
            data        TEXT NOT NULL,
            version     INTEGER NOT NULL,
            created_at  TEXT NOT NULL DEFAULT '',
            PRIMARY KEY (collection, id)
        );

        CREATE INDEX IF NOT EXISTS idx_documents_created
            ON documents(collection, created_at DESC);

        CREATE INDEX IF NOT EXISTS idx_documents_device
            ON documents(collection, json_extract(data, '$.created_by_device_id'), created_at DESC);

        -- Monotonic source of document versions. A version is never reused,
        -- even across delete and re-create.
        CREATE TABLE IF NOT EXISTS version_clock (
            id    INTEGER PRIMARY KEY CHECK (id = 1),
            tick  INTEGER NOT NULL
        );

        INSERT OR IGNORE INTO version_clock (id, tick) VALUES (1, 0);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
