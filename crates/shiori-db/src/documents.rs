use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use crate::models::DocumentRow;
use crate::{Database, DbError, Result};

/// Address of a single document: collection path plus document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocKey {
    pub collection: String,
    pub id: String,
}

impl DocKey {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

/// Collection scan ordered by `created_at` descending, with an optional
/// equality filter on one top-level field and an optional cap.
#[derive(Debug, Clone)]
pub struct Query {
    collection: String,
    filter: Option<(&'static str, String)>,
    limit: Option<u32>,
}

impl Query {
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            limit: None,
        }
    }

    /// `field` is spliced into the SQL so the expression index can match;
    /// it must be a plain identifier.
    pub fn where_eq(mut self, field: &'static str, value: impl Into<String>) -> Self {
        debug_assert!(field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        self.filter = Some((field, value.into()));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl Database {
    pub fn get(&self, key: &DocKey) -> Result<Option<DocumentRow>> {
        self.with_conn(|conn| read_document(conn, key))
    }

    /// Create or overwrite a document. With `merge`, top-level fields absent
    /// from `data` keep their stored values.
    pub fn set(&self, key: &DocKey, data: &Map<String, Value>, merge: bool) -> Result<()> {
        self.with_conn_mut(|conn| write_document(conn, key, data, merge))
    }

    /// Insert a document under a freshly generated id and return that id.
    pub fn add(&self, collection: &str, data: &Map<String, Value>) -> Result<String> {
        let id = Uuid::new_v4().simple().to_string();
        let key = DocKey::new(collection, id.clone());
        self.with_conn_mut(|conn| write_document(conn, &key, data, false))?;
        Ok(id)
    }

    /// Overwrite only the given top-level fields of an existing document.
    pub fn update(&self, key: &DocKey, fields: &Map<String, Value>) -> Result<()> {
        self.with_conn_mut(|conn| {
            if read_version(conn, key)?.is_none() {
                return Err(DbError::NotFound(key.to_string()));
            }
            write_document(conn, key, fields, true)
        })
    }

    /// Remove a document. Missing documents are not an error.
    pub fn delete(&self, key: &DocKey) -> Result<()> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![key.collection, key.id],
            )?;
            debug!("delete {}: {} row(s)", key, removed);
            Ok(())
        })
    }

    pub fn query(&self, query: &Query) -> Result<Vec<DocumentRow>> {
        self.with_conn(|conn| run_query(conn, query))
    }
}

pub(crate) fn read_document(conn: &Connection, key: &DocKey) -> Result<Option<DocumentRow>> {
    let row = conn
        .query_row(
            "SELECT data, version, created_at FROM documents WHERE collection = ?1 AND id = ?2",
            params![key.collection, key.id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(data, version, created_at)| {
        Ok(DocumentRow {
            collection: key.collection.clone(),
            id: key.id.clone(),
            data: serde_json::from_str(&data)?,
            version,
            created_at,
        })
    })
    .transpose()
}

pub(crate) fn read_version(conn: &Connection, key: &DocKey) -> Result<Option<i64>> {
    let version = conn
        .query_row(
            "SELECT version FROM documents WHERE collection = ?1 AND id = ?2",
            params![key.collection, key.id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(version)
}

pub(crate) fn write_document(
    conn: &Connection,
    key: &DocKey,
    data: &Map<String, Value>,
    merge: bool,
) -> Result<()> {
    let version = next_version(conn)?;

    match read_document(conn, key)? {
        Some(existing) => {
            let mut body = if merge { existing.data } else { Map::new() };
            for (field, value) in data {
                body.insert(field.clone(), value.clone());
            }
            let created_at = sort_key(&body).unwrap_or(existing.created_at);
            conn.execute(
                "UPDATE documents SET data = ?3, version = ?4, created_at = ?5
                 WHERE collection = ?1 AND id = ?2",
                params![
                    key.collection,
                    key.id,
                    serde_json::to_string(&body)?,
                    version,
                    created_at
                ],
            )?;
        }
        None => {
            conn.execute(
                "INSERT INTO documents (collection, id, data, version, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    key.collection,
                    key.id,
                    serde_json::to_string(data)?,
                    version,
                    sort_key(data).unwrap_or_default()
                ],
            )?;
        }
    }
    Ok(())
}

fn next_version(conn: &Connection) -> Result<i64> {
    let tick = conn.query_row(
        "UPDATE version_clock SET tick = tick + 1 WHERE id = 1 RETURNING tick",
        [],
        |row| row.get(0),
    )?;
    Ok(tick)
}

/// Fixed-width UTC rendering of the body's `created_at`, so that text order
/// in the index matches time order.
fn sort_key(data: &Map<String, Value>) -> Option<String> {
    let raw = data.get("created_at")?.as_str()?;
    let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
    Some(
        parsed
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Micros, true),
    )
}

fn run_query(conn: &Connection, query: &Query) -> Result<Vec<DocumentRow>> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = query.limit.map(i64::from).unwrap_or(-1);

    let raw: Vec<(String, String, i64, String)> = match &query.filter {
        Some((field, value)) => {
            let sql = format!(
                "SELECT id, data, version, created_at FROM documents
                 WHERE collection = ?1 AND json_extract(data, '$.{field}') = ?2
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![query.collection, value, limit], raw_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, data, version, created_at FROM documents
                 WHERE collection = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let rows = stmt
                .query_map(params![query.collection, limit], raw_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        }
    };

    raw.into_iter()
        .map(|(id, data, version, created_at)| {
            Ok(DocumentRow {
                collection: query.collection.clone(),
                id,
                data: serde_json::from_str(&data)?,
                version,
                created_at,
            })
        })
        .collect()
}

fn raw_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, i64, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}
