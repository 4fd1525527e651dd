use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::documents::{DocKey, read_document, read_version, write_document};
use crate::models::DocumentRow;
use crate::{Database, DbError, Result};

/// How many times `run_transaction` re-runs a closure whose commit lost a race.
pub const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// One optimistic commit attempt. Reads record the version they saw; writes
/// are buffered until commit, which succeeds only if none of the read
/// documents changed in the meantime.
pub struct Transaction<'db> {
    db: &'db Database,
    reads: HashMap<DocKey, Option<i64>>,
    writes: Vec<(DocKey, Map<String, Value>, bool)>,
}

impl<'db> Transaction<'db> {
    fn new(db: &'db Database) -> Self {
        Self {
            db,
            reads: HashMap::new(),
            writes: Vec::new(),
        }
    }

    pub fn get(&mut self, key: &DocKey) -> Result<Option<DocumentRow>> {
        let row = self.db.with_conn(|conn| read_document(conn, key))?;
        self.reads
            .entry(key.clone())
            .or_insert_with(|| row.as_ref().map(|r| r.version));
        Ok(row)
    }

    /// Queue a write; same semantics as [`Database::set`].
    pub fn set(&mut self, key: &DocKey, data: Map<String, Value>, merge: bool) {
        self.writes.push((key.clone(), data, merge));
    }

    /// Returns `false` if a read document moved on since it was read.
    fn commit(self) -> Result<bool> {
        let Transaction { db, reads, writes } = self;

        db.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;

            for (key, seen) in &reads {
                let current = read_version(&tx, key)?;
                if current != *seen {
                    debug!("{} changed since read ({:?} -> {:?})", key, seen, current);
                    return Ok(false);
                }
            }

            for (key, data, merge) in &writes {
                write_document(&tx, key, data, *merge)?;
            }

            tx.commit()?;
            Ok(true)
        })
    }
}

impl Database {
    /// Run `f` inside an optimistic transaction, re-running it on a fresh
    /// snapshot when a concurrent write wins the race. Errors returned by `f`
    /// abort immediately without committing.
    pub fn run_transaction<T, F>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&mut Transaction<'_>) -> Result<T>,
    {
        for attempt in 1..=MAX_TRANSACTION_ATTEMPTS {
            let mut tx = Transaction::new(self);
            let value = f(&mut tx)?;
            if tx.commit()? {
                return Ok(value);
            }
            debug!("Transaction conflict on attempt {}", attempt);
        }

        warn!(
            "Transaction aborted after {} conflicting attempts",
            MAX_TRANSACTION_ATTEMPTS
        );
        Err(DbError::Conflict {
            attempts: MAX_TRANSACTION_ATTEMPTS,
        })
    }
}
