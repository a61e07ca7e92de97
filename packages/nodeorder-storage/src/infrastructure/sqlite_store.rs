//! SQLite Weight Store
//!
//! File-based persistent storage of the `taxonomy_index` table.
//! Group transactions use `BEGIN IMMEDIATE` on a mutex-guarded
//! connection, so two rebalances on the same database never interleave.

use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::{GroupId, ItemId, MatchMode, OrderedItem, Weight, WeightRange};
use crate::domain::ports::{GroupTxn, WeightStore};
use crate::error::{Result, StorageError};

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// SQLite-based WeightStore implementation
#[derive(Clone)]
pub struct SqliteWeightStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWeightStore {
    /// Create a new SQLite store at the given path
    ///
    /// Other connections to the same file may hold the write lock; writers
    /// wait up to [`BUSY_TIMEOUT`] for it.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "CREATE TABLE IF NOT EXISTS taxonomy_index (
                tid INTEGER NOT NULL,
                nid INTEGER NOT NULL,
                weight INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (tid, nid)
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_taxonomy_index_weight
             ON taxonomy_index(tid, weight)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_taxonomy_index_nid
             ON taxonomy_index(nid)",
            [],
        )?;

        Ok(())
    }
}

fn items_by_weight_on(conn: &Connection, group: GroupId) -> Result<Vec<OrderedItem>> {
    let mut stmt = conn.prepare_cached(
        "SELECT nid, weight FROM taxonomy_index
         WHERE tid = ?1
         ORDER BY weight, nid",
    )?;
    let items = stmt
        .query_map(params![group.0], |row| {
            Ok(OrderedItem::new(group, ItemId(row.get(0)?), row.get(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

fn range_on(conn: &Connection, group: GroupId) -> Result<Option<WeightRange>> {
    // MIN/MAX over zero rows yields NULL, not 0
    let (min, max): (Option<Weight>, Option<Weight>) = conn.query_row(
        "SELECT MIN(weight), MAX(weight) FROM taxonomy_index WHERE tid = ?1",
        params![group.0],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(min.zip(max).map(|(min, max)| WeightRange::new(min, max)))
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// LIMIT -1 is "no limit" in SQLite
fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

/// Clamped, since SQLite reads a negative OFFSET as 0
fn sql_offset(offset: usize) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

struct SqliteGroupTxn<'a> {
    tx: &'a Connection,
    group: GroupId,
}

impl GroupTxn for SqliteGroupTxn<'_> {
    fn upsert(&mut self, item: ItemId, weight: Weight) -> Result<()> {
        self.tx.execute(
            "INSERT INTO taxonomy_index (tid, nid, weight) VALUES (?1, ?2, ?3)
             ON CONFLICT(tid, nid) DO UPDATE SET weight = excluded.weight",
            params![self.group.0, item.0, weight],
        )?;
        Ok(())
    }

    fn remove(&mut self, item: ItemId) -> Result<usize> {
        Ok(self.tx.execute(
            "DELETE FROM taxonomy_index WHERE tid = ?1 AND nid = ?2",
            params![self.group.0, item.0],
        )?)
    }

    fn set_weight(&mut self, item: ItemId, weight: Weight) -> Result<usize> {
        Ok(self.tx.execute(
            "UPDATE taxonomy_index SET weight = ?1 WHERE tid = ?2 AND nid = ?3",
            params![weight, self.group.0, item.0],
        )?)
    }

    fn shift_weights(&mut self, items: &[ItemId], delta: Weight) -> Result<usize> {
        if items.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE taxonomy_index SET weight = weight + ? WHERE tid = ? AND nid IN ({})",
            placeholders(items.len())
        );
        let values = [delta, self.group.0]
            .into_iter()
            .chain(items.iter().map(|i| i.0));
        Ok(self.tx.execute(&sql, params_from_iter(values))?)
    }

    fn items_by_weight(&self) -> Result<Vec<OrderedItem>> {
        items_by_weight_on(self.tx, self.group)
    }

    fn range(&self) -> Result<Option<WeightRange>> {
        range_on(self.tx, self.group)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM taxonomy_index WHERE tid = ?1",
            params![self.group.0],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

impl WeightStore for SqliteWeightStore {
    fn atomically<R, F>(&self, group: GroupId, f: F) -> Result<R>
    where
        F: FnOnce(&mut dyn GroupTxn) -> Result<R>,
    {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| StorageError::transaction(format!("BEGIN failed: {}", e)).with_source(e))?;

        let outcome = {
            let mut scoped = SqliteGroupTxn { tx: &tx, group };
            f(&mut scoped)
        };

        match outcome {
            Ok(value) => {
                tx.commit().map_err(|e| {
                    StorageError::transaction(format!("COMMIT failed: {}", e)).with_source(e)
                })?;
                Ok(value)
            }
            Err(err) => {
                tracing::warn!(group = %group, error = %err, "sqlite transaction rolled back");
                if let Err(rollback_err) = tx.rollback() {
                    tracing::warn!(group = %group, error = %rollback_err, "ROLLBACK failed");
                }
                Err(err)
            }
        }
    }

    fn items_by_weight(&self, group: GroupId) -> Result<Vec<OrderedItem>> {
        let conn = self.conn.lock();
        items_by_weight_on(&conn, group)
    }

    fn range(&self, group: GroupId) -> Result<Option<WeightRange>> {
        let conn = self.conn.lock();
        range_on(&conn, group)
    }

    fn groups_of_item(&self, item: ItemId) -> Result<Vec<GroupId>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare_cached("SELECT tid FROM taxonomy_index WHERE nid = ?1 ORDER BY tid")?;
        let groups = stmt
            .query_map(params![item.0], |row| Ok(GroupId(row.get(0)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(groups)
    }

    fn select_items(
        &self,
        groups: &[GroupId],
        mode: MatchMode,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<ItemId>> {
        let Some(first) = groups.first() else {
            return Ok(Vec::new());
        };
        let mut distinct: Vec<i64> = groups.iter().map(|g| g.0).collect();
        distinct.sort_unstable();
        distinct.dedup();

        let (sql, values): (String, Vec<i64>) = match mode {
            MatchMode::Any => {
                let sql = format!(
                    "SELECT nid, MIN(weight) AS w FROM taxonomy_index
                     WHERE tid IN ({})
                     GROUP BY nid
                     ORDER BY w, nid
                     LIMIT ? OFFSET ?",
                    placeholders(distinct.len())
                );
                let mut values = distinct;
                values.extend([sql_limit(limit), sql_offset(offset)]);
                (sql, values)
            }
            MatchMode::All => {
                let sql = format!(
                    "SELECT t0.nid, t0.weight FROM taxonomy_index t0
                     WHERE t0.tid = ?
                       AND (SELECT COUNT(*) FROM taxonomy_index t
                            WHERE t.nid = t0.nid AND t.tid IN ({})) = ?
                     ORDER BY t0.weight, t0.nid
                     LIMIT ? OFFSET ?",
                    placeholders(distinct.len())
                );
                let required = distinct.len() as i64;
                let mut values = vec![first.0];
                values.extend(distinct);
                values.extend([required, sql_limit(limit), sql_offset(offset)]);
                (sql, values)
            }
        };

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values), |row| Ok(ItemId(row.get(0)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }
}
