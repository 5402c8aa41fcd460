//! SQLite connection management

use std::cell::Cell;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction};
use serde::Serialize;

use super::schema;
use crate::config::{self, StoreConfig};
use crate::media::MediaRoot;
use crate::Result;

/// Writers wait this long on a locked database before giving up
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Negative values are KiB: roughly 64 MiB of page cache
const CACHE_SIZE_KIB: i64 = -64_000;

/// Every repository keeps a handful of statements hot; the default cache of 16
/// is too small once migration, hydration and cascades all run together.
const STATEMENT_CACHE_CAPACITY: usize = 128;

/// The single connection the process works through.
///
/// Construct it once at startup and hand out `&Store`; migrators and
/// repositories borrow it. Schema creation runs at most once per store.
pub struct Store {
    conn: Connection,
    media: MediaRoot,
    schema_ready: Cell<bool>,
    schema_status: SchemaStatus,
}

impl Store {
    /// Open a database file, creating it and its parent directories if needed
    pub fn open(path: &Path) -> Result<Self> {
        config::ensure_db_dir(path)?;
        let conn = Connection::open(path)?;
        Self::configure(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn)
    }

    /// Open the database named by the config, with its media settings
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let store = Self::open(&config.database_path())?;
        Ok(store.with_media(MediaRoot::from_config(config)))
    }

    pub fn with_media(mut self, media: MediaRoot) -> Self {
        self.media = media;
        self
    }

    fn configure(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        conn.pragma_update(None, "cache_size", CACHE_SIZE_KIB)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.set_prepared_statement_cache_capacity(STATEMENT_CACHE_CAPACITY);

        let mut store = Self {
            conn,
            media: MediaRoot::default(),
            schema_ready: Cell::new(false),
            schema_status: SchemaStatus::default(),
        };
        let status = store.initialize_schema();
        if !status.failed.is_empty() {
            tracing::warn!(
                "Schema initialized with {} failed statement(s)",
                status.failed.len()
            );
        }
        store.schema_status = status;
        Ok(store)
    }

    /// Create every table and index that does not exist yet.
    ///
    /// Statements are independent: one failing is logged and recorded, and
    /// the rest still run. After the first call this is a no-op.
    pub fn initialize_schema(&self) -> SchemaStatus {
        if self.schema_ready.get() {
            return SchemaStatus {
                already_initialized: true,
                ..Default::default()
            };
        }

        let mut status = SchemaStatus::default();
        let indexes = schema::CREATE_INDEXES.iter().map(|sql| (*sql, *sql));
        for (label, sql) in schema::TABLES.iter().copied().chain(indexes) {
            match self.conn.execute_batch(sql) {
                Ok(()) => status.applied += 1,
                Err(e) => {
                    tracing::warn!("Failed to create {}: {}", label, e);
                    status.failed.push(SchemaFailure {
                        statement: label.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        self.schema_ready.set(true);
        tracing::debug!("Schema ready ({} statements applied)", status.applied);
        status
    }

    /// Outcome of the schema pass that ran when the store was opened
    pub fn schema_status(&self) -> &SchemaStatus {
        &self.schema_status
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn media(&self) -> &MediaRoot {
        &self.media
    }

    /// Start a transaction through a shared reference.
    ///
    /// The store is the only owner of the connection and is never shared
    /// across threads, so nesting is the only misuse left; callers that
    /// already hold a transaction pass it down instead of calling this again.
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }

    /// Count rows in a table from the schema
    pub fn count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Ids currently present in `table`
    pub fn ids(&self, table: &str) -> Result<HashSet<String>> {
        load_ids(&self.conn, table)
    }

    /// Row counts for every table
    pub fn stats(&self) -> Result<DbStats> {
        let mut tables = Vec::new();
        for name in schema::table_names() {
            tables.push((name.to_string(), self.count(name)?));
        }
        Ok(DbStats { tables })
    }

    /// Rows whose foreign keys point nowhere
    pub fn foreign_key_violations(&self) -> Result<Vec<ForeignKeyViolation>> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let violations = stmt
            .query_map([], |row| {
                Ok(ForeignKeyViolation {
                    table: row.get(0)?,
                    rowid: row.get(1)?,
                    parent: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(violations)
    }

    /// Close the connection, surfacing any error instead of dropping it silently
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}

/// Load the primary keys of `table` into memory.
///
/// `table` always comes from the schema constants, never from input.
pub(crate) fn load_ids(conn: &Connection, table: &str) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare(&format!("SELECT id FROM {}", table))?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(ids)
}

/// Outcome of a schema initialization pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaStatus {
    pub applied: usize,
    pub failed: Vec<SchemaFailure>,
    pub already_initialized: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaFailure {
    pub statement: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub tables: Vec<(String, usize)>,
}

impl DbStats {
    pub fn get(&self, table: &str) -> usize {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|(_, count)| count).sum()
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (name, count) in &self.tables {
            writeln!(f, "  {}: {}", name, count)?;
        }
        write!(f, "  Total rows: {}", self.total_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_runs_once() {
        let store = Store::open_in_memory().unwrap();
        let again = store.initialize_schema();
        assert!(again.already_initialized);
        assert_eq!(again.applied, 0);
        assert!(store.schema_status().applied > 0);
        assert!(store.schema_status().failed.is_empty());
        assert_eq!(store.count("specialists").unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("wellness.db");
        let store = Store::open(&path).unwrap();
        assert!(path.exists());

        let mode: String = store
            .conn()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let fk: i64 = store
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
        store.close().unwrap();
    }

    #[test]
    fn test_reopen_existing_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wellness.db");
        {
            let store = Store::open(&path).unwrap();
            store
                .conn()
                .execute("INSERT INTO services (id, name) VALUES ('s1', 'Massage')", [])
                .unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.count("services").unwrap(), 1);
        assert!(store.ids("services").unwrap().contains("s1"));
    }

    #[test]
    fn test_stats_lists_every_table() {
        let store = Store::open_in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.tables.len(), schema::TABLES.len());
        assert_eq!(stats.total_rows(), 0);
        assert!(store.foreign_key_violations().unwrap().is_empty());
    }
}
