mod item;
mod schema;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AppConfig;

pub use item::{iso_timestamp, ContentKind, HistoryDraft, HistoryItem, NewHistoryItem};

#[derive(Debug, Error)]
pub enum DbError {
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("failed to write history: {0}")]
    Write(#[source] rusqlite::Error),
    #[error("failed to read history: {0}")]
    Read(#[source] rusqlite::Error),
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DbError {
    fn unavailable(err: impl fmt::Display) -> Self {
        DbError::StorageUnavailable(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaState {
    Uninitialized,
    Initializing,
    Ready,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub items: Vec<HistoryItem>,
    pub total: i64,
    pub next_offset: Option<i64>,
}

#[derive(Debug, Clone)]
enum Location {
    File(PathBuf),
    Memory,
}

/// Owner of the on-device history database.
///
/// Nothing touches storage until [`Database::initialize`] runs; every other
/// operation fails with [`DbError::StorageUnavailable`] until then.
pub struct Database {
    location: Location,
    conn: OnceCell<Mutex<Connection>>,
    initializing: AtomicBool,
}

const HISTORY_COLUMNS: &str = "
    id,
    type,
    subCategory,
    content,
    templateIndex,
    createdAt,
    imageData
";

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_location(Location::File(path.into()))
    }

    /// Database file under `dir` using the configured process-wide name.
    pub fn in_dir(dir: &Path, config: &AppConfig) -> Self {
        Self::new(dir.join(&config.database_file_name))
    }

    pub fn in_memory() -> Self {
        Self::with_location(Location::Memory)
    }

    fn with_location(location: Location) -> Self {
        Self {
            location,
            conn: OnceCell::new(),
            initializing: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.location {
            Location::File(path) => Some(path),
            Location::Memory => None,
        }
    }

    pub fn state(&self) -> SchemaState {
        if self.conn.get().is_some() {
            SchemaState::Ready
        } else if self.initializing.load(Ordering::Acquire) {
            SchemaState::Initializing
        } else {
            SchemaState::Uninitialized
        }
    }

    /// Opens or creates the database file and ensures the schema exists.
    /// Calling it again once ready is a no-op.
    pub fn initialize(&self) -> Result<(), DbError> {
        self.conn.get_or_try_init(|| {
            self.initializing.store(true, Ordering::Release);
            let opened = self.open_connection();
            self.initializing.store(false, Ordering::Release);
            opened.map(Mutex::new)
        })?;
        Ok(())
    }

    fn open_connection(&self) -> Result<Connection, DbError> {
        let conn = match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).map_err(DbError::unavailable)?;
                }
                Connection::open(path).map_err(DbError::unavailable)?
            }
            Location::Memory => Connection::open_in_memory().map_err(DbError::unavailable)?,
        };
        prepare_schema(&conn).map_err(DbError::unavailable)?;
        info!(path = ?self.path(), "history database ready");
        Ok(conn)
    }

    /// Live connection for privileged internal operations.
    pub(crate) fn handle(&self) -> Result<MutexGuard<'_, Connection>, DbError> {
        let conn = self.conn.get().ok_or_else(|| {
            DbError::StorageUnavailable("history database is not initialized".to_string())
        })?;
        conn.lock()
            .map_err(|_| DbError::StorageUnavailable("database lock poisoned".to_string()))
    }

    pub fn insert_history_item(&self, item: &NewHistoryItem) -> Result<HistoryItem, DbError> {
        let conn = self.handle()?;
        conn.execute(
            "
            INSERT INTO history_v2 (
                type,
                subCategory,
                content,
                templateIndex,
                createdAt,
                imageData
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                item.kind.as_str(),
                item.sub_category,
                item.content,
                item.template_index,
                item.created_at,
                item.image_data,
            ],
        )
        .map_err(DbError::Write)?;
        let id = conn.last_insert_rowid();
        debug!(id, kind = %item.kind, "saved history item");
        get_history_item(&conn, id).map_err(DbError::Write)
    }

    /// Newest rows first, ties broken by the higher id.
    pub fn list_history(&self, limit: i64) -> Result<Vec<HistoryItem>, DbError> {
        let limit = limit.max(1);
        let conn = self.handle()?;
        let items = query_history(&conn, limit, 0).map_err(DbError::Read)?;
        debug!(count = items.len(), "loaded history");
        Ok(items)
    }

    pub fn list_history_page(&self, limit: i64, offset: i64) -> Result<HistoryPage, DbError> {
        let limit = limit.max(1);
        let offset = offset.max(0);
        let conn = self.handle()?;

        let items = query_history(&conn, limit, offset).map_err(DbError::Read)?;
        let total = count_rows(&conn).map_err(DbError::Read)?;
        let end = offset.saturating_add(limit);
        let next_offset = if end < total { Some(end) } else { None };

        Ok(HistoryPage {
            items,
            total,
            next_offset,
        })
    }

    pub fn count_history(&self) -> Result<i64, DbError> {
        let conn = self.handle()?;
        count_rows(&conn).map_err(DbError::Read)
    }

    pub fn delete_all_history(&self) -> Result<usize, DbError> {
        let conn = self.handle()?;
        let deleted = conn
            .execute("DELETE FROM history_v2", [])
            .map_err(DbError::Read)?;
        info!(deleted, "history cleared");
        Ok(deleted)
    }
}

fn query_history(
    conn: &Connection,
    limit: i64,
    offset: i64,
) -> Result<Vec<HistoryItem>, rusqlite::Error> {
    let mut stmt = conn.prepare_cached(&format!(
        "
        SELECT {HISTORY_COLUMNS}
        FROM history_v2
        ORDER BY createdAt DESC, id DESC
        LIMIT ?1 OFFSET ?2
        "
    ))?;
    let rows = stmt.query_map(params![limit, offset], history_item_from_row)?;
    rows.collect()
}

fn count_rows(conn: &Connection) -> Result<i64, rusqlite::Error> {
    conn.query_row("SELECT COUNT(*) FROM history_v2", [], |row| row.get(0))
}

fn get_history_item(conn: &Connection, id: i64) -> Result<HistoryItem, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {HISTORY_COLUMNS} FROM history_v2 WHERE id = ?1"),
        params![id],
        history_item_from_row,
    )
}

fn history_item_from_row(row: &Row<'_>) -> Result<HistoryItem, rusqlite::Error> {
    let kind: Option<String> = row.get(1)?;
    Ok(HistoryItem {
        id: row.get(0)?,
        kind: kind
            .as_deref()
            .map(ContentKind::from_tag)
            .unwrap_or(ContentKind::Unknown),
        sub_category: row.get(2)?,
        content: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        template_index: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
        created_at: row.get(5)?,
        image_data: row.get(6)?,
    })
}

fn prepare_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        ",
    )?;

    conn.execute_batch(schema::CREATE_HISTORY_TABLE)?;
    conn.execute_batch(schema::CREATE_INDEX_CREATED_AT)?;
    migrate_legacy_history(conn)?;
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![table],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, rusqlite::Error> {
    let mut columns = HashSet::new();
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for row in rows {
        columns.insert(row?);
    }
    Ok(columns)
}

/// Moves rows from the narrow legacy `history` table into `history_v2` and
/// drops the legacy table. Legacy ids are kept; a legacy row whose id is
/// already taken in `history_v2` is skipped and counted in the log. Other
/// legacy tables are left alone.
fn migrate_legacy_history(conn: &Connection) -> Result<usize, rusqlite::Error> {
    if !table_exists(conn, schema::LEGACY_HISTORY_TABLE)? {
        return Ok(0);
    }

    let legacy_columns = table_columns(conn, schema::LEGACY_HISTORY_TABLE)?;
    let has_id = legacy_columns.contains("id");

    let mut targets = Vec::with_capacity(schema::LEGACY_COLUMN_FALLBACKS.len() + 1);
    let mut sources = Vec::with_capacity(schema::LEGACY_COLUMN_FALLBACKS.len() + 1);
    if has_id {
        targets.push("id".to_string());
        sources.push("id".to_string());
    }
    for (column, fallback) in schema::LEGACY_COLUMN_FALLBACKS {
        targets.push(column.to_string());
        if legacy_columns.contains(column) {
            sources.push(format!("COALESCE({column}, {fallback})"));
        } else {
            sources.push(fallback.to_string());
        }
    }
    let order = if has_id {
        "ORDER BY id ASC"
    } else {
        "ORDER BY rowid ASC"
    };

    let tx = conn.unchecked_transaction()?;
    let legacy_rows: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM {}", schema::LEGACY_HISTORY_TABLE),
        [],
        |row| row.get(0),
    )?;
    let moved = tx.execute(
        &format!(
            "INSERT OR IGNORE INTO history_v2 ({}) SELECT {} FROM {} {order}",
            targets.join(", "),
            sources.join(", "),
            schema::LEGACY_HISTORY_TABLE
        ),
        [],
    )?;
    tx.execute_batch(&format!("DROP TABLE {};", schema::LEGACY_HISTORY_TABLE))?;
    tx.commit()?;

    let skipped = legacy_rows - moved as i64;
    if skipped > 0 {
        warn!(skipped, "legacy history rows skipped, ids already in use");
    }
    info!(moved, "migrated legacy history table");
    Ok(moved)
}
