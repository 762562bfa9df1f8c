use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::CoreError;
use crate::migrations::MIGRATIONS;
use crate::storage::StorageBackend;

/// SQLite-backed key/value storage for annotation state.
pub struct SqliteStorage {
    pub path: Option<PathBuf>,
    pub conn: Connection,
}

pub fn open_store(path: impl AsRef<Path>) -> Result<SqliteStorage, CoreError> {
    let path = path.as_ref().to_path_buf();
    let conn = Connection::open(&path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; \
         PRAGMA synchronous = NORMAL; \
         PRAGMA temp_store = MEMORY;",
    )?;
    apply_migrations(&conn)?;
    Ok(SqliteStorage {
        path: Some(path),
        conn,
    })
}

pub fn open_in_memory_store() -> Result<SqliteStorage, CoreError> {
    let conn = Connection::open_in_memory()?;
    apply_migrations(&conn)?;
    Ok(SqliteStorage { path: None, conn })
}

pub fn apply_migrations(conn: &Connection) -> Result<(), CoreError> {
    let current_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let mut version = current_version as usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let next_version = idx + 1;
        if next_version <= version {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", next_version))?;
        version = next_version;
    }
    Ok(())
}

impl SqliteStorage {
    pub fn list_keys(&self, prefix: &str) -> Result<Vec<String>, CoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM kv_store \
             WHERE substr(key, 1, length(?1)) = ?1 \
             ORDER BY updated_at DESC, key ASC;",
        )?;
        let rows = stmt.query_map(params![prefix], |row| row.get::<_, String>(0))?;
        Ok(rows.filter_map(Result::ok).collect())
    }
}

impl StorageBackend for SqliteStorage {
    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        self.conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(CoreError::from)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .execute(
                "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at;",
                params![key, value, now],
            )
            .map_err(|e| CoreError::StorageWrite(e.to_string()))?;
        Ok(())
    }
}
