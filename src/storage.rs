//! Local key-value store backing persisted UI state.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

/// String-keyed, string-valued store persisted in one SQLite file.
pub struct LocalStorage {
    conn: Connection,
}

impl LocalStorage {
    /// Opens (or creates) the store at `db_path`, creating parent directories.
    pub fn open(db_path: &Path) -> Result<Self, String> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    format!(
                        "Could not create storage directory {}: {}",
                        parent.display(),
                        err
                    )
                })?;
            }
        }

        let conn = Connection::open(db_path).map_err(|err| {
            format!("Could not open local storage {}: {}", db_path.display(), err)
        })?;
        Self::with_connection(conn)
    }

    /// Opens a store that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self, String> {
        let conn = Connection::open_in_memory()
            .map_err(|err| format!("Could not open in-memory storage: {err}"))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, String> {
        let storage = Self { conn };
        storage
            .initialize_schema()
            .map_err(|err| format!("Could not initialize local storage schema: {err}"))?;
        Ok(storage)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, String> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|err| format!("Failed to read storage key {key}: {err}"))
    }

    /// Replaces the whole value stored under `key`.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT INTO local_storage (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(|err| format!("Failed to write storage key {key}: {err}"))?;
        Ok(())
    }
}
