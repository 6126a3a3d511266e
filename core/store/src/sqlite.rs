//! SQLite-backed vault store.
//!
//! One database file per vault, two tables: `passwords` holds the
//! credential records with ciphertext and IV as BLOB columns, and
//! `app_settings` holds the key-value settings (master hash and salt).

use chrono::Local;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::record::CredentialRecord;
use crate::{RecordStore, SettingsStore, StoreBackup};
use strongbox_common::{Error, Result};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS passwords (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    website TEXT,
    username TEXT NOT NULL,
    encrypted_password BLOB NOT NULL,
    encryption_iv BLOB NOT NULL,
    category TEXT DEFAULT 'General',
    notes TEXT,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// SQLite-backed vault store.
pub struct SqliteStore {
    conn: Connection,
    /// Backing file, `None` for in-memory connections.
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a vault database at the given path.
    ///
    /// # Postconditions
    /// - Schema exists
    /// - Store is ready for settings and record operations
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(sql_err)?;
        conn.execute_batch(SCHEMA).map_err(sql_err)?;
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Open a fresh in-memory database. Backup is unavailable.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(sql_err)?;
        conn.execute_batch(SCHEMA).map_err(sql_err)?;
        Ok(Self { conn, path: None })
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
        Ok(CredentialRecord {
            id: row.get("id")?,
            title: row.get("title")?,
            website: row.get::<_, Option<String>>("website")?.unwrap_or_default(),
            username: row.get("username")?,
            ciphertext: row.get("encrypted_password")?,
            iv: row.get("encryption_iv")?,
            category: row
                .get::<_, Option<String>>("category")?
                .unwrap_or_else(|| "General".to_string()),
            notes: row.get::<_, Option<String>>("notes")?.unwrap_or_default(),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn query_records(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<CredentialRecord>> {
        let mut stmt = self.conn.prepare(sql).map_err(sql_err)?;
        let rows = stmt
            .query_map(params, Self::row_to_record)
            .map_err(sql_err)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(sql_err)?);
        }
        Ok(records)
    }
}

fn sql_err(e: rusqlite::Error) -> Error {
    Error::Storage(e.to_string())
}

impl SettingsStore for SqliteStore {
    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        use rusqlite::OptionalExtension;
        self.conn
            .query_row(
                "SELECT value FROM app_settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(sql_err)
    }

    fn set_setting(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO app_settings (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(sql_err)?;
        Ok(())
    }
}

impl RecordStore for SqliteStore {
    fn list_all_records(&self) -> Result<Vec<CredentialRecord>> {
        self.query_records("SELECT * FROM passwords ORDER BY title ASC", &[])
    }

    fn add_record(&mut self, record: &CredentialRecord) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO passwords (title, website, username, encrypted_password, \
                 encryption_iv, category, notes, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.title,
                    record.website,
                    record.username,
                    record.ciphertext,
                    record.iv,
                    record.category,
                    record.notes,
                    record.created_at,
                    record.updated_at,
                ],
            )
            .map_err(sql_err)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_record(&mut self, record: &CredentialRecord) -> Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE passwords SET title = ?1, website = ?2, username = ?3, \
                 encrypted_password = ?4, encryption_iv = ?5, category = ?6, \
                 notes = ?7, updated_at = ?8 WHERE id = ?9",
                params![
                    record.title,
                    record.website,
                    record.username,
                    record.ciphertext,
                    record.iv,
                    record.category,
                    record.notes,
                    record.updated_at,
                    record.id,
                ],
            )
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No record with id {}", record.id)));
        }
        Ok(())
    }

    fn delete_record(&mut self, id: i64) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM passwords WHERE id = ?1", params![id])
            .map_err(sql_err)?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No record with id {}", id)));
        }
        Ok(())
    }

    fn search_records(&self, query: &str) -> Result<Vec<CredentialRecord>> {
        let pattern = format!("%{}%", query);
        self.query_records(
            "SELECT * FROM passwords WHERE title LIKE ?1 OR website LIKE ?1 \
             OR username LIKE ?1 ORDER BY title ASC",
            &[&pattern as &dyn rusqlite::ToSql],
        )
    }
}

impl StoreBackup for SqliteStore {
    fn backup(&self) -> Result<String> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| Error::Backup("In-memory database cannot be backed up".to_string()))?;

        let timestamp = Local::now().format("%Y%m%d%H%M%S");
        let backup_path = format!("{}.bak.{}", path.display(), timestamp);
        std::fs::copy(path, &backup_path)
            .map_err(|e| Error::Backup(format!("Failed to copy database: {}", e)))?;

        info!(backup = %backup_path, "Database backup created");
        Ok(backup_path)
    }
}
