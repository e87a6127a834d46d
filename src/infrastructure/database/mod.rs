use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::application::errors::StorageError;
use crate::domain::entities::{NewSnippet, Snippet};
use crate::domain::traits::SnippetStore;

const SNIPPET_COLUMNS: &str =
    "id, from_user_uin, from_user_display, from_group, image_path, created_at, updated_at, deleted_at";

/// SQLite-backed snippet store.
///
/// Rows follow a soft-delete convention: anything with `deleted_at` set is
/// invisible to every query here. Async calls run on the blocking pool.
pub struct SqliteSnippetStore {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteSnippetStore {
    /// Open the database named by `dsn` (a file path or `:memory:`) and
    /// create the schema if needed
    pub fn open(dsn: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(dsn)?;
        let store = Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        lock_conn(&self.conn)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(StorageError::Closed)?;
        f(conn)
    }

    /// Run `f` against the connection on tokio's blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = lock_conn(&conn);
            let conn = guard.as_ref().ok_or(StorageError::Closed)?;
            f(conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    fn init_tables(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "CREATE TABLE IF NOT EXISTS snippets (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    from_user_uin INTEGER NOT NULL,
                    from_user_display TEXT NOT NULL,
                    from_group INTEGER NOT NULL,
                    image_path TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    deleted_at TEXT
                )",
                [],
            )?;

            conn.execute(
                "CREATE INDEX IF NOT EXISTS idx_snippets_deleted_at ON snippets(deleted_at)",
                [],
            )?;

            Ok(())
        })
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<RawSnippet> {
        Ok(RawSnippet {
            id: row.get(0)?,
            from_user_uin: row.get(1)?,
            from_user_display: row.get(2)?,
            from_group: row.get(3)?,
            image_path: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
            deleted_at: row.get(7)?,
        })
    }

    /// Soft-delete a row. Used for manual administration only.
    pub fn soft_delete(&self, id: i64) -> Result<bool, StorageError> {
        self.with_conn(|conn| {
            let now = Utc::now().to_rfc3339();
            let rows = conn.execute(
                "UPDATE snippets SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                rusqlite::params![now, id],
            )?;
            Ok(rows > 0)
        })
    }
}

fn lock_conn(conn: &Mutex<Option<Connection>>) -> MutexGuard<'_, Option<Connection>> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Row as stored, with timestamps still in text form
struct RawSnippet {
    id: i64,
    from_user_uin: i64,
    from_user_display: String,
    from_group: i64,
    image_path: String,
    created_at: String,
    updated_at: String,
    deleted_at: Option<String>,
}

impl RawSnippet {
    fn into_snippet(self) -> Result<Snippet, StorageError> {
        Ok(Snippet {
            id: self.id,
            from_user_uin: self.from_user_uin,
            from_user_display: self.from_user_display,
            from_group: self.from_group,
            image_path: self.image_path,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            deleted_at: self.deleted_at.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

#[async_trait]
impl SnippetStore for SqliteSnippetStore {
    async fn create(&self, snippet: NewSnippet) -> Result<Snippet, StorageError> {
        let now = Utc::now();
        let row = snippet.clone();
        let id = self
            .blocking(move |conn| {
                conn.execute(
                    "INSERT INTO snippets (from_user_uin, from_user_display, from_group, image_path, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                    rusqlite::params![
                        row.from_user_uin,
                        &row.from_user_display,
                        row.from_group,
                        &row.image_path,
                        now.to_rfc3339(),
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        Ok(Snippet {
            id,
            from_user_uin: snippet.from_user_uin,
            from_user_display: snippet.from_user_display,
            from_group: snippet.from_group,
            image_path: snippet.image_path,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM snippets WHERE deleted_at IS NULL",
                [],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
    }

    // OFFSET walks the index linearly; fine for a group's worth of snippets
    async fn nth(&self, offset: u64) -> Result<Option<Snippet>, StorageError> {
        let raw = self
            .blocking(move |conn| {
                let sql = format!(
                    "SELECT {} FROM snippets WHERE deleted_at IS NULL ORDER BY id LIMIT 1 OFFSET ?1",
                    SNIPPET_COLUMNS
                );
                let offset = i64::try_from(offset)
                    .map_err(|_| StorageError::Corrupt(format!("offset {} out of range", offset)))?;
                Ok(conn.query_row(&sql, [offset], Self::from_row).optional()?)
            })
            .await?;

        raw.map(RawSnippet::into_snippet).transpose()
    }

    async fn get(&self, id: i64) -> Result<Option<Snippet>, StorageError> {
        let raw = self
            .blocking(move |conn| {
                let sql = format!(
                    "SELECT {} FROM snippets WHERE id = ?1 AND deleted_at IS NULL",
                    SNIPPET_COLUMNS
                );
                Ok(conn.query_row(&sql, [id], Self::from_row).optional()?)
            })
            .await?;

        raw.map(RawSnippet::into_snippet).transpose()
    }

    async fn close(&self) -> Result<(), StorageError> {
        let conn = self.lock().take();
        match conn {
            Some(conn) => conn.close().map_err(|(_, e)| StorageError::Database(e)),
            None => Ok(()),
        }
    }
}
