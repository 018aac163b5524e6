//! SQLite-backed status store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};

use super::{
    CreateMediaRequest, DerivedArtifacts, MediaFilter, MediaItem, MediaStore, ProcessingStatus,
    StatusUpdate, StoreError,
};

const SELECT_COLUMNS: &str = "SELECT id, source_url, title, artifacts, status, last_error, retry_count, created_at, updated_at FROM media_items";

/// SQLite-backed status store.
pub struct SqliteMediaStore {
    conn: Mutex<Connection>,
}

fn db_err(e: rusqlite::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    // Fixed-width nanosecond timestamps sort lexicographically in time order.
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

impl SqliteMediaStore {
    /// Create a new SQLite store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media_items (
                id TEXT PRIMARY KEY,
                source_url TEXT NOT NULL,
                title TEXT,
                artifacts TEXT NOT NULL DEFAULT '{}',
                status TEXT NOT NULL,
                last_error TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_media_status_created ON media_items(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_media_created_at ON media_items(created_at);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &MediaFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(status) = filter.status {
            conditions.push("status = ?");
            params.push(Box::new(status.as_str().to_string()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<MediaItem> {
        let id: String = row.get(0)?;
        let source_url: String = row.get(1)?;
        let title: Option<String> = row.get(2)?;
        let artifacts_json: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let last_error: Option<String> = row.get(5)?;
        let retry_count: u32 = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        let updated_at_str: String = row.get(8)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let artifacts: DerivedArtifacts = serde_json::from_str(&artifacts_json).unwrap_or_default();

        let status = ProcessingStatus::parse(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("unknown status '{}'", status_str).into(),
            )
        })?;

        Ok(MediaItem {
            id,
            source_url,
            title,
            artifacts,
            status,
            last_error,
            retry_count,
            created_at,
            updated_at,
        })
    }

    fn query_items(
        conn: &Connection,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<MediaItem>, StoreError> {
        let mut stmt = conn.prepare(sql).map_err(db_err)?;
        let rows = stmt.query_map(params, Self::row_to_item).map_err(db_err)?;

        let mut items = Vec::new();
        for row_result in rows {
            items.push(row_result.map_err(db_err)?);
        }
        Ok(items)
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Option<MediaItem>, StoreError> {
        let sql = format!("{} WHERE id = ?", SELECT_COLUMNS);
        match conn.query_row(&sql, params![id], Self::row_to_item) {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }
}

impl MediaStore for SqliteMediaStore {
    fn create(&self, request: CreateMediaRequest) -> Result<MediaItem, StoreError> {
        let conn = self.conn()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let artifacts = DerivedArtifacts::default();
        let artifacts_json = serde_json::to_string(&artifacts)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.execute(
            "INSERT INTO media_items (id, source_url, title, artifacts, status, last_error, retry_count, created_at, updated_at) VALUES (?, ?, ?, ?, ?, NULL, 0, ?, ?)",
            params![
                id,
                request.source_url,
                request.title,
                artifacts_json,
                ProcessingStatus::Pending.as_str(),
                timestamp(&now),
                timestamp(&now),
            ],
        )
        .map_err(db_err)?;

        Ok(MediaItem {
            id,
            source_url: request.source_url,
            title: request.title,
            artifacts,
            status: ProcessingStatus::Pending,
            last_error: None,
            retry_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<MediaItem>, StoreError> {
        let conn = self.conn()?;
        Self::fetch(&conn, id)
    }

    fn get_pending(&self, limit: usize) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "{} WHERE status = ? ORDER BY created_at ASC, rowid ASC LIMIT ?",
            SELECT_COLUMNS
        );
        let status = ProcessingStatus::Pending.as_str();
        let limit = limit as i64;
        let params: [&dyn rusqlite::ToSql; 2] = [&status, &limit];
        Self::query_items(&conn, &sql, &params)
    }

    fn list_all(&self) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("{} ORDER BY created_at ASC, rowid ASC", SELECT_COLUMNS);
        Self::query_items(&conn, &sql, &[])
    }

    fn list(&self, filter: &MediaFilter) -> Result<Vec<MediaItem>, StoreError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!(
            "{} {} ORDER BY created_at ASC, rowid ASC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();
        Self::query_items(&conn, &sql, param_refs.as_slice())
    }

    fn count(&self, filter: &MediaFilter) -> Result<i64, StoreError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);
        let sql = format!("SELECT COUNT(*) FROM media_items {}", where_clause);
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        conn.query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(db_err)
    }

    fn update_status(&self, id: &str, update: StatusUpdate) -> Result<MediaItem, StoreError> {
        let conn = self.conn()?;

        let current = Self::fetch(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !current.status.can_transition_to(update.status) {
            return Err(StoreError::InvalidTransition {
                media_id: id.to_string(),
                from: current.status,
                to: update.status,
            });
        }

        let artifacts = update.artifacts.unwrap_or(current.artifacts);
        let artifacts_json = serde_json::to_string(&artifacts)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let retry_count = if update.count_retry {
            current.retry_count + 1
        } else {
            current.retry_count
        };
        let now = Utc::now();

        conn.execute(
            "UPDATE media_items SET status = ?, artifacts = ?, last_error = ?, retry_count = ?, updated_at = ? WHERE id = ?",
            params![
                update.status.as_str(),
                artifacts_json,
                update.last_error,
                retry_count,
                timestamp(&now),
                id
            ],
        )
        .map_err(db_err)?;

        Ok(MediaItem {
            artifacts,
            status: update.status,
            last_error: update.last_error,
            retry_count,
            updated_at: now,
            ..current
        })
    }
}
