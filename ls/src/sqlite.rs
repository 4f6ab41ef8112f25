//! SQLite backend

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::backend::{CatalogSource, StateBackend};
use crate::error::{StoreError, StoreResult};
use crate::records::{AnnotationData, CursorRecord, Report, User};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id            INTEGER PRIMARY KEY,
    position      INTEGER NOT NULL,
    title         TEXT NOT NULL,
    creation_date TEXT NOT NULL,
    description   TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS users (
    user_id  INTEGER PRIMARY KEY,
    position INTEGER NOT NULL,
    name     TEXT NOT NULL,
    profile  TEXT NOT NULL DEFAULT '{}'
);
CREATE TABLE IF NOT EXISTS state (
    id            INTEGER PRIMARY KEY,
    report_id     INTEGER NOT NULL,
    user_id       INTEGER NOT NULL,
    show_tutorial INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS annotations (
    id   INTEGER PRIMARY KEY,
    data TEXT NOT NULL DEFAULT '{}'
);
"#;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Store backed by a single SQLite database file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Opening SQLite store");
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database
    pub fn open_in_memory() -> StoreResult<Self> {
        debug!("Opening in-memory SQLite store");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Replace the report catalog, keeping the given order
    pub fn replace_reports(&self, reports: &[Report]) -> StoreResult<usize> {
        debug!(count = reports.len(), "replace_reports: called");
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM reports", [])?;
        for (position, report) in reports.iter().enumerate() {
            tx.execute(
                "INSERT INTO reports (id, position, title, creation_date, description) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    report.id,
                    position as i64,
                    report.title,
                    report.creation_date.format(DATE_FORMAT).to_string(),
                    report.description
                ],
            )?;
        }
        tx.commit()?;
        info!(count = reports.len(), "Replaced report catalog");
        Ok(reports.len())
    }

    /// Replace the user catalog, keeping the given order
    pub fn replace_users(&self, users: &[User]) -> StoreResult<usize> {
        debug!(count = users.len(), "replace_users: called");
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM users", [])?;
        for (position, user) in users.iter().enumerate() {
            let profile = serde_json::to_string(&user.profile_object())?;
            tx.execute(
                "INSERT INTO users (user_id, position, name, profile) VALUES (?1, ?2, ?3, ?4)",
                params![user.user_id, position as i64, user.name, profile],
            )?;
        }
        tx.commit()?;
        info!(count = users.len(), "Replaced user catalog");
        Ok(users.len())
    }
}

impl CatalogSource for SqliteStore {
    fn reports(&self) -> StoreResult<Vec<Report>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, creation_date, description FROM reports ORDER BY position, id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut reports = Vec::new();
        for row in rows {
            let (id, title, date, description) = row?;
            let creation_date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| StoreError::Invalid {
                table: "reports",
                reason: format!("report {} has bad creation_date '{}': {}", id, date, e),
            })?;
            reports.push(Report {
                id,
                title,
                creation_date,
                description,
            });
        }
        debug!(count = reports.len(), "reports: loaded");
        Ok(reports)
    }

    fn users(&self) -> StoreResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id, name, profile FROM users ORDER BY position, user_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut users = Vec::new();
        for row in rows {
            let (user_id, name, profile) = row?;
            let profile: Map<String, Value> = serde_json::from_str(&profile)?;
            let user = User::from_parts(user_id, name, profile).map_err(|reason| StoreError::Invalid {
                table: "users",
                reason,
            })?;
            users.push(user);
        }
        debug!(count = users.len(), "users: loaded");
        Ok(users)
    }
}

impl StateBackend for SqliteStore {
    fn fetch_cursor(&self, row_id: i64) -> StoreResult<Option<CursorRecord>> {
        debug!(row_id, "fetch_cursor: called");
        let record = self
            .conn
            .query_row(
                "SELECT report_id, user_id, show_tutorial FROM state WHERE id = ?1",
                params![row_id],
                |row| {
                    Ok(CursorRecord {
                        report_id: row.get(0)?,
                        user_id: row.get(1)?,
                        show_tutorial: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    fn update_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()> {
        debug!(row_id, ?record, "update_cursor: called");
        let changed = self.conn.execute(
            "UPDATE state SET report_id = ?2, user_id = ?3, show_tutorial = ?4 WHERE id = ?1",
            params![row_id, record.report_id, record.user_id, record.show_tutorial],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { table: "state", id: row_id });
        }
        Ok(())
    }

    fn upsert_cursor(&self, row_id: i64, record: &CursorRecord) -> StoreResult<()> {
        debug!(row_id, ?record, "upsert_cursor: called");
        self.conn.execute(
            "INSERT INTO state (id, report_id, user_id, show_tutorial) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET report_id = excluded.report_id,
                 user_id = excluded.user_id, show_tutorial = excluded.show_tutorial",
            params![row_id, record.report_id, record.user_id, record.show_tutorial],
        )?;
        Ok(())
    }

    fn fetch_annotations(&self, row_id: i64) -> StoreResult<Option<AnnotationData>> {
        debug!(row_id, "fetch_annotations: called");
        let raw: Option<String> = self
            .conn
            .query_row("SELECT data FROM annotations WHERE id = ?1", params![row_id], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(text) => {
                let data: Option<AnnotationData> = serde_json::from_str(&text)?;
                Ok(Some(data.unwrap_or_default()))
            }
            None => Ok(None),
        }
    }

    fn update_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()> {
        debug!(row_id, users = data.len(), "update_annotations: called");
        let text = serde_json::to_string(data)?;
        let changed = self
            .conn
            .execute("UPDATE annotations SET data = ?2 WHERE id = ?1", params![row_id, text])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table: "annotations",
                id: row_id,
            });
        }
        Ok(())
    }

    fn upsert_annotations(&self, row_id: i64, data: &AnnotationData) -> StoreResult<()> {
        debug!(row_id, users = data.len(), "upsert_annotations: called");
        let text = serde_json::to_string(data)?;
        self.conn.execute(
            "INSERT INTO annotations (id, data) VALUES (?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data",
            params![row_id, text],
        )?;
        Ok(())
    }
}
