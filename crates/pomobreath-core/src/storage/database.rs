//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed focus and break sessions
//! - Recently used focus tasks
//! - Session statistics (daily and all-time)
//! - Key-value store for application state

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::dispatch::SessionRecorder;
use crate::error::{DatabaseError, Result, ValidationError};
use crate::session::CompletedSession;
use crate::timer::PhaseKind;

const DEFAULT_KEEP_COUNT: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_sessions: u64,
    pub work_sessions: u64,
    pub break_sessions: u64,
    pub total_work_secs: u64,
    pub total_break_secs: u64,
    pub today_work_sessions: u64,
    pub today_work_secs: u64,
}

/// A task title remembered for the focus timer's picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusTask {
    pub id: Uuid,
    pub title: String,
    pub last_used: DateTime<Utc>,
}

/// SQLite database for session storage.
///
/// Stores completed sessions and focus tasks, and provides statistics.
/// History is capped at `keep_count` sessions after each recorded one.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    keep_count: u32,
}

// Fixed-width UTC timestamps so text comparison matches time order.
fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn start_of_today() -> String {
    format!("{}T00:00:00.000Z", Utc::now().format("%Y-%m-%d"))
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_time(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_id(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<CompletedSession> {
    let phase_raw: String = row.get(1)?;
    let phase = PhaseKind::parse(&phase_raw).ok_or_else(|| {
        conversion_error(
            1,
            DatabaseError::QueryFailed(format!("unknown phase '{phase_raw}'")),
        )
    })?;
    Ok(CompletedSession {
        id: parse_id(row, 0)?,
        phase,
        label: row.get(2)?,
        started_at: parse_time(row, 3)?,
        ended_at: parse_time(row, 4)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<FocusTask> {
    Ok(FocusTask {
        id: parse_id(row, 0)?,
        title: row.get(1)?,
        last_used: parse_time(row, 2)?,
    })
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data dir>/pomobreath.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("pomobreath.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn,
            keep_count: DEFAULT_KEEP_COUNT,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn with_keep_count(mut self, keep_count: u32) -> Self {
        self.keep_count = keep_count;
        self
    }

    pub fn keep_count(&self) -> u32 {
        self.keep_count
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    id            TEXT PRIMARY KEY,
                    phase         TEXT NOT NULL,
                    label         TEXT,
                    started_at    TEXT NOT NULL,
                    ended_at      TEXT NOT NULL,
                    duration_secs INTEGER NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id        TEXT PRIMARY KEY,
                    title     TEXT NOT NULL,
                    last_used TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at);
                CREATE INDEX IF NOT EXISTS idx_sessions_phase_ended_at ON sessions(phase, ended_at);
                CREATE UNIQUE INDEX IF NOT EXISTS idx_tasks_title ON tasks(title COLLATE NOCASE);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    /// Record a completed session to the database.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(&self, session: &CompletedSession) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (id, phase, label, started_at, ended_at, duration_secs)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id.to_string(),
                session.phase.as_str(),
                session.label,
                stamp(session.started_at),
                stamp(session.ended_at),
                session.duration_secs(),
            ],
        )?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn list_sessions(&self, limit: usize, include_breaks: bool) -> Result<Vec<CompletedSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, phase, label, started_at, ended_at
             FROM sessions
             WHERE ?2 OR phase <> 'break'
             ORDER BY ended_at DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit, include_breaks], session_from_row)?;
        let sessions = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    /// Returns whether a session with `id` existed.
    pub fn delete_session(&self, id: Uuid) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM sessions WHERE id = ?1", params![id.to_string()])?;
        Ok(n > 0)
    }

    pub fn clear_history(&self) -> Result<usize> {
        Ok(self.conn.execute("DELETE FROM sessions", [])?)
    }

    /// Drop all but the `keep` most recent sessions. Returns how many were removed.
    pub fn trim_history(&self, keep: u32) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM sessions WHERE id NOT IN (
                SELECT id FROM sessions ORDER BY ended_at DESC LIMIT ?1
            )",
            params![keep],
        )?;
        if removed > 0 {
            tracing::debug!(removed, keep, "trimmed session history");
        }
        Ok(removed)
    }

    fn aggregate(&self, since: Option<&str>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT phase, COUNT(*), COALESCE(SUM(duration_secs), 0)
             FROM sessions
             WHERE ?1 IS NULL OR ended_at >= ?1
             GROUP BY phase",
        )?;
        let rows = stmt.query_map(params![since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u64>(1)?,
                row.get::<_, u64>(2)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (phase, count, secs) = row?;
            stats.total_sessions += count;
            match PhaseKind::parse(&phase) {
                Some(PhaseKind::Work) => {
                    stats.work_sessions += count;
                    stats.total_work_secs += secs;
                }
                Some(PhaseKind::Break) => {
                    stats.break_sessions += count;
                    stats.total_break_secs += secs;
                }
                _ => {}
            }
        }
        Ok(stats)
    }

    pub fn stats_today(&self) -> Result<Stats> {
        let mut stats = self.aggregate(Some(&start_of_today()))?;
        stats.today_work_sessions = stats.work_sessions;
        stats.today_work_secs = stats.total_work_secs;
        Ok(stats)
    }

    pub fn stats_all(&self) -> Result<Stats> {
        let today = self.aggregate(Some(&start_of_today()))?;
        let mut stats = self.aggregate(None)?;
        stats.today_work_sessions = today.work_sessions;
        stats.today_work_secs = today.total_work_secs;
        Ok(stats)
    }

    /// Remember `title`, reusing an existing task that matches ignoring case.
    pub fn add_task(&self, title: &str) -> Result<FocusTask> {
        self.add_task_at(title, Utc::now())
    }

    pub fn add_task_at(&self, title: &str, now: DateTime<Utc>) -> Result<FocusTask> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "task.title".into(),
                message: "title must not be empty".into(),
            }
            .into());
        }

        let existing = self
            .conn
            .query_row(
                "SELECT id, title, last_used FROM tasks WHERE title = ?1 COLLATE NOCASE",
                params![title],
                task_from_row,
            )
            .optional()?;

        let task = match existing {
            Some(task) => FocusTask {
                last_used: now,
                ..task
            },
            None => FocusTask {
                id: Uuid::new_v4(),
                title: title.to_string(),
                last_used: now,
            },
        };
        self.conn.execute(
            "INSERT OR REPLACE INTO tasks (id, title, last_used) VALUES (?1, ?2, ?3)",
            params![task.id.to_string(), task.title, stamp(task.last_used)],
        )?;
        Ok(task)
    }

    /// Mark a task as just used. Returns whether it exists.
    pub fn touch_task(&self, id: Uuid) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE tasks SET last_used = ?2 WHERE id = ?1",
            params![id.to_string(), stamp(Utc::now())],
        )?;
        Ok(n > 0)
    }

    /// Most recently used first.
    pub fn list_tasks(&self) -> Result<Vec<FocusTask>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, last_used FROM tasks ORDER BY last_used DESC")?;
        let tasks = stmt
            .query_map([], task_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn delete_task(&self, id: Uuid) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;
        Ok(n > 0)
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}

impl SessionRecorder for Database {
    fn record(&mut self, session: &CompletedSession) -> Result<()> {
        self.record_session(session)?;
        if let (PhaseKind::Work, Some(label)) = (session.phase, session.label.as_deref()) {
            if !label.trim().is_empty() {
                self.add_task_at(label, session.ended_at)?;
            }
        }
        self.trim_history(self.keep_count)?;
        Ok(())
    }
}
