use std::path::Path;

use rusqlite::{Connection, OpenFlags, Row};

use crate::error::{ConvertError, Result};
use crate::model::{SourceLogEntry, SourceTask};

/// Read-only handle on a Regularly database.
pub struct RegularlyDb {
    conn: Connection,
}

impl RegularlyDb {
    /// Open an existing Regularly database without ever writing to it.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConvertError::SourceNotFound(path.to_path_buf()));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection (tests build sources in memory).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// All rows of `tasks`, in the order SQLite yields them.
    pub fn tasks(&self) -> Result<Vec<SourceTask>> {
        let mut stmt = self.conn.prepare(
            "SELECT _id, name, details, created, firstdue, period, notifications_enabled,
                    lastnotified, notifications_time, notifications_period
             FROM tasks",
        )?;
        let rows = stmt
            .query_map([], row_to_task)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// All rows of `log`, in the order SQLite yields them.
    pub fn log_entries(&self) -> Result<Vec<SourceLogEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT rowid, taskid, entrydate, note FROM log")?;
        let rows = stmt
            .query_map([], row_to_log_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<SourceTask> {
    Ok(SourceTask {
        id: row.get("_id")?,
        name: row.get("name")?,
        details: row.get("details")?,
        created: row.get("created")?,
        firstdue: row.get("firstdue")?,
        period: row.get("period")?,
        notifications_enabled: row.get("notifications_enabled")?,
        lastnotified: row.get("lastnotified")?,
        notifications_time: row.get("notifications_time")?,
        notifications_period: row.get("notifications_period")?,
    })
}

fn row_to_log_entry(row: &Row<'_>) -> rusqlite::Result<SourceLogEntry> {
    Ok(SourceLogEntry {
        row: row.get(0)?,
        taskid: row.get("taskid")?,
        entrydate: row.get("entrydate")?,
        note: row.get("note")?,
    })
}
