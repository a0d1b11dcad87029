use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};

use crate::error::Result;
use crate::model::{NewCompletion, NewTask};

/// `user_version` matching the tables created by [`RoomDb::create_tables`].
///
/// Android reads an unset `user_version` as 0, and Room treats a version 0
/// database as pre-populated at the *latest* schema, skipping its migrations.
pub const SCHEMA_VERSION: i64 = 1;

/// Identity hash Room exported for schema version 1. It is not derived from
/// the DDL below; both must change together.
pub const IDENTITY_HASH: &str = "c37f072b888bfa933f5d70598636d779";

/// Fixed primary key Room uses for its single `room_master_table` row.
pub const ROOM_MASTER_ID: i64 = 42;

pub const LOCALE: &str = "en_US";

pub const TASKS_TABLE: &str = "tasks_table";
pub const COMPLETIONS_TABLE: &str = "completion_date_table";

const CREATE_TASKS_TABLE: &str = "CREATE TABLE IF NOT EXISTS `tasks_table` (`id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, `name` TEXT NOT NULL, `description` TEXT NOT NULL, `creationDate` TEXT NOT NULL, `initialDueDate` TEXT NOT NULL, `period` INTEGER NOT NULL, `notificationsEnabled` INTEGER NOT NULL, `notificationLastDismissed` TEXT, `notificationTime` TEXT, `notificationPeriod` INTEGER)";

const CREATE_COMPLETIONS_TABLE: &str = "CREATE TABLE IF NOT EXISTS `completion_date_table` (`id` INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL, `taskId` INTEGER NOT NULL, `date` TEXT NOT NULL, `note` TEXT)";

const CREATE_ANDROID_METADATA: &str = "CREATE TABLE IF NOT EXISTS android_metadata (locale TEXT)";

const CREATE_ROOM_MASTER: &str =
    "CREATE TABLE IF NOT EXISTS room_master_table (id INTEGER PRIMARY KEY,identity_hash TEXT)";

/// Write handle on a freshly created Flexible Todos (Room) database.
pub struct RoomDb {
    conn: Connection,
}

impl RoomDb {
    /// Create the database at `path`, discarding anything already there.
    ///
    /// The default rollback journal is kept so the finished file is
    /// self-contained and can be copied onto a device as-is.
    pub fn create(path: &Path) -> Result<Self> {
        remove_existing(path)?;
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Expose the raw connection (for tests or advanced usage).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            "{CREATE_ANDROID_METADATA};
             {CREATE_TASKS_TABLE};
             {CREATE_COMPLETIONS_TABLE};
             {CREATE_ROOM_MASTER};"
        ))?;
        Ok(())
    }

    /// Insert the locale row Android expects and Room's identity row.
    pub fn write_metadata(&self) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO android_metadata (locale) VALUES (?1)",
            params![LOCALE],
        )?;
        self.conn.execute(
            "INSERT OR REPLACE INTO room_master_table (id, identity_hash) VALUES (?1, ?2)",
            params![ROOM_MASTER_ID, IDENTITY_HASH],
        )?;
        Ok(())
    }

    /// Insert a task and return the id SQLite assigned to it.
    pub fn insert_task(&self, task: &NewTask) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tasks_table (name, description, creationDate, initialDueDate, period,
                notificationsEnabled, notificationLastDismissed, notificationTime, notificationPeriod)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                task.name,
                task.description,
                task.creation_date,
                task.initial_due_date,
                task.period,
                task.notifications_enabled,
                task.notification_last_dismissed,
                task.notification_time,
                task.notification_period,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert a completion and return the id SQLite assigned to it.
    pub fn insert_completion(&self, completion: &NewCompletion) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO completion_date_table (taskId, date, note) VALUES (?1, ?2, ?3)",
            params![completion.task_id, completion.date, completion.note],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn set_user_version(&self, version: i64) -> Result<()> {
        self.conn.pragma_update(None, "user_version", version)?;
        Ok(())
    }

    pub fn user_version(&self) -> Result<i64> {
        let version = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    pub fn identity_hash(&self) -> Result<Option<String>> {
        let hash = self.conn.query_row(
            "SELECT identity_hash FROM room_master_table WHERE id = ?1",
            params![ROOM_MASTER_ID],
            |row| row.get(0),
        )?;
        Ok(hash)
    }

    pub fn count_tasks(&self) -> Result<usize> {
        self.count(TASKS_TABLE)
    }

    pub fn count_completions(&self) -> Result<usize> {
        self.count(COMPLETIONS_TABLE)
    }

    fn count(&self, table: &str) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })?;
        Ok(n as usize)
    }
}

/// Remove a previous output and any journal files SQLite left beside it.
fn remove_existing(path: &Path) -> Result<()> {
    let mut stale = vec![path.to_path_buf()];
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        stale.push(PathBuf::from(name));
    }
    for file in stale {
        if file.is_file() {
            fs::remove_file(&file)?;
        }
    }
    Ok(())
}
