use std::collections::BTreeMap;

use rusqlite::types::Value;

/// Old (Regularly `_id`) -> new (auto-assigned `tasks_table.id`) task identifiers.
pub type IdMap = BTreeMap<i64, i64>;

/// Midnight suffix turning a Regularly date into a `LocalDateTime` string.
pub const DISMISSED_TIME_SUFFIX: &str = "T00:00:00";

/// Seconds suffix turning a Regularly `HH:MM` into a `LocalTime` string.
pub const SECONDS_SUFFIX: &str = ":00";

/// A row of the Regularly `tasks` table.
///
/// Columns copied verbatim are kept as raw SQLite values so whatever storage
/// class the source used is written back unchanged. Missing values flow
/// through to the destination insert, where the `NOT NULL` constraints
/// reject them.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTask {
    pub id: i64,
    pub name: Value,
    pub details: Value,
    pub created: Value,
    pub firstdue: Value,
    pub period: Value,
    pub notifications_enabled: Value,
    pub lastnotified: Option<String>,
    pub notifications_time: Option<String>,
    pub notifications_period: Value,
}

/// A row of the Regularly `log` table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLogEntry {
    /// SQLite rowid, used only to point at the offending row in errors.
    pub row: i64,
    pub taskid: i64,
    pub entrydate: Value,
    pub note: Value,
}

/// A row to insert into `tasks_table`. The id is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub name: Value,
    pub description: Value,
    pub creation_date: Value,
    pub initial_due_date: Value,
    pub period: Value,
    pub notifications_enabled: Value,
    pub notification_last_dismissed: Option<String>,
    pub notification_time: Option<String>,
    pub notification_period: Value,
}

/// A row to insert into `completion_date_table`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompletion {
    pub task_id: i64,
    pub date: Value,
    pub note: Value,
}

impl SourceTask {
    /// True when the task has no explicit first due date, so the converted
    /// task falls back to its creation date.
    pub fn uses_created_fallback(&self) -> bool {
        !is_set(&self.firstdue)
    }
}

impl From<&SourceTask> for NewTask {
    fn from(task: &SourceTask) -> Self {
        Self {
            name: task.name.clone(),
            description: task.details.clone(),
            creation_date: task.created.clone(),
            initial_due_date: initial_due_date(&task.firstdue, &task.created),
            period: task.period.clone(),
            notifications_enabled: task.notifications_enabled.clone(),
            notification_last_dismissed: dismissed_at(task.lastnotified.as_deref()),
            notification_time: time_with_seconds(task.notifications_time.as_deref()),
            notification_period: task.notifications_period.clone(),
        }
    }
}

impl NewCompletion {
    pub fn from_entry(entry: &SourceLogEntry, task_id: i64) -> Self {
        Self {
            task_id,
            date: entry.entrydate.clone(),
            note: entry.note.clone(),
        }
    }
}

/// `firstdue` when set, otherwise `created`.
///
/// Regularly only stores `firstdue` when the user picked one; otherwise it
/// derives the first due date as `created + period`. Using `created` is only
/// exact for tasks that already have a completion logged.
pub fn initial_due_date(firstdue: &Value, created: &Value) -> Value {
    if is_set(firstdue) {
        firstdue.clone()
    } else {
        created.clone()
    }
}

pub fn dismissed_at(lastnotified: Option<&str>) -> Option<String> {
    present(lastnotified).map(|date| format!("{date}{DISMISSED_TIME_SUFFIX}"))
}

pub fn time_with_seconds(time: Option<&str>) -> Option<String> {
    present(time).map(|time| format!("{time}{SECONDS_SUFFIX}"))
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// NULL, zero and empty text or blobs count as unset.
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Integer(n) => *n != 0,
        Value::Real(r) => *r != 0.0,
        Value::Text(s) => !s.is_empty(),
        Value::Blob(b) => !b.is_empty(),
    }
}
