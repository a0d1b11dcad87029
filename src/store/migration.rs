use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ConvertError, Result};
use crate::model::{IdMap, NewCompletion, NewTask};
use crate::store::regularly::RegularlyDb;
use crate::store::room::{RoomDb, SCHEMA_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub tasks_migrated: usize,
    pub log_entries_migrated: usize,
    /// Tasks whose initial due date fell back to their creation date.
    pub created_fallbacks: usize,
    pub user_version: i64,
    /// Row counts read back from the finished destination.
    pub destination_tasks: usize,
    pub destination_completions: usize,
    pub identity_hash: Option<String>,
    #[serde(skip)]
    pub id_map: IdMap,
}

/// What a conversion would do, computed from the source alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preflight {
    pub task_count: usize,
    pub log_count: usize,
    pub created_fallbacks: Vec<i64>,
    /// `(log row, missing task id)` pairs that would abort a real run.
    pub dangling_log_entries: Vec<(i64, i64)>,
}

impl Preflight {
    pub fn is_clean(&self) -> bool {
        self.dangling_log_entries.is_empty()
    }
}

/// Convert `source` into the empty database behind `dest`.
///
/// Runs schema creation, the task pass, the log pass and the version stamp in
/// that order. Nothing is rolled back on failure.
pub fn run(source: &RegularlyDb, dest: &RoomDb) -> Result<MigrationSummary> {
    initialize_schema(dest)?;
    let (id_map, created_fallbacks) = migrate_tasks_counting(source, dest)?;
    let log_entries_migrated = migrate_log(source, dest, &id_map)?;
    stamp_version(dest)?;

    Ok(MigrationSummary {
        tasks_migrated: id_map.len(),
        log_entries_migrated,
        created_fallbacks,
        user_version: dest.user_version()?,
        destination_tasks: dest.count_tasks()?,
        destination_completions: dest.count_completions()?,
        identity_hash: dest.identity_hash()?,
        id_map,
    })
}

pub fn initialize_schema(dest: &RoomDb) -> Result<()> {
    dest.create_tables()?;
    dest.write_metadata()?;
    debug!("destination schema created");
    Ok(())
}

/// Copy every source task and return the old -> new id map.
pub fn migrate_tasks(source: &RegularlyDb, dest: &RoomDb) -> Result<IdMap> {
    migrate_tasks_counting(source, dest).map(|(id_map, _)| id_map)
}

fn migrate_tasks_counting(source: &RegularlyDb, dest: &RoomDb) -> Result<(IdMap, usize)> {
    let tasks = source.tasks()?;
    let mut id_map = IdMap::new();
    let mut created_fallbacks = 0;

    for task in &tasks {
        if task.uses_created_fallback() {
            created_fallbacks += 1;
            debug!(task = task.id, "no first due date, using creation date");
        }
        let new_id = dest.insert_task(&NewTask::from(task))?;
        debug!(old_id = task.id, new_id, "task migrated");
        id_map.insert(task.id, new_id);
    }

    if created_fallbacks > 0 {
        warn!(
            count = created_fallbacks,
            "initial due date set to creation date for tasks without an explicit first due date"
        );
    }
    info!(tasks = id_map.len(), "tasks migrated");
    Ok((id_map, created_fallbacks))
}

/// Copy every log row, re-linking it through `id_map`.
///
/// A row pointing at a task missing from the map aborts the pass; rows
/// already written stay in place.
pub fn migrate_log(source: &RegularlyDb, dest: &RoomDb, id_map: &IdMap) -> Result<usize> {
    let entries = source.log_entries()?;

    for entry in &entries {
        let task_id = id_map.get(&entry.taskid).copied().ok_or_else(|| {
            ConvertError::MissingTaskMapping {
                task_id: entry.taskid,
                log_row: entry.row,
            }
        })?;
        let new_id = dest.insert_completion(&NewCompletion::from_entry(entry, task_id))?;
        debug!(log_row = entry.row, new_id, task_id, "log entry migrated");
    }

    info!(entries = entries.len(), "log entries migrated");
    Ok(entries.len())
}

pub fn stamp_version(dest: &RoomDb) -> Result<()> {
    dest.set_user_version(SCHEMA_VERSION)?;
    debug!(version = SCHEMA_VERSION, "user_version stamped");
    Ok(())
}

/// Inspect the source without writing anything.
pub fn preflight(source: &RegularlyDb) -> Result<Preflight> {
    let tasks = source.tasks()?;
    let entries = source.log_entries()?;

    let known: HashSet<i64> = tasks.iter().map(|task| task.id).collect();
    let created_fallbacks = tasks
        .iter()
        .filter(|task| task.uses_created_fallback())
        .map(|task| task.id)
        .collect();

    let dangling_log_entries = entries
        .iter()
        .filter(|entry| !known.contains(&entry.taskid))
        .map(|entry| (entry.row, entry.taskid))
        .collect();

    Ok(Preflight {
        task_count: tasks.len(),
        log_count: entries.len(),
        created_fallbacks,
        dangling_log_entries,
    })
}
