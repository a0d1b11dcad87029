use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::{ConvertError, Result};
use crate::model::IdMap;
use crate::output::{self, ConvertReport, Format};
use crate::store::lock::DestinationLock;
use crate::store::migration;
use crate::store::paths::{converted_db_path, ensure_parent_exists, lock_path};
use crate::store::regularly::RegularlyDb;
use crate::store::room::RoomDb;

#[derive(Debug, Clone)]
pub struct ConvertArgs {
    pub infile: PathBuf,
    pub outdir: String,
    pub dry_run: bool,
    pub id_map: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct IdMapEntry {
    old_id: i64,
    new_id: i64,
}

pub fn run(args: &ConvertArgs, format: Format) -> Result<()> {
    let report = convert(args)?;
    output::print_report(&report, format)?;

    // A dry run reports every dangling reference, then fails like a real run would.
    match report.preflight {
        Some(ref preflight) if !preflight.is_clean() => {
            let (log_row, task_id) = preflight.dangling_log_entries[0];
            Err(ConvertError::MissingTaskMapping { task_id, log_row })
        }
        _ => Ok(()),
    }
}

/// Run a conversion (or dry run) and return the report without printing it.
pub fn convert(args: &ConvertArgs) -> Result<ConvertReport> {
    let db_path = converted_db_path(&args.outdir);
    ensure_parent_exists(&db_path)?;

    let source = RegularlyDb::open(&args.infile)?;
    if same_file(&args.infile, &db_path) {
        return Err(ConvertError::SameFile(args.infile.clone()));
    }

    let mut report = ConvertReport {
        source: args.infile.display().to_string(),
        destination: db_path.display().to_string(),
        dry_run: args.dry_run,
        preflight: None,
        migration: None,
        id_map_path: None,
    };

    if args.dry_run {
        report.preflight = Some(migration::preflight(&source)?);
        return Ok(report);
    }

    let _lock = DestinationLock::acquire(&lock_path(&db_path))?;
    let dest = RoomDb::create(&db_path)?;
    info!(source = %args.infile.display(), destination = %db_path.display(), "converting");

    let summary = migration::run(&source, &dest)?;

    if let Some(ref map_path) = args.id_map {
        write_id_map(map_path, &report, &summary.id_map)?;
        report.id_map_path = Some(map_path.display().to_string());
    }
    report.migration = Some(summary);
    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn id_map_entries(id_map: &IdMap) -> Vec<IdMapEntry> {
    id_map
        .iter()
        .map(|(&old_id, &new_id)| IdMapEntry { old_id, new_id })
        .collect()
}

fn write_id_map(path: &Path, report: &ConvertReport, id_map: &IdMap) -> Result<()> {
    let payload = json!({
        "generated_at": Utc::now().to_rfc3339(),
        "source": report.source,
        "destination": report.destination,
        "id_map": id_map_entries(id_map),
    });
    fs::write(path, serde_json::to_string_pretty(&payload)?)?;
    Ok(())
}
