use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

use crate::error::Result;
use crate::store::migration::{MigrationSummary, Preflight};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
}

/// Result of one invocation, printed on stdout.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub source: String,
    pub destination: String,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preflight: Option<Preflight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration: Option<MigrationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_map_path: Option<String>,
}

pub fn print_report(report: &ConvertReport, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(report)?),
        Format::Pretty => {
            let header = if report.dry_run {
                "dry run".yellow().bold()
            } else {
                "converted".green().bold()
            };
            println!(
                "{header} {} -> {}",
                report.source.cyan(),
                report.destination.cyan()
            );
            if let Some(ref preflight) = report.preflight {
                print_preflight(preflight);
            }
            if let Some(ref migration) = report.migration {
                println!("  tasks: {}", migration.tasks_migrated);
                println!("  log entries: {}", migration.log_entries_migrated);
                println!("  user_version: {}", migration.user_version);
                println!(
                    "  destination rows: {} task(s), {} completion(s)",
                    migration.destination_tasks, migration.destination_completions
                );
                if migration.created_fallbacks > 0 {
                    println!(
                        "  {} {} task(s) use their creation date as initial due date",
                        "note:".yellow(),
                        migration.created_fallbacks
                    );
                }
            }
            if let Some(ref path) = report.id_map_path {
                println!("  id map: {}", path.dimmed());
            }
        }
    }
    Ok(())
}

fn print_preflight(preflight: &Preflight) {
    println!("  tasks: {}", preflight.task_count);
    println!("  log entries: {}", preflight.log_count);
    if !preflight.created_fallbacks.is_empty() {
        let ids: Vec<String> = preflight
            .created_fallbacks
            .iter()
            .map(|id| id.to_string())
            .collect();
        println!(
            "  {} initial due date falls back to creation date for task(s) {}",
            "note:".yellow(),
            ids.join(", ")
        );
    }
    for (row, task_id) in &preflight.dangling_log_entries {
        println!(
            "  {} log row {row} references missing task {task_id}",
            "error:".red().bold()
        );
    }
}
