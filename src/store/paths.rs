use std::path::{Path, PathBuf};

use crate::error::{ConvertError, Result};

pub const CONVERTED_DB_NAME: &str = "converted.db";

/// Destination file for a given `outdir` argument.
///
/// The file lands in the *parent* of `outdir`, using POSIX `dirname` string
/// rules: `backups/out` gives `backups/converted.db`, while a trailing slash
/// (`backups/out/`) keeps it inside `backups/out`.
pub fn converted_db_path(outdir: &str) -> PathBuf {
    Path::new(dirname(outdir)).join(CONVERTED_DB_NAME)
}

/// Fail early when the directory the destination would be written to is
/// missing, before anything has been touched.
pub fn ensure_parent_exists(db_path: &Path) -> Result<()> {
    let parent = match db_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    if parent.is_dir() {
        Ok(())
    } else {
        Err(ConvertError::InvalidOutputPath(format!(
            "directory '{}' does not exist",
            parent.display()
        )))
    }
}

/// Lock file guarding a destination database for the length of a run.
pub fn lock_path(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

fn dirname(path: &str) -> &str {
    let head = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "",
    };
    let trimmed = head.trim_end_matches('/');
    if trimmed.is_empty() { head } else { trimmed }
}
