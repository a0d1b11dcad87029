use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

use crate::error::{ConvertError, Result};

/// Exclusive lock on a destination database, held until dropped.
///
/// The lock file must never be unlinked: a waiter that already opened it
/// would then lock an orphaned inode. Closing the handle releases the lock.
#[derive(Debug)]
pub struct DestinationLock {
    _file: File,
}

impl DestinationLock {
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        file.try_lock_exclusive()
            .map_err(|_| ConvertError::Locked(path.display().to_string()))?;

        Ok(Self { _file: file })
    }
}
