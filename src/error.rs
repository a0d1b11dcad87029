use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("source database '{}' does not exist", .0.display())]
    SourceNotFound(PathBuf),

    #[error("source database '{}' is also the destination; refusing to recreate it", .0.display())]
    SameFile(PathBuf),

    #[error("log row {log_row} references task {task_id}, which is not in the source task table")]
    MissingTaskMapping { task_id: i64, log_row: i64 },

    #[error("invalid output path: {0}")]
    InvalidOutputPath(String),

    #[error("locked by another process: {0}")]
    Locked(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
}

impl ConvertError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "source_not_found",
            Self::SameFile(_) => "same_file",
            Self::MissingTaskMapping { .. } => "missing_task_mapping",
            Self::InvalidOutputPath(_) => "invalid_output_path",
            Self::Locked(_) => "locked",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Db(_) => "db_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
