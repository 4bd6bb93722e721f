use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Name '{name}' is {len} bytes, over the {budget}-byte slot budget")]
    LengthOverflow {
        name: String,
        len: usize,
        budget: usize,
    },

    #[error("Target already exists: {}", .0.display())]
    TargetExists(PathBuf),

    #[error("No backup found at {}", .0.display())]
    BackupMissing(PathBuf),

    #[error("Name table error: {0}")]
    Table(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Format(_) => "FORMAT_ERROR",
            Error::LengthOverflow { .. } => "LENGTH_OVERFLOW",
            Error::TargetExists(_) => "TARGET_EXISTS",
            Error::BackupMissing(_) => "BACKUP_MISSING",
            Error::Table(_) => "TABLE_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}
