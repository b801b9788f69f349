//! Run-fatal errors.
//!
//! Anything in here stops the run before (or instead of) dispatching uploads.
//! Per-file upload failures are not errors at this level: they are recorded in
//! [`crate::report::UploadResult`] and surfaced through the summary.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigField;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing configuration: {field} was not provided (set {})", .field.flag())]
    MissingConfiguration { field: ConfigField },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidSetting {
        key: String,
        value: String,
        reason: String,
    },

    #[error("failed to read interactive input: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote knowledge base unavailable: {0}")]
    RemoteUnavailable(String),
}
