use std::path::PathBuf;

use ripple_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("{0} is outside the project root")]
    OutsideRoot(PathBuf),

    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backup of {path} failed: {source}")]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The write failed and the original content was restored.
    #[error("write to {path} failed, original restored: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The write failed and restoring the backup failed too. The file on
    /// disk may be in neither state.
    #[error("write to {path} failed ({write_error}) and restore from {backup} failed: {source}")]
    RestoreFailed {
        path: PathBuf,
        backup: PathBuf,
        write_error: String,
        #[source]
        source: std::io::Error,
    },

    #[error("edit id '{0}' not found")]
    UnknownEdit(String),

    #[error("edit '{0}' has no backup to restore")]
    MissingBackup(String),

    #[error("restore of {path} from {backup} failed: {source}")]
    Rollback {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
