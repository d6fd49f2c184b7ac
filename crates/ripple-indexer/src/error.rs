use std::path::PathBuf;

use ripple_core::{ConfigError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("project root {0} is not a directory")]
    InvalidRoot(PathBuf),

    #[error("{0} is outside the project root")]
    OutsideRoot(PathBuf),

    #[error("unsupported file type: {0}")]
    Unsupported(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid exclude pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
