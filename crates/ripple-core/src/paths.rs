//! Per-project data directory layout and path key helpers

use std::path::{Component, Path, PathBuf};

/// Data directory: .ripple/
pub const DATA_DIR: &str = ".ripple";

/// Repository memory file
pub const STORE_FILE: &str = "repository_data.json";

/// Edit history file
pub const HISTORY_FILE: &str = "edit_history.json";

/// Backup directory (inside the data directory)
pub const BACKUP_DIR: &str = "backups";

/// Backup index file (inside the backup directory)
pub const BACKUP_METADATA: &str = "backup_metadata.json";

/// Project configuration file
pub const CONFIG_FILE: &str = "config.toml";

pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

pub fn store_path(root: &Path) -> PathBuf {
    data_dir(root).join(STORE_FILE)
}

pub fn history_path(root: &Path) -> PathBuf {
    data_dir(root).join(HISTORY_FILE)
}

pub fn backup_dir(root: &Path) -> PathBuf {
    data_dir(root).join(BACKUP_DIR)
}

pub fn backup_metadata_path(root: &Path) -> PathBuf {
    backup_dir(root).join(BACKUP_METADATA)
}

pub fn config_path(root: &Path) -> PathBuf {
    data_dir(root).join(CONFIG_FILE)
}

/// Remove the whole data directory
pub fn clear_data(root: &Path) -> std::io::Result<()> {
    let dir = data_dir(root);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

/// Convert a path inside `root` into the store key form: relative,
/// `/`-separated, without `.` segments. Returns `None` when the path leaves
/// the root.
pub fn to_key(root: &Path, path: &Path) -> Option<String> {
    let relative = match path.strip_prefix(root) {
        Ok(relative) => relative,
        Err(_) if path.is_absolute() => return None,
        Err(_) => path,
    };
    normalize_relative(relative)
}

/// Resolve a store key back to a filesystem path under `root`.
pub fn from_key(root: &Path, key: &str) -> PathBuf {
    key.split('/')
        .filter(|s| !s.is_empty())
        .fold(root.to_path_buf(), |acc, seg| acc.join(seg))
}

/// Lexically normalise a relative path. `..` may not climb above the start.
pub fn normalize_relative(path: &Path) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(seg) => parts.push(seg.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Join a `/`-separated specifier onto the directory of a key and normalise.
/// A leading `/` anchors at the root.
pub fn join_key(from_key: &str, specifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = if specifier.starts_with('/') {
        Vec::new()
    } else {
        let mut dir: Vec<&str> = from_key.split('/').collect();
        dir.pop();
        dir
    };
    for seg in specifier.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Final path segment of a key.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
