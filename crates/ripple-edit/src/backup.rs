//! Timestamped file backups with a JSON index

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ripple_core::StoreError;
use ripple_core::atomic::{read_json_lenient, write_json_atomic};
use ripple_core::paths::{backup_dir, backup_metadata_path, file_name};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub backup_path: PathBuf,
    /// `YYYYmmdd_HHMMSS_micro`, as embedded in the backup file name.
    pub timestamp: String,
    pub created_at: DateTime<Utc>,
}

/// Original file key to its backups, oldest first.
type BackupIndex = BTreeMap<String, Vec<BackupRecord>>;

pub struct BackupManager {
    dir: PathBuf,
    metadata_path: PathBuf,
}

impl BackupManager {
    pub fn new(root: &Path) -> Self {
        Self {
            dir: backup_dir(root),
            metadata_path: backup_metadata_path(root),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn load_index(&self) -> BackupIndex {
        read_json_lenient(&self.metadata_path).unwrap_or_default()
    }

    /// Copy `source` into the backup directory and index it under `key`.
    pub fn create_backup(&self, key: &str, source: &Path) -> std::io::Result<BackupRecord> {
        fs::create_dir_all(&self.dir)?;

        let now = Utc::now();
        let timestamp = now.format("%Y%m%d_%H%M%S_%6f").to_string();
        let name = file_name(key);
        let mut backup_path = self.dir.join(format!("{name}_{timestamp}.backup"));
        let mut n = 1;
        while backup_path.exists() {
            backup_path = self.dir.join(format!("{name}_{timestamp}_{n}.backup"));
            n += 1;
        }
        fs::copy(source, &backup_path)?;

        let record = BackupRecord {
            backup_path,
            timestamp,
            created_at: now,
        };
        let mut index = self.load_index();
        index.entry(key.to_string()).or_default().push(record.clone());
        if let Err(e) = write_json_atomic(&self.metadata_path, &index) {
            tracing::warn!("Failed to update backup metadata: {}", e);
        }
        tracing::debug!("Backed up {} to {}", key, record.backup_path.display());
        Ok(record)
    }

    pub fn list_backups(&self, key: &str) -> Vec<BackupRecord> {
        self.load_index().remove(key).unwrap_or_default()
    }

    /// Copy a backup over `target`. Fails if the backup is gone.
    pub fn restore(&self, backup: &Path, target: &Path) -> std::io::Result<()> {
        fs::copy(backup, target).map(|_| ())
    }

    /// Drop index entries whose backup file no longer exists.
    pub fn prune_missing(&self) -> Result<usize, StoreError> {
        let mut index = self.load_index();
        let mut pruned = 0;
        for records in index.values_mut() {
            let before = records.len();
            records.retain(|r| r.backup_path.exists());
            pruned += before - records.len();
        }
        index.retain(|_, records| !records.is_empty());
        if pruned > 0 {
            write_json_atomic(&self.metadata_path, &index)?;
        }
        Ok(pruned)
    }
}
