//! Project configuration stored at `.ripple/config.toml`

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::paths::{config_path, data_dir};

pub const DEFAULT_MAX_FILES: usize = 1000;
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
pub const DEFAULT_RETENTION_DAYS: i64 = 7;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RippleConfig {
    pub scan: ScanConfig,
    pub impact: ImpactConfig,
    pub store: StoreConfig,
    pub edit: EditConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub max_files: usize,
    pub max_file_size: u64,
    /// Directory names skipped in addition to the built-in set.
    pub ignore_dirs: Vec<String>,
    /// Glob patterns matched against root-relative paths.
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            ignore_dirs: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

/// Affected-count band: counts up to `max_affected` score `score`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBand {
    pub max_affected: usize,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub bands: Vec<ScoreBand>,
    /// Base score when the count exceeds every band.
    pub overflow_score: f64,
    pub add: f64,
    pub modify: f64,
    pub delete: f64,
    /// Complexity multiplier is `1 + complexity / complexity_divisor`.
    pub complexity_divisor: f64,
    pub high_score: f64,
    pub high_count: usize,
    pub medium_score: f64,
    pub medium_count: usize,
}

fn default_bands() -> Vec<ScoreBand> {
    [(0, 0.1), (2, 0.2), (5, 0.4), (10, 0.6), (20, 0.8)]
        .into_iter()
        .map(|(max_affected, score)| ScoreBand {
            max_affected,
            score,
        })
        .collect()
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            overflow_score: 0.9,
            add: 0.1,
            modify: 0.3,
            delete: 0.8,
            complexity_divisor: 20.0,
            high_score: 0.65,
            high_count: 8,
            medium_score: 0.35,
            medium_count: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    pub history_limit: usize,
    /// Treat critical risk as a blocking issue.
    pub block_critical: bool,
    /// Impact score above which a warning is raised.
    pub high_impact_warning: f64,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            block_critical: true,
            high_impact_warning: 0.7,
        }
    }
}

pub fn load_project_config(root: impl AsRef<Path>) -> Result<RippleConfig, ConfigError> {
    let path = config_path(root.as_ref());
    if !path.exists() {
        return Ok(RippleConfig::default());
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let parsed: RippleConfig =
        toml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;
    Ok(normalize_config(parsed))
}

pub fn ensure_project_config(root: impl AsRef<Path>) -> Result<RippleConfig, ConfigError> {
    let root = root.as_ref();
    let dir = data_dir(root);
    fs::create_dir_all(&dir).map_err(|source| ConfigError::Write { path: dir, source })?;

    let path = config_path(root);
    if path.exists() {
        return load_project_config(root);
    }

    let config = RippleConfig::default();
    let content = toml::to_string_pretty(&config)?;
    fs::write(&path, content).map_err(|source| ConfigError::Write { path, source })?;

    Ok(config)
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn unit_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        value
    } else {
        fallback
    }
}

fn normalize_config(mut config: RippleConfig) -> RippleConfig {
    let defaults = RippleConfig::default();

    if config.scan.max_files == 0 {
        config.scan.max_files = defaults.scan.max_files;
    }
    if config.scan.max_file_size == 0 {
        config.scan.max_file_size = defaults.scan.max_file_size;
    }
    config.scan.ignore_dirs = config
        .scan
        .ignore_dirs
        .iter()
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
        .collect();

    let impact = &mut config.impact;
    impact
        .bands
        .retain(|b| b.score.is_finite() && (0.0..=1.0).contains(&b.score));
    if impact.bands.is_empty() {
        impact.bands = defaults.impact.bands.clone();
    }
    impact.bands.sort_by_key(|b| b.max_affected);
    impact.overflow_score = unit_or(impact.overflow_score, defaults.impact.overflow_score);
    impact.add = positive_or(impact.add, defaults.impact.add);
    impact.modify = positive_or(impact.modify, defaults.impact.modify);
    impact.delete = positive_or(impact.delete, defaults.impact.delete);
    impact.complexity_divisor =
        positive_or(impact.complexity_divisor, defaults.impact.complexity_divisor);
    impact.high_score = unit_or(impact.high_score, defaults.impact.high_score);
    impact.medium_score = unit_or(impact.medium_score, defaults.impact.medium_score);
    if impact.high_count == 0 {
        impact.high_count = defaults.impact.high_count;
    }
    if impact.medium_count == 0 {
        impact.medium_count = defaults.impact.medium_count;
    }

    if config.store.retention_days <= 0 {
        config.store.retention_days = defaults.store.retention_days;
    }
    if config.edit.history_limit == 0 {
        config.edit.history_limit = defaults.edit.history_limit;
    }
    config.edit.high_impact_warning =
        unit_or(config.edit.high_impact_warning, defaults.edit.high_impact_warning);

    config
}
