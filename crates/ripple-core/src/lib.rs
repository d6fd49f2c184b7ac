//! File model, dependency graph, repository memory and config

pub mod atomic;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub mod paths;
pub mod store;

#[cfg(test)]
pub mod tests;

#[cfg(test)]
pub mod test_utils;

pub use config::{
    EditConfig, ImpactConfig, RippleConfig, ScanConfig, ScoreBand, StoreConfig,
    ensure_project_config, load_project_config,
};
pub use error::{ConfigError, StoreError};
pub use graph::DependencyGraph;
pub use model::{
    ANALYSIS_VERSION, ChangeType, ClassInfo, FunctionInfo, Language, MethodInfo, ParseMode,
    RepositoryFile, RiskLevel,
};
pub use paths::{DATA_DIR, clear_data, data_dir, from_key, to_key};
pub use store::{
    Relation, RelatedFile, RepositoryStore, RepositorySummary, SearchHit, SearchKind, StoreStats,
};
