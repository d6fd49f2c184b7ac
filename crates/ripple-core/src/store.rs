//! Repository memory: persisted file records plus the dependency graph

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::atomic::{read_json_lenient, write_json_atomic};
use crate::error::StoreError;
use crate::graph::DependencyGraph;
use crate::model::{ANALYSIS_VERSION, Language, RepositoryFile};
use crate::paths::{self, from_key};

/// File names that mark an entry point or package root.
const KEY_FILE_NAMES: &[&str] = &[
    "main.py",
    "app.py",
    "index.py",
    "__init__.py",
    "main.js",
    "index.js",
    "app.js",
];

const KEY_FILE_LIMIT: usize = 10;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_files: usize,
    pub languages: BTreeMap<Language, usize>,
}

/// On-disk layout of `repository_data.json`. `last_updated` and `files` are
/// older key names, read but never written; the current key wins when a
/// document carries both.
#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: String,
    #[serde(default)]
    last_saved: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    repository_files: Option<BTreeMap<String, RepositoryFile>>,
    #[serde(default, skip_serializing)]
    files: Option<BTreeMap<String, RepositoryFile>>,
    #[serde(default)]
    dependency_graph: DependencyGraph,
    #[serde(default)]
    stats: StoreStats,
}

/// Which attribute a ranked search looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchKind {
    #[default]
    Any,
    Name,
    Function,
    Class,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub file_path: String,
    pub relevance: f64,
    /// What matched, e.g. a function name.
    pub matched: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Dependency,
    Dependent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedFile {
    pub file_path: String,
    pub relation: Relation,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositorySummary {
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub total_lines: u64,
    pub languages: BTreeMap<Language, usize>,
    pub avg_confidence: f64,
    /// Files with at least one internal dependency.
    pub dependency_connections: usize,
    pub key_files: Vec<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct RepositoryStore {
    path: PathBuf,
    files: BTreeMap<String, RepositoryFile>,
    graph: DependencyGraph,
    last_saved: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for RepositoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryStore")
            .field("path", &self.path)
            .field("file_count", &self.files.len())
            .field("edge_count", &self.graph.edge_count())
            .finish()
    }
}

impl RepositoryStore {
    /// Open the store for a project root, loading `.ripple/repository_data.json`.
    pub fn open(root: &Path) -> Self {
        Self::load(paths::store_path(root))
    }

    /// Load from an explicit file. Absent, unreadable, corrupt or
    /// version-mismatched data yields an empty store.
    pub fn load(path: PathBuf) -> Self {
        let mut store = Self::empty(path);
        let Some(doc) = read_json_lenient::<StoreDocument>(&store.path) else {
            return store;
        };
        if doc.version != ANALYSIS_VERSION {
            tracing::warn!(
                "discarding repository data with version {} (expected {})",
                doc.version,
                ANALYSIS_VERSION
            );
            return store;
        }

        store.files = doc.repository_files.or(doc.files).unwrap_or_default();
        store.graph = doc.dependency_graph;
        store.last_saved = doc.last_saved.or(doc.last_updated);
        tracing::debug!(
            "loaded {} files and {} edges from {}",
            store.files.len(),
            store.graph.edge_count(),
            store.path.display()
        );
        store
    }

    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            files: BTreeMap::new(),
            graph: DependencyGraph::new(),
            last_saved: None,
        }
    }

    pub fn save(&mut self) -> Result<(), StoreError> {
        let now = Utc::now();
        let doc = StoreDocument {
            version: ANALYSIS_VERSION.to_string(),
            last_saved: Some(now),
            last_updated: None,
            repository_files: Some(self.files.clone()),
            files: None,
            dependency_graph: self.graph.clone(),
            stats: self.stats(),
        };
        write_json_atomic(&self.path, &doc)?;
        self.last_saved = Some(now);
        tracing::info!("saved {} files to {}", self.files.len(), self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RepositoryFile> {
        self.files.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    /// Insert or replace a record. The graph's outgoing edges for the file
    /// are replaced by the record's dependencies.
    pub fn upsert(&mut self, file: RepositoryFile) {
        self.graph
            .set_dependencies(&file.file_path, file.dependencies.iter());
        self.files.insert(file.file_path.clone(), file);
    }

    /// Remove a record and every edge touching it. Dependents keep their
    /// records but lose the edge.
    pub fn remove(&mut self, key: &str) -> Option<RepositoryFile> {
        for dependent in self.graph.dependents(key) {
            if let Some(record) = self.files.get_mut(&dependent) {
                record.dependencies.retain(|d| d != key);
            }
        }
        self.graph.remove_file(key);
        self.files.remove(key)
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.graph.clear();
    }

    pub fn files(&self) -> impl Iterator<Item = &RepositoryFile> {
        self.files.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Replace the whole graph, syncing each record's dependency list.
    pub fn set_graph(&mut self, graph: DependencyGraph) {
        for (key, record) in self.files.iter_mut() {
            record.dependencies = graph.dependencies(key);
        }
        self.graph = graph;
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_files: self.files.len(),
            languages: self.language_counts(),
        }
    }

    fn language_counts(&self) -> BTreeMap<Language, usize> {
        let mut counts = BTreeMap::new();
        for file in self.files.values() {
            *counts.entry(file.language).or_insert(0) += 1;
        }
        counts
    }

    /// Case-insensitive substring search over paths, function names, class
    /// names and dependencies.
    pub fn search(&self, query: &str) -> Vec<&RepositoryFile> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        self.files
            .values()
            .filter(|f| {
                hit(&f.file_path)
                    || f.function_names().any(hit)
                    || f.class_names().any(hit)
                    || f.dependencies.iter().any(|d| hit(d))
            })
            .collect()
    }

    /// Ranked search. Relevance is the match strength times the record's
    /// confidence; results are sorted best first.
    pub fn search_by(&self, query: &str, kind: SearchKind) -> Vec<SearchHit> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits = Vec::new();
        for file in self.files.values() {
            let mut best: Option<(f64, String)> = None;
            let mut offer = |strength: f64, matched: &str| {
                if best.as_ref().is_none_or(|(s, _)| strength > *s) {
                    best = Some((strength, matched.to_string()));
                }
            };

            if matches!(kind, SearchKind::Any | SearchKind::Name) {
                let name = paths::file_name(&file.file_path).to_lowercase();
                let stem = name.split('.').next().unwrap_or(&name);
                if stem == needle || name == needle {
                    offer(1.0, &file.file_path);
                } else if name.contains(&needle) {
                    offer(0.7, &file.file_path);
                } else if file.file_path.to_lowercase().contains(&needle) {
                    offer(0.5, &file.file_path);
                }
            }
            if matches!(kind, SearchKind::Any | SearchKind::Function) {
                for name in file.function_names() {
                    if let Some(strength) = symbol_strength(name, &needle) {
                        offer(strength, name);
                    }
                }
            }
            if matches!(kind, SearchKind::Any | SearchKind::Class) {
                for name in file.class_names() {
                    if let Some(strength) = symbol_strength(name, &needle) {
                        offer(strength, name);
                    }
                }
            }

            if let Some((strength, matched)) = best {
                hits.push(SearchHit {
                    file_path: file.file_path.clone(),
                    relevance: strength * file.confidence_score,
                    matched,
                });
            }
        }

        hits.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        hits
    }

    /// Similarity in [0, 1]. Files of different languages score 0.
    pub fn similarity(a: &RepositoryFile, b: &RepositoryFile) -> f64 {
        if a.language != b.language {
            return 0.0;
        }
        let imports = jaccard(
            a.imports.iter().map(String::as_str),
            b.imports.iter().map(String::as_str),
        );
        let functions = jaccard(a.function_names(), b.function_names());
        let classes = jaccard(a.class_names(), b.class_names());
        0.3 * imports + 0.4 * functions + 0.3 * classes
    }

    /// Other files at or above `threshold` similarity, most similar first.
    pub fn find_similar(&self, key: &str, threshold: f64) -> Vec<(String, f64)> {
        let Some(target) = self.files.get(key) else {
            return Vec::new();
        };
        let mut similar: Vec<(String, f64)> = self
            .files
            .values()
            .filter(|f| f.file_path != key)
            .map(|f| (f.file_path.clone(), Self::similarity(target, f)))
            .filter(|(_, score)| *score >= threshold && *score > 0.0)
            .collect();
        similar.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        similar
    }

    /// Direct dependencies and dependents, ranked by confidence.
    pub fn find_related(&self, key: &str, max: usize) -> Vec<RelatedFile> {
        let confidence = |k: &str| self.files.get(k).map_or(0.0, |f| f.confidence_score);
        let mut related: Vec<RelatedFile> = self
            .graph
            .dependencies(key)
            .into_iter()
            .map(|p| (p, Relation::Dependency))
            .chain(
                self.graph
                    .dependents(key)
                    .into_iter()
                    .map(|p| (p, Relation::Dependent)),
            )
            .map(|(file_path, relation)| RelatedFile {
                confidence: confidence(&file_path),
                file_path,
                relation,
            })
            .collect();
        related.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.file_path.cmp(&b.file_path))
        });
        related.truncate(max);
        related
    }

    pub fn files_by_language(&self, language: Language) -> Vec<&RepositoryFile> {
        self.files
            .values()
            .filter(|f| f.language == language)
            .collect()
    }

    pub fn high_confidence_files(&self, threshold: f64) -> Vec<&RepositoryFile> {
        let mut files: Vec<&RepositoryFile> = self
            .files
            .values()
            .filter(|f| f.confidence_score >= threshold)
            .collect();
        files.sort_by(|a, b| b.confidence_score.total_cmp(&a.confidence_score));
        files
    }

    /// Entry points and heavily connected or symbol-dense files, at most ten.
    pub fn key_files(&self) -> Vec<String> {
        self.files
            .values()
            .filter(|f| {
                KEY_FILE_NAMES.contains(&paths::file_name(&f.file_path))
                    || f.dependencies.len() > 10
                    || f.functions.len() + f.classes.len() > 10
            })
            .map(|f| f.file_path.clone())
            .take(KEY_FILE_LIMIT)
            .collect()
    }

    pub fn summary(&self) -> RepositorySummary {
        let total_files = self.files.len();
        let avg_confidence = if total_files == 0 {
            0.0
        } else {
            self.files.values().map(|f| f.confidence_score).sum::<f64>() / total_files as f64
        };
        RepositorySummary {
            total_files,
            total_size_bytes: self.files.values().map(|f| f.file_size).sum(),
            total_lines: self.files.values().map(|f| u64::from(f.line_count)).sum(),
            languages: self.language_counts(),
            avg_confidence,
            dependency_connections: self
                .files
                .keys()
                .filter(|k| !self.graph.dependencies(k).is_empty())
                .count(),
            key_files: self.key_files(),
            last_updated: self.files.values().map(|f| f.last_analyzed).max(),
        }
    }

    /// Drop records whose file no longer exists under `root` or whose last
    /// analysis is older than `retention_days`. Returns the removed keys.
    pub fn cleanup_stale(&mut self, root: &Path, retention_days: i64) -> Vec<String> {
        let cutoff = Utc::now() - Duration::days(retention_days);
        let stale: Vec<String> = self
            .files
            .values()
            .filter(|f| f.last_analyzed < cutoff || !from_key(root, &f.file_path).is_file())
            .map(|f| f.file_path.clone())
            .collect();

        for key in &stale {
            self.remove(key);
        }
        if !stale.is_empty() {
            tracing::info!("removed {} stale entries", stale.len());
        }
        stale
    }
}

fn symbol_strength(name: &str, needle: &str) -> Option<f64> {
    let lower = name.to_lowercase();
    if lower == needle {
        Some(1.0)
    } else if lower.contains(needle) {
        Some(0.8)
    } else {
        None
    }
}

fn jaccard<'a>(a: impl Iterator<Item = &'a str>, b: impl Iterator<Item = &'a str>) -> f64 {
    let a: HashSet<&str> = a.collect();
    let b: HashSet<&str> = b.collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}
