//! Project indexing: scan, extract, resolve and persist

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use ripple_core::{
    ANALYSIS_VERSION, Language, ParseMode, RepositoryFile, RepositoryStore, RippleConfig,
    from_key, load_project_config, to_key,
};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::IndexError;
use crate::graph_builder::{patch_file, rebuild_graph};
use crate::languages::get_extractor;
use crate::metrics::{complexity, confidence};
use crate::scanner::{FileScanner, ScannedFile};

/// Outcome of one indexing pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    pub scanned: usize,
    pub analyzed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub removed: Vec<String>,
    pub ast_parsed: usize,
    pub fallback_parsed: usize,
    pub edges: usize,
    pub duration_ms: u64,
}

pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Analyze in-memory content into a record with an empty dependency list.
/// Dependencies are filled in by the graph builder once the full file set
/// is known.
pub fn analyze_content(
    key: &str,
    language: Language,
    content: &str,
    last_modified: DateTime<Utc>,
) -> RepositoryFile {
    let extraction = get_extractor(language).extract(content);
    let line_count = content.lines().count() as u32;
    let import_count = extraction.imports.len();

    RepositoryFile {
        file_path: key.to_string(),
        language,
        content_hash: content_hash(content.as_bytes()),
        file_size: content.len() as u64,
        line_count,
        last_modified,
        last_analyzed: Utc::now(),
        confidence_score: confidence(&extraction, import_count, line_count),
        complexity: complexity(&extraction, import_count, line_count),
        parse_mode: extraction.parse_mode,
        imports: extraction.imports,
        exports: extraction.exports,
        functions: extraction.functions,
        classes: extraction.classes,
        dependencies: Vec::new(),
        analysis_version: ANALYSIS_VERSION.to_string(),
    }
}

fn read_text(path: &Path) -> Result<String, IndexError> {
    let bytes = std::fs::read(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|e| IndexError::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
    })
}

fn modified_time(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

pub struct ProjectIndexer {
    root: PathBuf,
    config: RippleConfig,
}

impl ProjectIndexer {
    /// Open a project root, reading `.ripple/config.toml` when present.
    pub fn new(root: &Path) -> Result<Self, IndexError> {
        let config = load_project_config(root)?;
        Self::with_config(root, config)
    }

    pub fn with_config(root: &Path, config: RippleConfig) -> Result<Self, IndexError> {
        let root = root
            .canonicalize()
            .map_err(|_| IndexError::InvalidRoot(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(IndexError::InvalidRoot(root));
        }
        Ok(Self { root, config })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    pub fn open_store(&self) -> RepositoryStore {
        RepositoryStore::open(&self.root)
    }

    pub fn scanner(&self) -> Result<FileScanner, IndexError> {
        FileScanner::new(&self.root, &self.config.scan)
    }

    /// Store key for a user-supplied path (absolute, or relative to the root).
    pub fn key_for(&self, path: &Path) -> Result<String, IndexError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        to_key(&self.root, &absolute).ok_or_else(|| IndexError::OutsideRoot(path.to_path_buf()))
    }

    pub fn analyze_file(&self, file: &ScannedFile) -> Result<RepositoryFile, IndexError> {
        let content = read_text(&file.path)?;
        let mut record = analyze_content(
            &file.relative,
            file.language,
            &content,
            modified_time(&file.path),
        );
        record.file_size = file.size;
        Ok(record)
    }

    /// Scan the project and bring the store up to date. Unchanged files
    /// (same content hash) are kept unless `force` is set. The graph is
    /// rebuilt from scratch and the store is saved.
    pub fn index_project(
        &self,
        store: &mut RepositoryStore,
        force: bool,
        max_files: Option<usize>,
    ) -> Result<IndexReport, IndexError> {
        let started = Instant::now();
        let mut scanner = self.scanner()?;
        let limit = max_files.unwrap_or(self.config.scan.max_files);
        scanner = scanner.with_max_files(limit);
        let scanned = scanner.scan();
        let truncated = scanned.len() >= limit;

        let mut report = IndexReport {
            scanned: scanned.len(),
            ..Default::default()
        };
        if force {
            store.clear();
        }

        for file in &scanned {
            let content = match read_text(&file.path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file.relative, e);
                    report.skipped += 1;
                    continue;
                }
            };
            let hash = content_hash(content.as_bytes());
            if store
                .get(&file.relative)
                .is_some_and(|r| r.content_hash == hash && r.analysis_version == ANALYSIS_VERSION)
            {
                report.unchanged += 1;
                continue;
            }

            let mut record = analyze_content(
                &file.relative,
                file.language,
                &content,
                modified_time(&file.path),
            );
            record.file_size = file.size;
            match record.parse_mode {
                ParseMode::Ast => report.ast_parsed += 1,
                ParseMode::Fallback => report.fallback_parsed += 1,
                ParseMode::Pattern => {}
            }
            tracing::debug!(
                "Analyzed {} ({} imports, {} functions, {} classes)",
                record.file_path,
                record.imports.len(),
                record.functions.len(),
                record.classes.len()
            );
            store.upsert(record);
            report.analyzed += 1;
        }

        let seen: HashSet<&str> = scanned.iter().map(|f| f.relative.as_str()).collect();
        let vanished: Vec<String> = store
            .keys()
            .filter(|k| {
                let gone = !from_key(&self.root, k).is_file();
                gone || (!truncated && !seen.contains(k))
            })
            .map(str::to_string)
            .collect();
        for key in &vanished {
            store.remove(key);
        }
        report.removed = vanished;

        report.edges = rebuild_graph(store).edge_count();
        store.save()?;

        report.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Indexed {} files ({} analyzed, {} unchanged, {} removed) in {}ms",
            report.scanned,
            report.analyzed,
            report.unchanged,
            report.removed.len(),
            report.duration_ms
        );
        Ok(report)
    }

    /// Re-analyze one file and patch its graph edges. A file not seen before
    /// triggers a full graph rebuild so existing imports of it get resolved.
    /// A file that no longer exists is removed. The store is not saved.
    pub fn refresh_file(
        &self,
        store: &mut RepositoryStore,
        path: &Path,
    ) -> Result<Option<RepositoryFile>, IndexError> {
        let key = self.key_for(path)?;
        let absolute = from_key(&self.root, &key);
        if !absolute.is_file() {
            self.remove_file(store, &key);
            return Ok(None);
        }

        let size = std::fs::metadata(&absolute)
            .map_err(|source| IndexError::Io {
                path: absolute.clone(),
                source,
            })?
            .len();
        let scanner = self.scanner()?;
        let Some(language) = scanner.accepts(&key, size) else {
            return Err(IndexError::Unsupported(absolute));
        };

        let is_new = !store.contains(&key);
        let record = self.analyze_file(&ScannedFile {
            path: absolute,
            relative: key.clone(),
            language,
            size,
        })?;
        store.upsert(record);
        if is_new {
            rebuild_graph(store);
        } else {
            patch_file(store, &key);
        }
        Ok(store.get(&key).cloned())
    }

    /// Drop a file and all edges touching it.
    pub fn remove_file(&self, store: &mut RepositoryStore, key: &str) -> bool {
        let removed = store.remove(key).is_some();
        if removed {
            tracing::debug!("Removed {} from repository memory", key);
        }
        removed
    }
}
