//! Breadth-first project walk producing candidate source files

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use ripple_core::{Language, ScanConfig, to_key};

use crate::error::IndexError;

/// Directories never descended into.
pub const IGNORE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    "env",
    ".env",
    "dist",
    "build",
    ".next",
    ".cache",
    "coverage",
    ".pytest_cache",
    ".tox",
    ".mypy_cache",
    ".idea",
    ".vscode",
    ".gradle",
    "target",
    "bin",
    "obj",
    ".nuget",
    ripple_core::DATA_DIR,
];

/// Files never scanned even when their extension matches.
pub const IGNORE_FILES: &[&str] = &[
    ".gitignore",
    ".dockerignore",
    ".editorconfig",
    ".flake8",
    "package-lock.json",
    "yarn.lock",
    "poetry.lock",
    "Pipfile.lock",
    ".DS_Store",
    "Thumbs.db",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Store key: root-relative, `/`-separated.
    pub relative: String,
    pub language: Language,
    pub size: u64,
}

pub struct FileScanner {
    root: PathBuf,
    max_files: usize,
    max_file_size: u64,
    extra_ignore_dirs: Vec<String>,
    exclude: GlobSet,
}

impl FileScanner {
    pub fn new(root: &Path, config: &ScanConfig) -> Result<Self, IndexError> {
        if !root.is_dir() {
            return Err(IndexError::InvalidRoot(root.to_path_buf()));
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.exclude {
            builder.add(Glob::new(pattern)?);
        }
        Ok(Self {
            root: root.to_path_buf(),
            max_files: config.max_files,
            max_file_size: config.max_file_size,
            extra_ignore_dirs: config.ignore_dirs.clone(),
            exclude: builder.build()?,
        })
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    fn ignored_dir(&self, name: &str) -> bool {
        IGNORE_DIRS.contains(&name) || self.extra_ignore_dirs.iter().any(|d| d == name)
    }

    /// Whether a single file would be picked up by a scan.
    pub fn accepts(&self, relative: &str, size: u64) -> Option<Language> {
        let name = ripple_core::paths::file_name(relative);
        if IGNORE_FILES.contains(&name) || size > self.max_file_size {
            return None;
        }
        if self.exclude.is_match(relative) {
            return None;
        }
        let under_ignored_dir = relative
            .split('/')
            .rev()
            .skip(1)
            .any(|segment| self.ignored_dir(segment));
        if under_ignored_dir {
            return None;
        }
        Language::from_path(Path::new(name))
    }

    /// Walk the root breadth-first. Entries within a directory are visited
    /// in name order; the result is capped at `max_files`.
    pub fn scan(&self) -> Vec<ScannedFile> {
        let mut files = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(self.root.clone());

        while let Some(dir) = queue.pop_front() {
            tracing::debug!("Scanning directory: {}", dir.display());

            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Cannot read directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            let mut entries: Vec<fs::DirEntry> = entries
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!("Cannot read entry in {}: {}", dir.display(), e);
                        None
                    }
                })
                .collect();
            entries.sort_by_key(|e| e.file_name());

            for entry in entries {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().into_owned();
                let file_type = match entry.file_type() {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::warn!("Cannot stat {}: {}", path.display(), e);
                        continue;
                    }
                };

                if file_type.is_dir() {
                    if !self.ignored_dir(&name) {
                        queue.push_back(path);
                    }
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }

                let Some(relative) = to_key(&self.root, &path) else {
                    continue;
                };
                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        tracing::warn!("Cannot stat {}: {}", path.display(), e);
                        continue;
                    }
                };
                if size > self.max_file_size {
                    tracing::debug!("Skipping large file {} ({} bytes)", relative, size);
                    continue;
                }
                let Some(language) = self.accepts(&relative, size) else {
                    continue;
                };

                if files.len() >= self.max_files {
                    tracing::info!("Reached file limit of {}", self.max_files);
                    return files;
                }
                files.push(ScannedFile {
                    path,
                    relative,
                    language,
                    size,
                });
            }
        }

        tracing::info!("Scanned {} files under {}", files.len(), self.root.display());
        files
    }
}
