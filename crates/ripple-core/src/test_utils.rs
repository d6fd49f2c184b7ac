//! Test utilities for Ripple

use std::fs;

use chrono::Utc;
use tempfile::TempDir;

use crate::model::{ClassInfo, FunctionInfo, Language, ParseMode, RepositoryFile};

/// Create a temporary repository with custom files
pub fn create_repo_with_structure(files: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    for (path, content) in files {
        let full_path = root.join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full_path, content).unwrap();
    }

    temp_dir
}

/// A bare record with the given key and dependencies.
pub fn record(path: &str, language: Language, deps: &[&str]) -> RepositoryFile {
    let now = Utc::now();
    RepositoryFile {
        file_path: path.to_string(),
        language,
        content_hash: String::new(),
        file_size: 0,
        line_count: 0,
        last_modified: now,
        last_analyzed: now,
        imports: Vec::new(),
        exports: Vec::new(),
        functions: Vec::new(),
        classes: Vec::new(),
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
        confidence_score: 0.5,
        complexity: 0,
        parse_mode: ParseMode::Ast,
        analysis_version: crate::ANALYSIS_VERSION.to_string(),
    }
}

pub fn function(name: &str) -> FunctionInfo {
    FunctionInfo {
        name: name.to_string(),
        params: Vec::new(),
        line: 1,
        is_async: false,
        decorators: Vec::new(),
    }
}

pub fn class(name: &str) -> ClassInfo {
    ClassInfo {
        name: name.to_string(),
        line: 1,
        methods: Vec::new(),
        bases: Vec::new(),
    }
}
