//! Turning per-file import lists into internal dependency edges

use std::collections::{BTreeSet, HashSet};

use ripple_core::{DependencyGraph, Language, RepositoryFile, RepositoryStore};

use crate::resolve::{PythonModuleIndex, resolve_asset, resolve_script};

/// Matches import specifiers against the set of scanned files.
pub struct DependencyResolver {
    known: HashSet<String>,
    python: PythonModuleIndex,
}

impl DependencyResolver {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let known: HashSet<String> = keys.into_iter().map(str::to_string).collect();
        let python = PythonModuleIndex::new(known.iter().map(String::as_str));
        Self { known, python }
    }

    pub fn from_store(store: &RepositoryStore) -> Self {
        Self::new(store.keys())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.known.contains(key)
    }

    /// Internal dependencies of one file, sorted, never including the file
    /// itself. Unmatched imports are treated as external and dropped.
    pub fn resolve(&self, from_key: &str, language: Language, imports: &[String]) -> Vec<String> {
        let exists = |k: &str| self.known.contains(k);
        let deps: BTreeSet<String> = imports
            .iter()
            .filter_map(|spec| match language {
                Language::Python => self.python.resolve(from_key, spec),
                Language::JavaScript | Language::TypeScript => {
                    resolve_script(from_key, spec, exists)
                }
                Language::Html | Language::Css => resolve_asset(from_key, spec, exists),
                _ => None,
            })
            .filter(|dep| dep != from_key)
            .collect();
        deps.into_iter().collect()
    }

    pub fn resolve_file(&self, file: &RepositoryFile) -> Vec<String> {
        self.resolve(&file.file_path, file.language, &file.imports)
    }
}

/// Recompute every record's dependencies from its imports and replace the
/// stored graph.
pub fn rebuild_graph(store: &mut RepositoryStore) -> DependencyGraph {
    let resolver = DependencyResolver::from_store(store);
    let mut graph = DependencyGraph::new();
    for file in store.files() {
        graph.set_dependencies(&file.file_path, resolver.resolve_file(file));
    }
    store.set_graph(graph.clone());
    tracing::info!(
        "Dependency graph rebuilt: {} files, {} edges",
        store.len(),
        graph.edge_count()
    );
    graph
}

/// Refresh the outgoing edges of one stored file.
pub fn patch_file(store: &mut RepositoryStore, key: &str) {
    let Some(mut record) = store.get(key).cloned() else {
        return;
    };
    let resolver = DependencyResolver::from_store(store);
    record.dependencies = resolver.resolve_file(&record);
    store.upsert(record);
}
