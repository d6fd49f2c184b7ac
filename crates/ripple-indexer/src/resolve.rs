//! Mapping import specifiers to project files
//!
//! Resolution is lexical: specifiers are joined onto the importing file's key
//! and probed against a set of known keys. Nothing here reads the filesystem.

use std::collections::{BTreeMap, HashSet};

use ripple_core::paths::join_key;

/// Extensions probed for extension-less script specifiers, in order.
pub const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs"];

const EXTERNAL_PREFIXES: &[&str] = &["http://", "https://", "//", "#", "mailto:", "tel:", "data:"];

/// Resolve a JS/TS specifier. Only relative specifiers (`./x`, `../x`) are
/// internal; bare package names return `None`.
pub fn resolve_script(from_key: &str, spec: &str, exists: impl Fn(&str) -> bool) -> Option<String> {
    if !spec.starts_with('.') {
        return None;
    }
    let base = join_key(from_key, spec)?;
    if exists(&base) {
        return Some(base);
    }
    SCRIPT_EXTENSIONS
        .iter()
        .map(|ext| format!("{base}{ext}"))
        .chain(SCRIPT_EXTENSIONS.iter().map(|ext| format!("{base}/index{ext}")))
        .find(|candidate| exists(candidate))
}

/// Resolve an HTML/CSS asset reference: relative or root-absolute paths,
/// with query strings and fragments stripped.
pub fn resolve_asset(from_key: &str, reference: &str, exists: impl Fn(&str) -> bool) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty()
        || EXTERNAL_PREFIXES
            .iter()
            .any(|p| reference.to_ascii_lowercase().starts_with(p))
    {
        return None;
    }
    let path = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference);
    let key = join_key(from_key, path)?;
    exists(&key).then_some(key)
}

/// Dotted module name of a Python file key, or `None` for non-Python keys.
/// `pkg/__init__.py` names the package `pkg`.
pub fn python_module_name(key: &str) -> Option<String> {
    let stem = key
        .strip_suffix(".py")
        .or_else(|| key.strip_suffix(".pyi"))?;
    let stem = stem.strip_suffix("/__init__").unwrap_or(stem);
    if stem == "__init__" {
        return None;
    }
    Some(stem.replace('/', "."))
}

fn module_files(segments: &[&str]) -> [String; 2] {
    let path = segments.join("/");
    [format!("{path}.py"), format!("{path}/__init__.py")]
}

/// Directory segments of a key (everything but the file name).
fn dir_segments(key: &str) -> Vec<&str> {
    let mut parts: Vec<&str> = key.split('/').collect();
    parts.pop();
    parts
}

/// Candidate file keys for a Python import, most specific first. Relative
/// imports are anchored at the importing file's package; absolute imports
/// try the importing directory, then the root. Each level of the dotted
/// name is retried with its last segment dropped.
pub fn python_candidates(from_key: &str, import: &str) -> Vec<String> {
    let dots = import.chars().take_while(|c| *c == '.').count();
    let rest: Vec<&str> = import[dots..].split('.').filter(|s| !s.is_empty()).collect();

    let mut candidates = Vec::new();
    if dots > 0 {
        let mut base = dir_segments(from_key);
        for _ in 1..dots {
            if base.pop().is_none() {
                return candidates;
            }
        }
        for len in (0..=rest.len()).rev() {
            let mut segments = base.clone();
            segments.extend_from_slice(&rest[..len]);
            if segments.is_empty() {
                continue;
            }
            if len == 0 {
                candidates.push(format!("{}/__init__.py", segments.join("/")));
            } else {
                candidates.extend(module_files(&segments));
            }
        }
    } else {
        let dir = dir_segments(from_key);
        for len in (1..=rest.len()).rev() {
            if !dir.is_empty() {
                let mut local = dir.clone();
                local.extend_from_slice(&rest[..len]);
                candidates.extend(module_files(&local));
            }
            candidates.extend(module_files(&rest[..len]));
        }
    }
    candidates
}

/// Index of scanned Python modules for import matching.
#[derive(Debug, Default)]
pub struct PythonModuleIndex {
    keys: HashSet<String>,
    /// Dotted module name to file key.
    modules: BTreeMap<String, String>,
}

impl PythonModuleIndex {
    pub fn new<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        let mut sorted: Vec<&str> = keys.into_iter().collect();
        sorted.sort();
        for key in sorted {
            if let Some(module) = python_module_name(key) {
                index.keys.insert(key.to_string());
                index.modules.entry(module).or_insert_with(|| key.to_string());
            }
        }
        index
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Match an import to a scanned file: direct path candidates first, then
    /// a dotted-suffix match (`pkg.mod` matches `src.pkg.mod`) for absolute
    /// imports, retried with progressively shorter dotted prefixes.
    pub fn resolve(&self, from_key: &str, import: &str) -> Option<String> {
        if let Some(hit) = python_candidates(from_key, import)
            .into_iter()
            .find(|c| self.keys.contains(c))
        {
            return Some(hit);
        }
        if import.starts_with('.') {
            return None;
        }

        let segments: Vec<&str> = import.split('.').filter(|s| !s.is_empty()).collect();
        for len in (1..=segments.len()).rev() {
            let suffix = format!(".{}", segments[..len].join("."));
            let best = self
                .modules
                .iter()
                .filter(|(name, key)| name.ends_with(&suffix) && key.as_str() != from_key)
                .min_by_key(|(name, _)| name.len());
            if let Some((_, key)) = best {
                return Some(key.clone());
            }
        }
        None
    }
}
