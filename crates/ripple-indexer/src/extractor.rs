//! Language extractor trait definition

use ripple_core::{ClassInfo, FunctionInfo, ParseMode};

/// Everything an extractor pulls out of one file's text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Module or file specifiers exactly as written in the source.
    pub imports: Vec<String>,
    pub exports: Vec<String>,
    pub functions: Vec<FunctionInfo>,
    pub classes: Vec<ClassInfo>,
    pub parse_mode: ParseMode,
    pub has_docstring: bool,
}

impl Extraction {
    pub(crate) fn push_import(&mut self, spec: &str) {
        let spec = spec.trim();
        if !spec.is_empty() && !self.imports.iter().any(|i| i == spec) {
            self.imports.push(spec.to_string());
        }
    }

    pub(crate) fn push_export(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() && !self.exports.iter().any(|e| e == name) {
            self.exports.push(name.to_string());
        }
    }
}

pub trait LanguageExtractor: Send + Sync {
    /// Extraction never fails: unparseable input yields a best-effort result
    /// with a lower-trust parse mode.
    fn extract(&self, content: &str) -> Extraction;
}
