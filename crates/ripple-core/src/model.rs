//! Core data structures for analyzed repository files

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version stamp written into every analyzed record and the store file.
pub const ANALYSIS_VERSION: &str = "1.0";

/// Languages the scanner picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Html,
    Css,
    Json,
    Markdown,
    Yaml,
    Toml,
    Ini,
}

impl Language {
    /// Detect language from file extension. `None` means the file is not a
    /// scan candidate.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "py" | "pyi" => Some(Language::Python),
            "ts" | "tsx" => Some(Language::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "html" | "htm" => Some(Language::Html),
            "css" | "scss" | "sass" | "less" => Some(Language::Css),
            "json" => Some(Language::Json),
            "md" | "mdx" => Some(Language::Markdown),
            "yml" | "yaml" => Some(Language::Yaml),
            "toml" => Some(Language::Toml),
            "ini" | "cfg" => Some(Language::Ini),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Html => "html",
            Language::Css => "css",
            Language::Json => "json",
            Language::Markdown => "markdown",
            Language::Yaml => "yaml",
            Language::Toml => "toml",
            Language::Ini => "ini",
        }
    }

    /// JavaScript and TypeScript share one extractor.
    pub fn is_script(self) -> bool {
        matches!(self, Language::JavaScript | Language::TypeScript)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the extractor obtained a file's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Parsed into a syntax tree without errors.
    Ast,
    /// The language is only ever scanned with patterns.
    #[default]
    Pattern,
    /// Tree parsing failed and the regex pass was used instead.
    Fallback,
}

/// A function or free-standing callable found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    /// 1-based line of the definition.
    pub line: u32,
    #[serde(default)]
    pub is_async: bool,
    #[serde(default)]
    pub decorators: Vec<String>,
}

/// A method declared inside a class body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// A class definition found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub name: String,
    pub line: u32,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub bases: Vec<String>,
}

/// One scanned source file and everything extracted from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryFile {
    /// Root-relative, `/`-separated path. Unique key in the store.
    pub file_path: String,
    pub language: Language,
    pub content_hash: String,
    pub file_size: u64,
    pub line_count: u32,
    pub last_modified: DateTime<Utc>,
    pub last_analyzed: DateTime<Utc>,
    #[serde(default)]
    pub imports: Vec<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub functions: Vec<FunctionInfo>,
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    /// Root-relative paths of internal files this file depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// 0.0 ..= 1.0
    pub confidence_score: f64,
    /// 0 ..= 10
    pub complexity: u8,
    #[serde(default)]
    pub parse_mode: ParseMode,
    #[serde(default = "default_analysis_version")]
    pub analysis_version: String,
}

fn default_analysis_version() -> String {
    ANALYSIS_VERSION.to_string()
}

impl RepositoryFile {
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(|c| c.name.as_str())
    }
}

/// The kind of change being proposed for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Add,
    #[default]
    Modify,
    Delete,
}

impl ChangeType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Add => "add",
            ChangeType::Modify => "modify",
            ChangeType::Delete => "delete",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(ChangeType::Add),
            "modify" => Ok(ChangeType::Modify),
            "delete" => Ok(ChangeType::Delete),
            other => Err(format!(
                "invalid change type '{other}', expected one of: add, modify, delete"
            )),
        }
    }
}

/// Ordered risk classification. Impact analysis never yields `Critical`;
/// edit risk can.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
