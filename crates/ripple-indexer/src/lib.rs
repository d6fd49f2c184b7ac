//! File scanning, dependency extraction and graph building

pub mod error;
pub mod extractor;
pub mod graph_builder;
pub mod indexer;
pub mod languages;
pub mod metrics;
pub mod resolve;
pub mod scanner;
pub mod syntax;


pub use error::IndexError;
pub use extractor::{Extraction, LanguageExtractor};
pub use graph_builder::{DependencyResolver, patch_file, rebuild_graph};
pub use indexer::{IndexReport, ProjectIndexer, analyze_content, content_hash};
pub use scanner::{FileScanner, IGNORE_DIRS, IGNORE_FILES, ScannedFile};
pub use syntax::{SyntaxIssue, parse_python, python_syntax_error};
