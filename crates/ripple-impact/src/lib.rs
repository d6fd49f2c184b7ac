//! Change impact scoring over the dependency graph

pub mod analyzer;
pub mod error;
pub mod result;
pub mod scorer;

#[cfg(test)]
pub mod tests;

pub use analyzer::{INDIRECT_DEPTH, ImpactAnalyzer, ImpactProvider, estimate_complexity};
pub use error::ImpactError;
pub use result::ImpactAnalysisResult;
pub use scorer::ImpactScorer;
