use chrono::{DateTime, Utc};
use ripple_core::{ChangeType, RiskLevel};
use serde::{Deserialize, Serialize};

/// One analyzed change. Derived data: safe to drop and recompute from the
/// graph and file records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysisResult {
    pub target_file: String,
    pub change_type: ChangeType,
    pub impact_score: f64,
    /// Files the target depends on, sorted.
    pub direct_dependencies: Vec<String>,
    /// Files depending on the target, sorted.
    pub reverse_dependencies: Vec<String>,
    pub affected_files: Vec<String>,
    pub risk_level: RiskLevel,
    pub complexity: u8,
    /// Dependents reached beyond the first hop. Informational only, not
    /// part of the score.
    #[serde(default)]
    pub indirect_dependents: Vec<String>,
    pub recommendations: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl ImpactAnalysisResult {
    pub fn affected_count(&self) -> usize {
        self.affected_files.len()
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_level >= RiskLevel::High
    }
}
