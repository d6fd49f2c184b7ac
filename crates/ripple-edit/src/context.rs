//! Edit context and safety check results

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ripple_core::{ChangeType, RiskLevel};
use serde::{Deserialize, Serialize};

/// Lifecycle of a single edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    #[default]
    Proposed,
    Validated,
    BackedUp,
    Written,
    Committed,
    RolledBack,
}

/// Heuristic checks run against a proposed edit. `true` means passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyChecks {
    pub syntax_valid: bool,
    pub imports_resolved: bool,
    pub functions_preserved: bool,
    pub classes_preserved: bool,
    pub api_compatible: bool,
    pub no_infinite_loops: bool,
    pub no_dynamic_execution: bool,
}

impl Default for SafetyChecks {
    fn default() -> Self {
        Self {
            syntax_valid: true,
            imports_resolved: true,
            functions_preserved: true,
            classes_preserved: true,
            api_compatible: true,
            no_infinite_loops: true,
            no_dynamic_execution: true,
        }
    }
}

impl SafetyChecks {
    pub fn entries(&self) -> [(&'static str, bool); 7] {
        [
            ("syntax_valid", self.syntax_valid),
            ("imports_resolved", self.imports_resolved),
            ("functions_preserved", self.functions_preserved),
            ("classes_preserved", self.classes_preserved),
            ("api_compatible", self.api_compatible),
            ("no_infinite_loops", self.no_infinite_loops),
            ("no_dynamic_execution", self.no_dynamic_execution),
        ]
    }

    /// Names of failed checks, in declaration order.
    pub fn failed(&self) -> Vec<&'static str> {
        self.entries()
            .into_iter()
            .filter(|(_, passed)| !passed)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn all_passed(&self) -> bool {
        self.entries().iter().all(|(_, passed)| *passed)
    }
}

/// A proposed single-file edit and everything learned about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditContext {
    #[serde(default)]
    pub edit_id: Option<String>,
    /// Store key of the target file.
    pub file_path: String,
    pub original_content: String,
    pub proposed_content: String,
    pub edit_type: ChangeType,
    pub risk_level: RiskLevel,
    pub impact_score: f64,
    #[serde(default)]
    pub affected_files: Vec<String>,
    pub safety_checks: SafetyChecks,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub backup_path: Option<PathBuf>,
    #[serde(default)]
    pub state: EditState,
    pub timestamp: DateTime<Utc>,
}

/// Result of `SafeEditor::validate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub is_safe: bool,
    pub risk_level: RiskLevel,
    pub blocking_issues: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub can_proceed: bool,
}
