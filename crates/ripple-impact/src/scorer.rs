//! Heuristic impact scoring

use ripple_core::{ChangeType, ImpactConfig, RiskLevel};

/// Turns an affected-file count, change type and file complexity into a
/// score in [0, 1] and a risk level.
#[derive(Debug, Clone, Default)]
pub struct ImpactScorer {
    config: ImpactConfig,
}

impl ImpactScorer {
    pub fn new(config: ImpactConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ImpactConfig {
        &self.config
    }

    /// Step function over the affected count. Bands are checked in
    /// ascending `max_affected` order.
    pub fn base_score(&self, affected: usize) -> f64 {
        self.config
            .bands
            .iter()
            .find(|band| affected <= band.max_affected)
            .map_or(self.config.overflow_score, |band| band.score)
    }

    pub fn change_multiplier(&self, change_type: ChangeType) -> f64 {
        match change_type {
            ChangeType::Add => self.config.add,
            ChangeType::Modify => self.config.modify,
            ChangeType::Delete => self.config.delete,
        }
    }

    pub fn complexity_multiplier(&self, complexity: u8) -> f64 {
        1.0 + f64::from(complexity.min(10)) / self.config.complexity_divisor
    }

    pub fn score(&self, affected: usize, change_type: ChangeType, complexity: u8) -> f64 {
        let raw = self.base_score(affected)
            * self.change_multiplier(change_type)
            * self.complexity_multiplier(complexity);
        if !raw.is_finite() {
            return 0.0;
        }
        (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0
    }

    /// Deleting a file that anything touches is always high risk.
    pub fn risk(&self, score: f64, affected: usize, change_type: ChangeType) -> RiskLevel {
        if change_type == ChangeType::Delete && affected > 0 {
            return RiskLevel::High;
        }
        if score >= self.config.high_score || affected >= self.config.high_count {
            RiskLevel::High
        } else if score >= self.config.medium_score || affected >= self.config.medium_count {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}
