//! Content-diff impact estimate used when no impact provider is available

use std::collections::{BTreeSet, HashMap};

use ripple_core::{ChangeType, Language, RiskLevel};
use ripple_indexer::Extraction;
use ripple_indexer::languages::get_extractor;

/// Empty to non-empty is an add, non-empty to empty a delete.
pub fn edit_type(original: &str, proposed: &str) -> ChangeType {
    match (original.trim().is_empty(), proposed.trim().is_empty()) {
        (true, false) => ChangeType::Add,
        (false, true) => ChangeType::Delete,
        _ => ChangeType::Modify,
    }
}

/// Edit risk from an impact score: below 0.2 low, below 0.5 medium,
/// below 0.8 high, else critical.
pub fn risk_from_score(score: f64) -> RiskLevel {
    if !score.is_finite() || score < 0.2 {
        RiskLevel::Low
    } else if score < 0.5 {
        RiskLevel::Medium
    } else if score < 0.8 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

fn names(extraction: &Extraction) -> (BTreeSet<&str>, BTreeSet<&str>) {
    (
        extraction.functions.iter().map(|f| f.name.as_str()).collect(),
        extraction.classes.iter().map(|c| c.name.as_str()).collect(),
    )
}

fn python_impact(original: &str, proposed: &str) -> f64 {
    let extractor = get_extractor(Language::Python);
    let before = extractor.extract(original);
    let after = extractor.extract(proposed);
    let (before_fns, before_classes) = names(&before);
    let (after_fns, after_classes) = names(&after);

    let mut score = 0.0;
    let before_imports: BTreeSet<&String> = before.imports.iter().collect();
    let after_imports: BTreeSet<&String> = after.imports.iter().collect();
    if before_imports != after_imports {
        score += 0.3;
    }
    if !before_fns.is_subset(&after_fns) {
        score += 0.5;
    }
    if !before_classes.is_subset(&after_classes) {
        score += 0.4;
    }
    f64::min(score, 1.0)
}

fn script_impact(original: &str, proposed: &str) -> f64 {
    let extractor = get_extractor(Language::JavaScript);
    let before = extractor.extract(original);
    let after = extractor.extract(proposed);

    let mut score = 0.0;
    let before_exports: BTreeSet<&String> = before.exports.iter().collect();
    let after_exports: BTreeSet<&String> = after.exports.iter().collect();
    if before_exports != after_exports {
        score += 0.4;
    }
    if !names(&before).0.is_subset(&names(&after).0) {
        score += 0.3;
    }
    f64::min(score, 1.0)
}

/// Share of lines added or removed, compared as multisets.
fn line_change_ratio(original: &str, proposed: &str) -> f64 {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for line in original.lines() {
        *counts.entry(line).or_default() += 1;
    }
    for line in proposed.lines() {
        *counts.entry(line).or_default() -= 1;
    }
    let changed: i64 = counts.values().map(|c| c.abs()).sum();
    let total = original.lines().count().max(proposed.lines().count()).max(1);
    f64::min(changed as f64 / total as f64, 1.0)
}

pub fn estimate_edit_impact(language: Option<Language>, original: &str, proposed: &str) -> f64 {
    match language {
        Some(Language::Python) => python_impact(original, proposed),
        Some(Language::JavaScript | Language::TypeScript) => script_impact(original, proposed),
        _ => line_change_ratio(original, proposed),
    }
}
