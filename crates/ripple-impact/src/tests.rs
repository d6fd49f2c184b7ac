//! Unit tests for ripple-impact

use std::fs;
use std::path::Path;

use chrono::Utc;
use ripple_core::{
    ChangeType, DependencyGraph, ImpactConfig, Language, ParseMode, RepositoryFile,
    RepositoryStore, RiskLevel,
};
use tempfile::TempDir;

use crate::analyzer::{ImpactAnalyzer, ImpactProvider, estimate_complexity};
use crate::error::ImpactError;

fn record(path: &str, deps: &[&str], complexity: u8) -> RepositoryFile {
    let now = Utc::now();
    RepositoryFile {
        file_path: path.to_string(),
        language: Language::Python,
        content_hash: String::new(),
        file_size: 0,
        line_count: 0,
        last_modified: now,
        last_analyzed: now,
        imports: Vec::new(),
        exports: Vec::new(),
        functions: Vec::new(),
        classes: Vec::new(),
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
        confidence_score: 0.5,
        complexity,
        parse_mode: ParseMode::Ast,
        analysis_version: ripple_core::ANALYSIS_VERSION.to_string(),
    }
}

fn store_with(root: &Path, records: Vec<RepositoryFile>) -> RepositoryStore {
    let mut store = RepositoryStore::open(root);
    for r in records {
        store.upsert(r);
    }
    store
}

fn analyzer(root: &Path, records: Vec<RepositoryFile>) -> ImpactAnalyzer {
    let store = store_with(root, records);
    ImpactAnalyzer::from_store(root, &store, ImpactConfig::default())
}

#[test]
fn test_delete_with_one_dependent_is_high() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(
        dir.path(),
        vec![record("a.py", &["b.py"], 0), record("b.py", &[], 0)],
    );

    let result = analyzer.analyze("b.py", ChangeType::Delete).unwrap();
    assert_eq!(result.reverse_dependencies, vec!["a.py"]);
    assert_eq!(result.affected_files, vec!["a.py"]);
    assert_eq!(result.risk_level, RiskLevel::High);
    // 0.2 * 0.8 * 1.0
    assert_eq!(result.impact_score, 0.16);
    assert!(result.recommendations.iter().any(|r| r.contains("before deleting")));
}

#[test]
fn test_modify_counts_dependencies_and_dependents() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(
        dir.path(),
        vec![
            record("app.py", &["core.py"], 0),
            record("core.py", &["util.py", "db.py"], 4),
            record("util.py", &[], 0),
            record("db.py", &[], 0),
        ],
    );

    let modify = analyzer.analyze("core.py", ChangeType::Modify).unwrap();
    assert_eq!(modify.direct_dependencies, vec!["db.py", "util.py"]);
    assert_eq!(modify.reverse_dependencies, vec!["app.py"]);
    assert_eq!(modify.affected_files, vec!["app.py", "db.py", "util.py"]);
    assert_eq!(modify.complexity, 4);
    // 0.4 * 0.3 * 1.2
    assert_eq!(modify.impact_score, 0.14);
    assert_eq!(modify.risk_level, RiskLevel::Low);

    let add = analyzer.analyze("core.py", ChangeType::Add).unwrap();
    assert_eq!(add.affected_files, vec!["app.py"]);
}

#[test]
fn test_missing_file_is_not_found_unless_added() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(dir.path(), vec![record("a.py", &[], 0)]);

    assert!(matches!(
        analyzer.analyze("ghost.py", ChangeType::Modify),
        Err(ImpactError::NotFound(_))
    ));
    assert!(matches!(
        analyzer.analyze("ghost.py", ChangeType::Delete),
        Err(ImpactError::NotFound(_))
    ));

    let added = analyzer.analyze("ghost.py", ChangeType::Add).unwrap();
    assert!(added.affected_files.is_empty());
    assert_eq!(added.complexity, 0);
    assert_eq!(added.risk_level, RiskLevel::Low);
    assert_eq!(
        added.recommendations,
        vec!["Standard verification recommended.".to_string()]
    );
}

#[test]
fn test_unindexed_file_uses_size_estimate() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("big.js"), "x".repeat(6000)).unwrap();
    let mut analyzer = analyzer(dir.path(), Vec::new());

    let result = analyzer.analyze("big.js", ChangeType::Modify).unwrap();
    assert_eq!(result.complexity, 5);
    assert_eq!(estimate_complexity(10), 1);
    assert_eq!(estimate_complexity(4999), 3);
    assert_eq!(estimate_complexity(20_000), 7);
}

#[test]
fn test_outside_root_is_rejected() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(dir.path(), Vec::new());
    assert!(matches!(
        analyzer.analyze("/definitely/elsewhere.py", ChangeType::Modify),
        Err(ImpactError::OutsideRoot(_))
    ));
}

#[test]
fn test_indirect_dependents_are_informational() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(
        dir.path(),
        vec![
            record("base.py", &[], 0),
            record("mid.py", &["base.py"], 0),
            record("top.py", &["mid.py"], 0),
            record("app.py", &["top.py"], 0),
        ],
    );

    let result = analyzer.analyze("base.py", ChangeType::Modify).unwrap();
    assert_eq!(result.affected_files, vec!["mid.py"]);
    assert_eq!(result.indirect_dependents, vec!["top.py", "app.py"]);
    assert!(result.recommendations.iter().any(|r| r.contains("indirectly")));
}

#[test]
fn test_many_dependents_raise_risk() {
    let dir = TempDir::new().unwrap();
    let mut records = vec![record("shared.py", &[], 2)];
    for i in 0..9 {
        records.push(record(&format!("user{i}.py"), &["shared.py"], 0));
    }
    let mut analyzer = analyzer(dir.path(), records);

    let result = analyzer.analyze("shared.py", ChangeType::Modify).unwrap();
    assert_eq!(result.affected_count(), 9);
    assert_eq!(result.risk_level, RiskLevel::High);
    assert!(result.is_high_risk());
    assert!(result.recommendations.iter().any(|r| r.contains("staging")));
}

#[test]
fn test_results_are_cached_per_change_type() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(
        dir.path(),
        vec![record("a.py", &["b.py"], 0), record("b.py", &[], 0)],
    );

    assert!(analyzer.cached("b.py", ChangeType::Delete).is_none());
    analyzer.analyze_change_impact("b.py", ChangeType::Delete).unwrap();
    let cached = analyzer.cached("b.py", ChangeType::Delete).unwrap();
    assert_eq!(cached.risk_level, RiskLevel::High);
    assert!(analyzer.cached("b.py", ChangeType::Modify).is_none());

    analyzer.clear_cache();
    assert!(analyzer.cached("b.py", ChangeType::Delete).is_none());
}

#[test]
fn test_batch_reports_each_file() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(
        dir.path(),
        vec![record("a.py", &["b.py"], 0), record("b.py", &[], 0)],
    );

    let results = analyzer.analyze_batch(&["a.py", "b.py", "nope.py"], ChangeType::Modify);
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_ok());
    assert!(results[2].1.is_err());
}

#[test]
fn test_graph_only_snapshot() {
    let dir = TempDir::new().unwrap();
    let mut graph = DependencyGraph::new();
    graph.add_edge("x.py", "y.py");
    let mut analyzer = ImpactAnalyzer::new(dir.path(), graph, ImpactConfig::default());

    let result = analyzer.analyze("y.py", ChangeType::Delete).unwrap();
    assert_eq!(result.risk_level, RiskLevel::High);
    assert_eq!(result.complexity, 0);
}

#[test]
fn test_result_serializes_lowercase_enums() {
    let dir = TempDir::new().unwrap();
    let mut analyzer = analyzer(dir.path(), vec![record("a.py", &[], 0)]);
    let result = analyzer.analyze("a.py", ChangeType::Modify).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["change_type"], "modify");
    assert_eq!(json["risk_level"], "low");
    assert_eq!(json["target_file"], "a.py");
}
