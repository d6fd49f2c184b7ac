//! Integration tests for Ripple
//!
//! These tests drive the indexer, impact analyzer and safe editor together
//! against temporary repositories.

use std::fs;
use std::path::Path;

use ripple_core::{
    ChangeType, EditConfig, ImpactConfig, RepositoryStore, RippleConfig, RiskLevel,
    ensure_project_config, load_project_config,
};
use ripple_edit::{ContentWriter, EditError, EditOutcome, SafeEditor};
use ripple_impact::{ImpactAnalyzer, ImpactScorer};
use ripple_indexer::ProjectIndexer;
use tempfile::TempDir;

fn create_repo_with_structure(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    dir
}

fn index(root: &Path) -> (ProjectIndexer, RepositoryStore) {
    let indexer = ProjectIndexer::new(root).unwrap();
    let mut store = indexer.open_store();
    indexer.index_project(&mut store, false, None).unwrap();
    (indexer, store)
}

fn two_file_repo() -> TempDir {
    create_repo_with_structure(&[
        ("a.py", "import b\n\n\ndef main():\n    return b.VALUE\n"),
        ("b.py", "VALUE = 1\n"),
    ])
}

struct FailingWriter;

impl ContentWriter for FailingWriter {
    fn write(&self, path: &Path, _content: &str) -> std::io::Result<()> {
        fs::write(path, "partial")?;
        Err(std::io::Error::other("simulated failure"))
    }
}

#[test]
fn test_two_file_graph() {
    let repo = two_file_repo();
    let (_, store) = index(repo.path());
    let graph = store.graph();

    assert_eq!(graph.dependencies("a.py"), vec!["b.py"]);
    assert_eq!(graph.dependents("b.py"), vec!["a.py"]);
    assert!(graph.dependencies("b.py").is_empty());
    assert!(graph.dependents("a.py").is_empty());
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_delete_of_imported_file_is_high_risk() {
    let repo = two_file_repo();
    let (indexer, store) = index(repo.path());
    let mut analyzer = ImpactAnalyzer::from_store(indexer.root(), &store, ImpactConfig::default());

    let result = analyzer.analyze("b.py", ChangeType::Delete).unwrap();
    assert_eq!(result.affected_files, vec!["a.py"]);
    assert_eq!(result.risk_level, RiskLevel::High);
}

#[test]
fn test_syntax_error_edit_is_blocked() {
    let repo = two_file_repo();
    let original = fs::read_to_string(repo.path().join("a.py")).unwrap();
    let (indexer, store) = index(repo.path());
    let analyzer = ImpactAnalyzer::from_store(indexer.root(), &store, ImpactConfig::default());
    let mut editor =
        SafeEditor::new(repo.path(), EditConfig::default()).with_provider(Box::new(analyzer));

    let broken = "import b\n\n\ndef main(:\n    return b.VALUE\n";
    let ctx = editor.prepare(Path::new("a.py"), broken).unwrap();
    assert!(!ctx.safety_checks.syntax_valid);

    let outcome = editor.execute(ctx.clone(), false).unwrap();
    assert!(matches!(outcome, EditOutcome::Blocked(ref report) if !report.can_proceed));
    assert_eq!(fs::read_to_string(repo.path().join("a.py")).unwrap(), original);

    let forced = editor.execute(ctx, true).unwrap();
    assert!(forced.is_committed());
    assert_eq!(fs::read_to_string(repo.path().join("a.py")).unwrap(), broken);
}

#[test]
fn test_old_store_version_is_discarded() {
    let repo = two_file_repo();
    let data = repo.path().join(".ripple");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("repository_data.json"),
        r#"{"version": "0.9", "last_saved": null, "repository_files": {"a.py": {"bogus": true}}, "dependency_graph": {"a.py": ["b.py"]}}"#,
    )
    .unwrap();

    let store = RepositoryStore::open(repo.path());
    assert!(store.is_empty());
    assert_eq!(store.graph().edge_count(), 0);

    // A later index replaces the stale file.
    let (_, store) = index(repo.path());
    assert_eq!(store.len(), 2);
    let reloaded = RepositoryStore::open(repo.path());
    assert_eq!(reloaded.len(), 2);
}

#[test]
fn test_failed_write_leaves_content_unchanged() {
    let repo = two_file_repo();
    let before = fs::read_to_string(repo.path().join("b.py")).unwrap();
    let mut editor =
        SafeEditor::new(repo.path(), EditConfig::default()).with_writer(Box::new(FailingWriter));

    let ctx = editor.prepare(Path::new("b.py"), "VALUE = 2\n").unwrap();
    let err = editor.execute(ctx, false).unwrap_err();
    assert!(matches!(err, EditError::WriteFailed { .. }));
    assert_eq!(fs::read_to_string(repo.path().join("b.py")).unwrap(), before);
}

#[test]
fn test_edit_then_rollback() {
    let repo = two_file_repo();
    let before = fs::read_to_string(repo.path().join("b.py")).unwrap();
    let mut editor = SafeEditor::new(repo.path(), EditConfig::default());

    let ctx = editor.prepare(Path::new("b.py"), "VALUE = 2\n").unwrap();
    let outcome = editor.execute(ctx, false).unwrap();
    let edit_id = outcome.edit_id().unwrap().to_string();
    assert_eq!(
        fs::read_to_string(repo.path().join("b.py")).unwrap(),
        "VALUE = 2\n"
    );

    editor.rollback(&edit_id).unwrap();
    assert_eq!(fs::read_to_string(repo.path().join("b.py")).unwrap(), before);

    // History and backups survive a fresh editor.
    let reopened = SafeEditor::new(repo.path(), EditConfig::default());
    assert_eq!(reopened.history().len(), 1);
    assert_eq!(reopened.backups(Path::new("b.py")).unwrap().len(), 1);
}

#[test]
fn test_hash_changes_only_with_content() {
    let repo = two_file_repo();
    let (indexer, mut store) = index(repo.path());
    let first = store.get("b.py").unwrap().content_hash.clone();

    indexer.index_project(&mut store, true, None).unwrap();
    assert_eq!(store.get("b.py").unwrap().content_hash, first);

    fs::write(repo.path().join("b.py"), "VALUE = 2\n").unwrap();
    indexer.index_project(&mut store, false, None).unwrap();
    assert_ne!(store.get("b.py").unwrap().content_hash, first);
}

#[test]
fn test_graph_is_symmetric_without_self_loops() {
    let repo = create_repo_with_structure(&[
        ("pkg/__init__.py", "from . import core\n"),
        ("pkg/core.py", "from . import util\nfrom .core import thing\n"),
        ("pkg/util.py", "import pkg.core\n"),
        ("web/index.html", "<script src=\"app.js\"></script>\n"),
        ("web/app.js", "import { x } from './lib.js';\nimport './app.js';\n"),
        ("web/lib.js", "export const x = 1;\n"),
    ]);
    let (_, store) = index(repo.path());
    let graph = store.graph();

    assert!(graph.is_consistent());
    for (from, to) in graph.edges() {
        assert_ne!(from, to);
        assert!(graph.dependents(to).contains(&from.to_string()));
    }
    for file in graph.files() {
        for dependent in graph.dependents(file) {
            assert!(graph.dependencies(&dependent).contains(&file.to_string()));
        }
    }
    assert!(!graph.cycles().is_empty());
}

#[test]
fn test_scores_stay_in_unit_interval() {
    let scorer = ImpactScorer::default();
    for affected in [0, 1, 2, 3, 5, 6, 10, 11, 20, 21, 500] {
        for change in [ChangeType::Add, ChangeType::Modify, ChangeType::Delete] {
            for complexity in [0, 1, 5, 10, 255] {
                let score = scorer.score(affected, change, complexity);
                assert!((0.0..=1.0).contains(&score), "{affected} {change} {complexity}");
                let risk = scorer.risk(score, affected, change);
                if change == ChangeType::Delete && affected > 0 {
                    assert_eq!(risk, RiskLevel::High);
                }
                assert_ne!(risk, RiskLevel::Critical);
            }
        }
    }
}

#[test]
fn test_store_round_trip() {
    let repo = two_file_repo();
    let (_, store) = index(repo.path());
    let reloaded = RepositoryStore::open(repo.path());

    assert_eq!(reloaded.len(), store.len());
    assert_eq!(reloaded.graph(), store.graph());
    for original in store.files() {
        let loaded = reloaded.get(&original.file_path).unwrap();
        assert_eq!(loaded.content_hash, original.content_hash);
        assert_eq!(loaded.imports, original.imports);
        assert_eq!(loaded.functions, original.functions);
        assert_eq!(loaded.classes, original.classes);
        assert_eq!(loaded.dependencies, original.dependencies);
        assert_eq!(loaded.last_analyzed, original.last_analyzed);
        assert!((loaded.confidence_score - original.confidence_score).abs() < 1e-9);
    }
}

#[test]
fn test_cleanup_removes_vanished_files() {
    let repo = two_file_repo();
    let (indexer, mut store) = index(repo.path());
    fs::remove_file(repo.path().join("b.py")).unwrap();

    let removed = store.cleanup_stale(indexer.root(), 7);
    assert_eq!(removed, vec!["b.py"]);
    assert!(store.get("b.py").is_none());
    assert!(!store.graph().contains("b.py"));
    assert!(store.graph().dependencies("a.py").is_empty());
}

#[test]
fn test_config_defaults_round_trip() {
    let repo = create_repo_with_structure(&[]);
    let written = ensure_project_config(repo.path()).unwrap();
    assert_eq!(written, RippleConfig::default());
    assert!(repo.path().join(".ripple/config.toml").is_file());

    let loaded = load_project_config(repo.path()).unwrap();
    assert_eq!(loaded, RippleConfig::default());
}

#[test]
fn test_project_config_shapes_indexing() {
    let repo = create_repo_with_structure(&[
        (".ripple/config.toml", "[scan]\nexclude = [\"gen/**\"]\n"),
        ("main.py", "import gen.out\n"),
        ("gen/out.py", "X = 1\n"),
    ]);
    let (_, store) = index(repo.path());

    assert!(store.get("main.py").is_some());
    assert!(store.get("gen/out.py").is_none());
    assert!(store.graph().dependencies("main.py").is_empty());
}
