//! Unit tests for ripple-core module

use std::path::Path;

use chrono::{Duration, Utc};

use crate::paths::{join_key, normalize_relative};
use crate::test_utils::{class, create_repo_with_structure, function, record};
use crate::*;

#[test]
fn test_language_detection() {
    assert_eq!(Language::from_path(Path::new("a/b.py")), Some(Language::Python));
    assert_eq!(Language::from_path(Path::new("x.TSX")), Some(Language::TypeScript));
    assert_eq!(Language::from_path(Path::new("x.mjs")), Some(Language::JavaScript));
    assert_eq!(Language::from_path(Path::new("page.htm")), Some(Language::Html));
    assert_eq!(Language::from_path(Path::new("setup.cfg")), Some(Language::Ini));
    assert_eq!(Language::from_path(Path::new("main.rs")), None);
    assert_eq!(Language::from_path(Path::new("Makefile")), None);
}

#[test]
fn test_risk_level_ordering() {
    assert!(RiskLevel::Low < RiskLevel::Medium);
    assert!(RiskLevel::Medium < RiskLevel::High);
    assert!(RiskLevel::High < RiskLevel::Critical);
    assert_eq!(RiskLevel::High.max(RiskLevel::Medium), RiskLevel::High);
}

#[test]
fn test_change_type_parse() {
    assert_eq!("Delete".parse::<ChangeType>().unwrap(), ChangeType::Delete);
    assert!("rename".parse::<ChangeType>().is_err());
}

#[test]
fn test_key_normalization() {
    let root = Path::new("/repo");
    assert_eq!(to_key(root, Path::new("/repo/src/./a.py")), Some("src/a.py".into()));
    assert_eq!(to_key(root, Path::new("src/x/../a.py")), Some("src/a.py".into()));
    assert_eq!(to_key(root, Path::new("/elsewhere/a.py")), None);
    assert_eq!(normalize_relative(Path::new("../a.py")), None);
    assert_eq!(from_key(root, "src/a.py"), Path::new("/repo/src/a.py"));
}

#[test]
fn test_join_key() {
    assert_eq!(join_key("web/index.html", "css/site.css"), Some("web/css/site.css".into()));
    assert_eq!(join_key("web/index.html", "../lib/a.js"), Some("lib/a.js".into()));
    assert_eq!(join_key("web/index.html", "/assets/a.css"), Some("assets/a.css".into()));
    assert_eq!(join_key("a.js", "../outside.js"), None);
}

#[test]
fn test_graph_symmetry_and_self_edges() {
    let mut graph = DependencyGraph::new();
    assert!(graph.add_edge("a.py", "b.py"));
    assert!(!graph.add_edge("a.py", "b.py"));
    assert!(!graph.add_edge("a.py", "a.py"));
    graph.add_edge("c.py", "b.py");

    assert_eq!(graph.dependents("b.py"), vec!["a.py", "c.py"]);
    assert_eq!(graph.dependencies("a.py"), vec!["b.py"]);
    assert!(!graph.depends_on("a.py", "a.py"));
    assert!(graph.is_consistent());

    graph.set_dependencies("a.py", ["c.py"]);
    assert_eq!(graph.dependents("b.py"), vec!["c.py"]);
    assert_eq!(graph.dependents("c.py"), vec!["a.py"]);
    assert!(graph.is_consistent());
}

#[test]
fn test_graph_remove_file_drops_incoming_edges() {
    let mut graph = DependencyGraph::new();
    graph.add_edge("a.py", "b.py");
    graph.add_edge("b.py", "c.py");
    graph.remove_file("b.py");

    assert!(graph.dependencies("a.py").is_empty());
    assert!(graph.dependents("c.py").is_empty());
    assert!(!graph.files().contains("b.py"));
    assert!(graph.is_consistent());
}

#[test]
fn test_graph_serializes_forward_only() {
    let mut graph = DependencyGraph::new();
    graph.add_edge("a.py", "b.py");
    graph.add_edge("c.py", "b.py");

    let json = serde_json::to_value(&graph).unwrap();
    assert_eq!(json, serde_json::json!({"a.py": ["b.py"], "c.py": ["b.py"]}));

    let back: DependencyGraph = serde_json::from_value(json).unwrap();
    assert_eq!(back.dependents("b.py"), vec!["a.py", "c.py"]);
    assert!(back.is_consistent());
}

#[test]
fn test_graph_deserialize_drops_self_edges() {
    let back: DependencyGraph =
        serde_json::from_str(r#"{"a.py": ["a.py", "b.py"]}"#).unwrap();
    assert_eq!(back.dependencies("a.py"), vec!["b.py"]);
}

#[test]
fn test_transitive_dependents() {
    let mut graph = DependencyGraph::new();
    graph.add_edge("b.py", "a.py");
    graph.add_edge("c.py", "b.py");
    graph.add_edge("d.py", "c.py");

    let all = graph.transitive_dependents("a.py", 10);
    assert_eq!(
        all,
        vec![("b.py".into(), 1), ("c.py".into(), 2), ("d.py".into(), 3)]
    );
    assert_eq!(graph.transitive_dependents("a.py", 2).len(), 2);
}

#[test]
fn test_cycles() {
    let mut graph = DependencyGraph::new();
    graph.add_edge("a.py", "b.py");
    graph.add_edge("b.py", "a.py");
    graph.add_edge("c.py", "a.py");

    assert_eq!(graph.cycles(), vec![vec!["a.py".to_string(), "b.py".to_string()]]);
}

#[test]
fn test_store_round_trip() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    assert!(store.is_empty());

    let mut a = record("a.py", Language::Python, &["b.py"]);
    a.functions.push(function("run"));
    store.upsert(a.clone());
    store.upsert(record("b.py", Language::Python, &[]));
    store.save().unwrap();

    let reloaded = RepositoryStore::open(temp.path());
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.get("a.py"), Some(&a));
    assert_eq!(reloaded.graph().dependents("b.py"), vec!["a.py"]);
    assert!(reloaded.last_saved().is_some());
}

#[test]
fn test_store_version_mismatch_yields_empty() {
    let temp = create_repo_with_structure(&[(
        ".ripple/repository_data.json",
        r#"{"version": "0.9", "repository_files": {}, "dependency_graph": {}}"#,
    )]);
    let store = RepositoryStore::open(temp.path());
    assert!(store.is_empty());
}

#[test]
fn test_store_corrupt_file_yields_empty() {
    let temp = create_repo_with_structure(&[(".ripple/repository_data.json", "{not json")]);
    assert!(RepositoryStore::open(temp.path()).is_empty());
}

#[test]
fn test_store_accepts_legacy_keys() {
    let now = Utc::now().to_rfc3339();
    let json = format!(
        r#"{{"version": "1.0", "last_updated": "{now}", "files": {{
            "a.py": {{"file_path": "a.py", "language": "python", "content_hash": "x",
                      "file_size": 1, "line_count": 1, "last_modified": "{now}",
                      "last_analyzed": "{now}", "confidence_score": 0.4, "complexity": 0}}
        }}, "dependency_graph": {{}}}}"#
    );
    let temp = create_repo_with_structure(&[(".ripple/repository_data.json", &json)]);
    let store = RepositoryStore::open(temp.path());
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("a.py").unwrap().parse_mode, ParseMode::Pattern);
    assert!(store.last_saved().is_some());
}

#[test]
fn test_store_prefers_current_keys_over_legacy() {
    let file = |path: &str| {
        format!(
            r#""{path}": {{"file_path": "{path}", "language": "python", "content_hash": "x",
                "file_size": 1, "line_count": 1, "last_modified": "2026-01-01T00:00:00Z",
                "last_analyzed": "2026-01-01T00:00:00Z", "confidence_score": 0.4, "complexity": 0}}"#
        )
    };
    let json = format!(
        r#"{{"version": "1.0",
            "last_saved": "2026-03-01T00:00:00Z", "last_updated": "2025-01-01T00:00:00Z",
            "repository_files": {{{}}}, "files": {{{}}},
            "dependency_graph": {{}}}}"#,
        file("new.py"),
        file("old.py")
    );
    let temp = create_repo_with_structure(&[(".ripple/repository_data.json", &json)]);
    let mut store = RepositoryStore::open(temp.path());
    assert_eq!(store.len(), 1);
    assert!(store.get("new.py").is_some());
    assert_eq!(
        store.last_saved().unwrap().to_rfc3339(),
        "2026-03-01T00:00:00+00:00"
    );

    store.save().unwrap();
    let written = std::fs::read_to_string(temp.path().join(".ripple/repository_data.json")).unwrap();
    assert!(!written.contains("last_updated"));
    assert!(!written.contains("\"files\""));
}

#[test]
fn test_store_remove_updates_dependents() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    store.upsert(record("a.py", Language::Python, &["b.py"]));
    store.upsert(record("b.py", Language::Python, &[]));

    store.remove("b.py");
    assert!(store.get("a.py").unwrap().dependencies.is_empty());
    assert!(store.graph().dependents("b.py").is_empty());
}

#[test]
fn test_search_matches_paths_and_symbols() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    let mut a = record("pkg/auth.py", Language::Python, &[]);
    a.classes.push(class("LoginManager"));
    let mut b = record("pkg/util.py", Language::Python, &[]);
    b.functions.push(function("parse_token"));
    store.upsert(a);
    store.upsert(b);

    let paths: Vec<&str> = store.search("AUTH").iter().map(|f| f.file_path.as_str()).collect();
    assert_eq!(paths, vec!["pkg/auth.py"]);
    assert_eq!(store.search("login").len(), 1);
    assert_eq!(store.search("token").len(), 1);
    assert_eq!(store.search("pkg").len(), 2);
    assert!(store.search("").is_empty());
}

#[test]
fn test_search_by_ranks_exact_matches_first() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    let mut exact = record("a.py", Language::Python, &[]);
    exact.functions.push(function("load"));
    let mut partial = record("b.py", Language::Python, &[]);
    partial.functions.push(function("load_all"));
    store.upsert(partial);
    store.upsert(exact);

    let hits = store.search_by("load", SearchKind::Function);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].file_path, "a.py");
    assert!((hits[0].relevance - 0.5).abs() < 1e-9);
    assert!((hits[1].relevance - 0.4).abs() < 1e-9);

    assert!(store.search_by("load", SearchKind::Class).is_empty());
    let by_name = store.search_by("a", SearchKind::Name);
    assert_eq!(by_name[0].file_path, "a.py");
}

#[test]
fn test_similarity() {
    let mut a = record("a.py", Language::Python, &[]);
    a.imports = vec!["os".into(), "sys".into()];
    a.functions = vec![function("f"), function("g")];
    let mut b = a.clone();
    b.file_path = "b.py".into();
    assert!((RepositoryStore::similarity(&a, &b) - 0.7).abs() < 1e-9);

    b.classes.push(class("K"));
    a.classes.push(class("K"));
    assert!((RepositoryStore::similarity(&a, &b) - 1.0).abs() < 1e-9);

    let mut js = b.clone();
    js.language = Language::JavaScript;
    assert_eq!(RepositoryStore::similarity(&a, &js), 0.0);
}

#[test]
fn test_find_similar_and_related() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    let mut a = record("a.py", Language::Python, &["b.py"]);
    a.functions = vec![function("f")];
    let mut b = record("b.py", Language::Python, &[]);
    b.functions = vec![function("f")];
    b.confidence_score = 0.9;
    let c = record("c.py", Language::Python, &["a.py"]);
    store.upsert(a);
    store.upsert(b);
    store.upsert(c);

    let similar = store.find_similar("a.py", 0.3);
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].0, "b.py");

    let related = store.find_related("a.py", 10);
    assert_eq!(related.len(), 2);
    assert_eq!(related[0].file_path, "b.py");
    assert_eq!(related[0].relation, Relation::Dependency);
    assert_eq!(related[1].relation, Relation::Dependent);
    assert_eq!(store.find_related("a.py", 1).len(), 1);
}

#[test]
fn test_key_files_and_summary() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    store.upsert(record("app/main.py", Language::Python, &["app/util.py"]));
    let mut util = record("app/util.py", Language::Python, &[]);
    util.file_size = 40;
    util.line_count = 3;
    store.upsert(util);
    store.upsert(record("web/index.js", Language::JavaScript, &[]));

    assert_eq!(store.key_files(), vec!["app/main.py", "web/index.js"]);
    let summary = store.summary();
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.total_lines, 3);
    assert_eq!(summary.total_size_bytes, 40);
    assert_eq!(summary.languages[&Language::Python], 2);
    assert_eq!(summary.dependency_connections, 1);
    assert!((summary.avg_confidence - 0.5).abs() < 1e-9);
    assert_eq!(store.files_by_language(Language::JavaScript).len(), 1);
}

#[test]
fn test_high_confidence_files_sorted_descending() {
    let temp = create_repo_with_structure(&[]);
    let mut store = RepositoryStore::open(temp.path());
    for (path, confidence) in [("low.py", 0.3), ("mid.py", 0.8), ("top.py", 0.95)] {
        let mut file = record(path, Language::Python, &[]);
        file.confidence_score = confidence;
        store.upsert(file);
    }

    let paths: Vec<&str> = store
        .high_confidence_files(0.8)
        .iter()
        .map(|f| f.file_path.as_str())
        .collect();
    assert_eq!(paths, vec!["top.py", "mid.py"]);
    assert!(store.high_confidence_files(0.99).is_empty());
}

#[test]
fn test_cleanup_stale_removes_missing_and_old() {
    let temp = create_repo_with_structure(&[("a.py", "import b\n"), ("old.py", "x = 1\n")]);
    let mut store = RepositoryStore::open(temp.path());
    store.upsert(record("a.py", Language::Python, &["gone.py"]));
    store.upsert(record("gone.py", Language::Python, &[]));
    let mut old = record("old.py", Language::Python, &[]);
    old.last_analyzed = Utc::now() - Duration::days(30);
    store.upsert(old);

    let mut removed = store.cleanup_stale(temp.path(), 7);
    removed.sort();
    assert_eq!(removed, vec!["gone.py", "old.py"]);
    assert_eq!(store.len(), 1);
    assert!(store.graph().dependencies("a.py").is_empty());
    assert!(!store.graph().files().contains("gone.py"));
}
