//! CLI command implementations

use std::fs;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use ripple_core::{ChangeType, Relation, RepositoryStore, SearchKind};
use ripple_edit::{EditOutcome, SafeEditor, ValidationReport};
use ripple_impact::{ImpactAnalysisResult, ImpactAnalyzer};
use ripple_indexer::{IndexError, IndexReport, ProjectIndexer};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ChangeArg {
    Add,
    Modify,
    Delete,
}

impl From<ChangeArg> for ChangeType {
    fn from(arg: ChangeArg) -> Self {
        match arg {
            ChangeArg::Add => ChangeType::Add,
            ChangeArg::Modify => ChangeType::Modify,
            ChangeArg::Delete => ChangeType::Delete,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Any,
    Name,
    Function,
    Class,
}

impl From<KindArg> for SearchKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Any => SearchKind::Any,
            KindArg::Name => SearchKind::Name,
            KindArg::Function => SearchKind::Function,
            KindArg::Class => SearchKind::Class,
        }
    }
}

/// Open the project and its store, indexing first when the store is empty.
fn open_project(root: &Path) -> anyhow::Result<(ProjectIndexer, RepositoryStore)> {
    let indexer = ProjectIndexer::new(root)
        .with_context(|| format!("cannot open project at {}", root.display()))?;
    let mut store = indexer.open_store();
    if store.is_empty() {
        tracing::info!("No repository data yet, indexing {}", indexer.root().display());
        let report = indexer.index_project(&mut store, false, None)?;
        log_report(&report);
    }
    Ok((indexer, store))
}

fn log_report(report: &IndexReport) {
    tracing::info!(
        "Indexed {} files ({} analyzed, {} unchanged, {} skipped, {} removed), {} edges in {}ms",
        report.scanned,
        report.analyzed,
        report.unchanged,
        report.skipped,
        report.removed.len(),
        report.edges,
        report.duration_ms
    );
}

pub fn index(root: &Path, force: bool, max_files: Option<usize>) -> anyhow::Result<()> {
    let indexer = ProjectIndexer::new(root)?;
    tracing::info!("Indexing repository: {}", indexer.root().display());

    let mut store = indexer.open_store();
    let report = indexer.index_project(&mut store, force, max_files)?;
    log_report(&report);

    println!(
        "{} files scanned, {} analyzed ({} ast, {} fallback), {} unchanged, {} dependency edges",
        report.scanned,
        report.analyzed,
        report.ast_parsed,
        report.fallback_parsed,
        report.unchanged,
        report.edges
    );
    Ok(())
}

fn print_impact(result: &ImpactAnalysisResult) {
    println!("{} ({})", result.target_file, result.change_type);
    println!("  impact score: {:.2}", result.impact_score);
    println!("  risk level:   {}", result.risk_level);
    println!("  complexity:   {}", result.complexity);
    println!("  affected files ({}):", result.affected_count());
    for file in &result.affected_files {
        println!("    {file}");
    }
    if !result.indirect_dependents.is_empty() {
        println!("  indirect dependents ({}):", result.indirect_dependents.len());
        for file in &result.indirect_dependents {
            println!("    {file}");
        }
    }
    println!("  recommendations:");
    for rec in &result.recommendations {
        println!("    - {rec}");
    }
}

pub fn impact(root: &Path, file: &Path, change: ChangeArg, json: bool) -> anyhow::Result<()> {
    let (indexer, store) = open_project(root)?;
    let key = indexer.key_for(file)?;
    let mut analyzer = ImpactAnalyzer::from_store(
        indexer.root(),
        &store,
        indexer.config().impact.clone(),
    );
    let result = analyzer.analyze(&key, change.into())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_impact(&result);
    }
    Ok(())
}

pub fn deps(root: &Path, file: &Path) -> anyhow::Result<()> {
    let (indexer, store) = open_project(root)?;
    let key = indexer.key_for(file)?;
    let graph = store.graph();

    println!("{key}");
    println!("  depends on:");
    for dep in graph.dependencies(&key) {
        println!("    {dep}");
    }
    println!("  used by:");
    for dependent in graph.dependents(&key) {
        println!("    {dependent}");
    }
    Ok(())
}

pub fn search(root: &Path, query: &str, kind: KindArg) -> anyhow::Result<()> {
    let (_, store) = open_project(root)?;
    let hits = store.search_by(query, kind.into());
    if hits.is_empty() {
        println!("No matches for '{query}'");
    }
    for hit in hits {
        println!("{:.2}  {}  ({})", hit.relevance, hit.file_path, hit.matched);
    }
    Ok(())
}

pub fn similar(root: &Path, file: &Path, threshold: f64) -> anyhow::Result<()> {
    let (indexer, store) = open_project(root)?;
    let key = indexer.key_for(file)?;
    for (path, score) in store.find_similar(&key, threshold) {
        println!("{score:.2}  {path}");
    }
    Ok(())
}

pub fn related(root: &Path, file: &Path, max: usize) -> anyhow::Result<()> {
    let (indexer, store) = open_project(root)?;
    let key = indexer.key_for(file)?;
    for rel in store.find_related(&key, max) {
        let relation = match rel.relation {
            Relation::Dependency => "dependency",
            Relation::Dependent => "dependent",
        };
        println!("{:.2}  {}  ({})", rel.confidence, rel.file_path, relation);
    }
    Ok(())
}

const HIGH_CONFIDENCE: f64 = 0.8;

pub fn summary(root: &Path) -> anyhow::Result<()> {
    let (_, store) = open_project(root)?;
    let summary = store.summary();

    println!("Files:          {}", summary.total_files);
    println!("Total size:     {} bytes", summary.total_size_bytes);
    println!("Total lines:    {}", summary.total_lines);
    println!("Avg confidence: {:.2}", summary.avg_confidence);
    println!("Connected:      {}", summary.dependency_connections);
    println!(
        "High confidence: {}",
        store.high_confidence_files(HIGH_CONFIDENCE).len()
    );
    println!("Languages:");
    for (language, count) in &summary.languages {
        println!("  {language}: {count}");
    }
    if !summary.key_files.is_empty() {
        println!("Key files:");
        for file in &summary.key_files {
            println!("  {file}");
        }
    }
    if let Some(updated) = summary.last_updated {
        println!("Last updated:   {}", updated.to_rfc3339());
    }
    Ok(())
}

pub fn cycles(root: &Path) -> anyhow::Result<()> {
    let (_, store) = open_project(root)?;
    let cycles = store.graph().cycles();
    if cycles.is_empty() {
        println!("No dependency cycles");
    }
    for cycle in cycles {
        println!("{}", cycle.join(" -> "));
    }
    Ok(())
}

pub fn cleanup(root: &Path, days: Option<i64>) -> anyhow::Result<()> {
    let indexer = ProjectIndexer::new(root)?;
    let mut store = indexer.open_store();
    let days = days.unwrap_or(indexer.config().store.retention_days);

    let removed = store.cleanup_stale(indexer.root(), days);
    store.save()?;

    let backups = SafeEditor::new(indexer.root(), indexer.config().edit.clone());
    let pruned = backups.prune_backups()?;

    println!(
        "Removed {} stale entries, pruned {} missing backups",
        removed.len(),
        pruned
    );
    for key in removed {
        println!("  {key}");
    }
    Ok(())
}

/// Re-analyze an edited file. Files the indexer does not track are left alone.
fn refresh_store(
    indexer: &ProjectIndexer,
    store: &mut RepositoryStore,
    key: &str,
) -> anyhow::Result<()> {
    match indexer.refresh_file(store, Path::new(key)) {
        Ok(_) => {}
        Err(IndexError::Unsupported(_)) => return Ok(()),
        Err(e) => {
            tracing::warn!("Could not refresh {} in the store: {}", key, e);
            return Ok(());
        }
    }
    store.save()?;
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("Risk level: {}", report.risk_level);
    for issue in &report.blocking_issues {
        println!("  blocking: {issue}");
    }
    for warning in &report.warnings {
        println!("  warning:  {warning}");
    }
    for rec in &report.recommendations {
        println!("  - {rec}");
    }
}

pub fn edit(
    root: &Path,
    file: &Path,
    proposed: &Path,
    force: bool,
    check: bool,
) -> anyhow::Result<()> {
    let proposed_content = fs::read_to_string(proposed)
        .with_context(|| format!("cannot read proposed content from {}", proposed.display()))?;
    let (indexer, mut store) = open_project(root)?;
    let analyzer = ImpactAnalyzer::from_store(
        indexer.root(),
        &store,
        indexer.config().impact.clone(),
    );
    let mut editor = SafeEditor::new(indexer.root(), indexer.config().edit.clone())
        .with_provider(Box::new(analyzer));

    let ctx = editor.prepare(file, &proposed_content)?;
    println!(
        "{} edit of {} (impact {:.2})",
        ctx.edit_type, ctx.file_path, ctx.impact_score
    );

    if check {
        print_report(&editor.validate(&ctx));
        return Ok(());
    }

    match editor.execute(ctx, force)? {
        EditOutcome::Blocked(report) => {
            print_report(&report);
            anyhow::bail!("edit blocked, re-run with --force to apply anyway");
        }
        EditOutcome::Committed {
            edit_id,
            file_path,
            backup_path,
            warnings,
        } => {
            for warning in &warnings {
                println!("  warning: {warning}");
            }
            println!("Committed {edit_id} to {file_path}");
            println!("Backup: {}", backup_path.display());

            refresh_store(&indexer, &mut store, &file_path)?;
        }
    }
    Ok(())
}

pub fn rollback(root: &Path, edit_id: &str) -> anyhow::Result<()> {
    let indexer = ProjectIndexer::new(root)?;
    let mut editor = SafeEditor::new(indexer.root(), indexer.config().edit.clone());
    let outcome = editor.rollback(edit_id)?;
    println!(
        "Restored {} from {}",
        outcome.restored_file,
        outcome.backup_used.display()
    );

    let mut store = indexer.open_store();
    if !store.is_empty() {
        refresh_store(&indexer, &mut store, &outcome.restored_file)?;
    }
    Ok(())
}

pub fn history(root: &Path, file: Option<&Path>) -> anyhow::Result<()> {
    let indexer = ProjectIndexer::new(root)?;
    let editor = SafeEditor::new(indexer.root(), indexer.config().edit.clone());
    let entries = match file {
        Some(file) => editor.history_for(file)?,
        None => editor.history().iter().collect(),
    };
    if entries.is_empty() {
        println!("No edits recorded");
    }
    for edit in entries {
        println!(
            "{}  {}  {}  {}  {:?}",
            edit.edit_id.as_deref().unwrap_or("-"),
            edit.timestamp.to_rfc3339(),
            edit.edit_type,
            edit.file_path,
            edit.state
        );
    }
    Ok(())
}

pub fn backups(root: &Path, file: &Path) -> anyhow::Result<()> {
    let indexer = ProjectIndexer::new(root)?;
    let editor = SafeEditor::new(indexer.root(), indexer.config().edit.clone());
    let records = editor.backups(file)?;
    if records.is_empty() {
        println!("No backups for {}", file.display());
    }
    for record in records {
        println!("{}  {}", record.timestamp, record.backup_path.display());
    }
    Ok(())
}

pub fn patterns(root: &Path, file: &Path) -> anyhow::Result<()> {
    let indexer = ProjectIndexer::new(root)?;
    let editor = SafeEditor::new(indexer.root(), indexer.config().edit.clone());
    let patterns = editor.analyze_change_patterns(file)?;

    println!("{}", patterns.file_path);
    println!("  edits:          {}", patterns.edit_count);
    println!("  average impact: {:.2}", patterns.average_impact_score);
    for (risk, count) in &patterns.risk_distribution {
        println!("  {risk}: {count}");
    }
    for rec in &patterns.recommendations {
        println!("  - {rec}");
    }
    Ok(())
}

pub fn init(root: &Path) -> anyhow::Result<()> {
    ripple_core::ensure_project_config(root)?;
    println!(
        "Wrote {}",
        ripple_core::paths::config_path(root).display()
    );
    Ok(())
}

pub fn clear(root: &Path) -> anyhow::Result<()> {
    tracing::info!("Clearing data for: {}", root.display());
    ripple_core::clear_data(root)?;
    tracing::info!("Data cleared");
    Ok(())
}
