//! Change impact analysis over a repository snapshot

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use ripple_core::{
    ChangeType, DependencyGraph, ImpactConfig, RepositoryStore, RiskLevel, from_key, to_key,
};

use crate::error::ImpactError;
use crate::result::ImpactAnalysisResult;
use crate::scorer::ImpactScorer;

/// Hops followed when collecting indirect dependents.
pub const INDIRECT_DEPTH: usize = 5;

/// Anything that can assess a proposed change to one file. The safe editor
/// consults an optional provider and falls back to its own heuristic.
pub trait ImpactProvider {
    fn analyze_change_impact(
        &mut self,
        path: &str,
        change_type: ChangeType,
    ) -> Result<ImpactAnalysisResult, ImpactError>;
}

/// Size-based complexity for files without a stored record.
pub fn estimate_complexity(size: u64) -> u8 {
    match size {
        0..1000 => 1,
        1000..5000 => 3,
        5000..10000 => 5,
        _ => 7,
    }
}

pub struct ImpactAnalyzer {
    root: PathBuf,
    graph: DependencyGraph,
    complexity: BTreeMap<String, u8>,
    scorer: ImpactScorer,
    cache: HashMap<(String, ChangeType), ImpactAnalysisResult>,
}

impl ImpactAnalyzer {
    pub fn new(root: &Path, graph: DependencyGraph, config: ImpactConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            graph,
            complexity: BTreeMap::new(),
            scorer: ImpactScorer::new(config),
            cache: HashMap::new(),
        }
    }

    /// Snapshot the store's graph and per-file complexity.
    pub fn from_store(root: &Path, store: &RepositoryStore, config: ImpactConfig) -> Self {
        let mut analyzer = Self::new(root, store.graph().clone(), config);
        analyzer.complexity = store
            .files()
            .map(|f| (f.file_path.clone(), f.complexity))
            .collect();
        analyzer
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn scorer(&self) -> &ImpactScorer {
        &self.scorer
    }

    pub fn cached(&self, key: &str, change_type: ChangeType) -> Option<&ImpactAnalysisResult> {
        self.cache.get(&(key.to_string(), change_type))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn key_for(&self, path: &str) -> Result<String, ImpactError> {
        let candidate = Path::new(path);
        to_key(&self.root, candidate).ok_or_else(|| ImpactError::OutsideRoot(path.to_string()))
    }

    /// Stored complexity, else a size estimate, else 0 for a missing file.
    pub fn complexity_of(&self, key: &str) -> u8 {
        if let Some(&complexity) = self.complexity.get(key) {
            return complexity;
        }
        std::fs::metadata(from_key(&self.root, key))
            .map(|m| estimate_complexity(m.len()))
            .unwrap_or(0)
    }

    fn is_known(&self, key: &str) -> bool {
        self.complexity.contains_key(key)
            || self.graph.contains(key)
            || from_key(&self.root, key).is_file()
    }

    pub fn analyze(
        &mut self,
        path: &str,
        change_type: ChangeType,
    ) -> Result<ImpactAnalysisResult, ImpactError> {
        let started = Instant::now();
        let key = self.key_for(path)?;
        if change_type != ChangeType::Add && !self.is_known(&key) {
            return Err(ImpactError::NotFound(key));
        }

        let direct = self.graph.dependencies(&key);
        let reverse = self.graph.dependents(&key);
        let mut affected: BTreeSet<String> = reverse.iter().cloned().collect();
        if change_type != ChangeType::Add {
            affected.extend(direct.iter().cloned());
        }
        affected.remove(&key);
        let affected: Vec<String> = affected.into_iter().collect();

        let complexity = self.complexity_of(&key);
        let impact_score = self.scorer.score(affected.len(), change_type, complexity);
        let risk_level = self.scorer.risk(impact_score, affected.len(), change_type);

        let indirect: Vec<String> = self
            .graph
            .transitive_dependents(&key, INDIRECT_DEPTH)
            .into_iter()
            .filter(|(_, depth)| *depth > 1)
            .map(|(file, _)| file)
            .collect();

        let recommendations =
            recommendations(risk_level, change_type, &affected, &reverse, &indirect);

        tracing::debug!(
            "Impact of {} {}: score {:.2}, {} affected, risk {}",
            change_type,
            key,
            impact_score,
            affected.len(),
            risk_level
        );

        let result = ImpactAnalysisResult {
            target_file: key.clone(),
            change_type,
            impact_score,
            direct_dependencies: direct,
            reverse_dependencies: reverse,
            affected_files: affected,
            risk_level,
            complexity,
            indirect_dependents: indirect,
            recommendations,
            analyzed_at: Utc::now(),
            processing_time_ms: started.elapsed().as_millis() as u64,
        };
        self.cache.insert((key, change_type), result.clone());
        Ok(result)
    }

    /// Analyze several files independently. Failures are returned per path.
    pub fn analyze_batch(
        &mut self,
        paths: &[&str],
        change_type: ChangeType,
    ) -> Vec<(String, Result<ImpactAnalysisResult, ImpactError>)> {
        paths
            .iter()
            .map(|path| (path.to_string(), self.analyze(path, change_type)))
            .collect()
    }
}

impl ImpactProvider for ImpactAnalyzer {
    fn analyze_change_impact(
        &mut self,
        path: &str,
        change_type: ChangeType,
    ) -> Result<ImpactAnalysisResult, ImpactError> {
        self.analyze(path, change_type)
    }
}

fn recommendations(
    risk: RiskLevel,
    change_type: ChangeType,
    affected: &[String],
    reverse: &[String],
    indirect: &[String],
) -> Vec<String> {
    let mut out = Vec::new();
    match risk {
        RiskLevel::High | RiskLevel::Critical => {
            out.push("High-risk change. Test thoroughly.".to_string());
            if affected.len() > 5 {
                out.push("Consider staging changes.".to_string());
            }
        }
        RiskLevel::Medium => out.push("Verify related files functionality.".to_string()),
        RiskLevel::Low => {}
    }
    if change_type == ChangeType::Delete && !reverse.is_empty() {
        out.push(format!(
            "Update imports in {} dependent file(s) before deleting.",
            reverse.len()
        ));
    }
    if !indirect.is_empty() {
        out.push(format!(
            "{} more file(s) depend on this one indirectly.",
            indirect.len()
        ));
    }
    if out.is_empty() {
        out.push("Standard verification recommended.".to_string());
    }
    out
}
