//! Safe-edit orchestration: propose, validate, back up, write, commit

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use ripple_core::{EditConfig, Language, RiskLevel, from_key, to_key};
use ripple_impact::ImpactProvider;
use serde::Serialize;
use uuid::Uuid;

use crate::backup::{BackupManager, BackupRecord};
use crate::checks::{
    removed_imports, removed_public_classes, removed_public_functions, run_checks, syntax_error,
    unresolved_imports,
};
use crate::context::{EditContext, EditState, SafetyChecks, ValidationReport};
use crate::error::EditError;
use crate::heuristic::{edit_type, estimate_edit_impact, risk_from_score};
use crate::history::EditHistory;
use crate::writer::{ContentWriter, DirectWriter};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EditOutcome {
    /// Validation failed and the edit was not forced. Nothing was touched.
    Blocked(ValidationReport),
    Committed {
        edit_id: String,
        file_path: String,
        backup_path: PathBuf,
        warnings: Vec<String>,
    },
}

impl EditOutcome {
    pub fn edit_id(&self) -> Option<&str> {
        match self {
            EditOutcome::Committed { edit_id, .. } => Some(edit_id),
            EditOutcome::Blocked(_) => None,
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self, EditOutcome::Committed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackOutcome {
    pub edit_id: String,
    pub restored_file: String,
    pub backup_used: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangePatterns {
    pub file_path: String,
    pub edit_count: usize,
    pub average_impact_score: f64,
    pub risk_distribution: BTreeMap<RiskLevel, usize>,
    pub recommendations: Vec<String>,
}

pub struct SafeEditor {
    root: PathBuf,
    config: EditConfig,
    provider: Option<Box<dyn ImpactProvider>>,
    writer: Box<dyn ContentWriter>,
    backups: BackupManager,
    history: EditHistory,
}

impl SafeEditor {
    pub fn new(root: &Path, config: EditConfig) -> Self {
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        Self {
            backups: BackupManager::new(&root),
            history: EditHistory::load(&root, config.history_limit),
            root,
            config,
            provider: None,
            writer: Box::new(DirectWriter),
        }
    }

    /// Use an impact provider instead of the content-diff heuristic.
    pub fn with_provider(mut self, provider: Box<dyn ImpactProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_writer(mut self, writer: Box<dyn ContentWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_for(&self, path: &Path) -> Result<String, EditError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let absolute = absolute.canonicalize().unwrap_or(absolute);
        to_key(&self.root, &absolute).ok_or_else(|| EditError::OutsideRoot(path.to_path_buf()))
    }

    /// Build the context for replacing `path`'s content with `proposed`.
    pub fn prepare(&mut self, path: &Path, proposed: &str) -> Result<EditContext, EditError> {
        let key = self.key_for(path)?;
        let absolute = from_key(&self.root, &key);
        if !absolute.is_file() {
            return Err(EditError::FileNotFound(absolute));
        }
        let original = fs::read_to_string(&absolute).map_err(|source| EditError::Read {
            path: absolute.clone(),
            source,
        })?;

        let edit_type = edit_type(&original, proposed);
        let language = Language::from_path(Path::new(&key));

        let mut provider_risk = None;
        let mut affected_files = Vec::new();
        let impact_score = match self.provider.as_mut() {
            Some(provider) => match provider.analyze_change_impact(&key, edit_type) {
                Ok(result) => {
                    provider_risk = Some(result.risk_level);
                    affected_files = result.affected_files;
                    result.impact_score
                }
                Err(e) => {
                    tracing::debug!("Impact provider failed for {}: {}", key, e);
                    estimate_edit_impact(language, &original, proposed)
                }
            },
            None => estimate_edit_impact(language, &original, proposed),
        };

        let risk_level = provider_risk.map_or(risk_from_score(impact_score), |risk| {
            risk.max(risk_from_score(impact_score))
        });
        let safety_checks = run_checks(&self.root, &key, &original, proposed);
        let recommendations = edit_recommendations(
            language,
            &original,
            proposed,
            impact_score,
            &affected_files,
            &safety_checks,
        );

        tracing::debug!(
            "Prepared {} edit of {}: score {:.2}, risk {}",
            edit_type,
            key,
            impact_score,
            risk_level
        );

        Ok(EditContext {
            edit_id: None,
            file_path: key,
            original_content: original,
            proposed_content: proposed.to_string(),
            edit_type,
            risk_level,
            impact_score,
            affected_files,
            safety_checks,
            recommendations,
            backup_path: None,
            state: EditState::Proposed,
            timestamp: Utc::now(),
        })
    }

    /// Blocking issues stop an unforced edit; warnings never do.
    pub fn validate(&self, ctx: &EditContext) -> ValidationReport {
        let language = Language::from_path(Path::new(&ctx.file_path));
        let original = ctx.original_content.as_str();
        let proposed = ctx.proposed_content.as_str();
        let mut blocking_issues = Vec::new();
        let mut warnings = Vec::new();

        if let Some(error) = syntax_error(language, proposed) {
            blocking_issues.push(format!("Syntax error: {error}"));
        }
        if ctx.risk_level == RiskLevel::Critical && self.config.block_critical {
            blocking_issues.push("Critical risk detected".to_string());
        }

        for import in unresolved_imports(&self.root, &ctx.file_path, language, proposed) {
            warnings.push(format!("Unresolved import: {import}"));
        }
        if ctx.impact_score > self.config.high_impact_warning {
            warnings.push("High-impact change detected".to_string());
        }
        let functions = removed_public_functions(language, original, proposed);
        if !functions.is_empty() {
            warnings.push(format!("Public functions removed: {}", functions.join(", ")));
        }
        let classes = removed_public_classes(language, original, proposed);
        if !classes.is_empty() {
            warnings.push(format!("Public classes removed: {}", classes.join(", ")));
        }
        let imports = removed_imports(language, original, proposed);
        if !imports.is_empty() {
            warnings.push(format!("Imports removed: {}", imports.join(", ")));
        }
        for check in ctx.safety_checks.failed() {
            warnings.push(format!("Safety check failed: {check}"));
        }

        let can_proceed = blocking_issues.is_empty();
        ValidationReport {
            is_safe: can_proceed,
            risk_level: ctx.risk_level,
            blocking_issues,
            warnings,
            recommendations: ctx.recommendations.clone(),
            can_proceed,
        }
    }

    fn new_edit_id(&self) -> String {
        loop {
            let id = format!("edit_{}", &Uuid::new_v4().simple().to_string()[..8]);
            if !self.history.contains(&id) {
                return id;
            }
        }
    }

    /// Validate, back up, write and commit. A failed write restores the
    /// backup before returning the error.
    pub fn execute(&mut self, mut ctx: EditContext, force: bool) -> Result<EditOutcome, EditError> {
        let report = self.validate(&ctx);
        if !report.can_proceed {
            if !force {
                tracing::info!(
                    "Edit of {} blocked: {}",
                    ctx.file_path,
                    report.blocking_issues.join("; ")
                );
                return Ok(EditOutcome::Blocked(report));
            }
            tracing::warn!(
                "Forcing edit of {} despite: {}",
                ctx.file_path,
                report.blocking_issues.join("; ")
            );
        }
        ctx.state = EditState::Validated;

        let target = from_key(&self.root, &ctx.file_path);
        let backup = self
            .backups
            .create_backup(&ctx.file_path, &target)
            .map_err(|source| EditError::BackupFailed {
                path: target.clone(),
                source,
            })?;
        ctx.backup_path = Some(backup.backup_path.clone());
        ctx.state = EditState::BackedUp;

        if let Err(write_error) = self.writer.write(&target, &ctx.proposed_content) {
            tracing::warn!("Write to {} failed: {}", target.display(), write_error);
            return match self.backups.restore(&backup.backup_path, &target) {
                Ok(()) => Err(EditError::WriteFailed {
                    path: target,
                    source: write_error,
                }),
                Err(source) => Err(EditError::RestoreFailed {
                    path: target,
                    backup: backup.backup_path,
                    write_error: write_error.to_string(),
                    source,
                }),
            };
        }
        ctx.state = EditState::Written;

        let edit_id = self.new_edit_id();
        ctx.edit_id = Some(edit_id.clone());
        ctx.state = EditState::Committed;
        let file_path = ctx.file_path.clone();
        self.history.push(ctx);
        if let Err(e) = self.history.save() {
            tracing::warn!("Failed to save edit history: {}", e);
        }
        tracing::info!("Committed {} to {}", edit_id, file_path);

        Ok(EditOutcome::Committed {
            edit_id,
            file_path,
            backup_path: backup.backup_path,
            warnings: report.warnings,
        })
    }

    /// Restore the file touched by `edit_id` from its recorded backup.
    pub fn rollback(&mut self, edit_id: &str) -> Result<RollbackOutcome, EditError> {
        let edit = self
            .history
            .find(edit_id)
            .ok_or_else(|| EditError::UnknownEdit(edit_id.to_string()))?;
        let backup = edit
            .backup_path
            .clone()
            .ok_or_else(|| EditError::MissingBackup(edit_id.to_string()))?;
        let file_path = edit.file_path.clone();
        let target = from_key(&self.root, &file_path);

        self.backups
            .restore(&backup, &target)
            .map_err(|source| EditError::Rollback {
                path: target,
                backup: backup.clone(),
                source,
            })?;

        if let Some(edit) = self.history.find_mut(edit_id) {
            edit.state = EditState::RolledBack;
        }
        if let Err(e) = self.history.save() {
            tracing::warn!("Failed to save edit history: {}", e);
        }
        tracing::info!("Rolled back {} on {}", edit_id, file_path);

        Ok(RollbackOutcome {
            edit_id: edit_id.to_string(),
            restored_file: file_path,
            backup_used: backup,
        })
    }

    /// Committed edits, oldest first.
    pub fn history(&self) -> &[EditContext] {
        self.history.entries()
    }

    pub fn history_for(&self, path: &Path) -> Result<Vec<&EditContext>, EditError> {
        let key = self.key_for(path)?;
        Ok(self.history.for_file(&key).collect())
    }

    pub fn backups(&self, path: &Path) -> Result<Vec<BackupRecord>, EditError> {
        let key = self.key_for(path)?;
        Ok(self.backups.list_backups(&key))
    }

    /// Forget backups whose files were deleted. Returns how many.
    pub fn prune_backups(&self) -> Result<usize, EditError> {
        Ok(self.backups.prune_missing()?)
    }

    pub fn analyze_change_patterns(&self, path: &Path) -> Result<ChangePatterns, EditError> {
        let key = self.key_for(path)?;
        let edits: Vec<&EditContext> = self.history.for_file(&key).collect();

        let mut risk_distribution = BTreeMap::new();
        for edit in &edits {
            *risk_distribution.entry(edit.risk_level).or_insert(0) += 1;
        }
        let average_impact_score = if edits.is_empty() {
            0.0
        } else {
            edits.iter().map(|e| e.impact_score).sum::<f64>() / edits.len() as f64
        };

        let mut recommendations = Vec::new();
        if edits.len() > 5 {
            recommendations.push("This file is edited frequently. Consider refactoring".to_string());
        }
        let high_risk = edits
            .iter()
            .filter(|e| e.risk_level >= RiskLevel::High)
            .count();
        if !edits.is_empty() && high_risk * 2 > edits.len() {
            recommendations
                .push("Most edits to this file were high risk. Edit with extra care".to_string());
        }

        Ok(ChangePatterns {
            file_path: key,
            edit_count: edits.len(),
            average_impact_score,
            risk_distribution,
            recommendations,
        })
    }

    /// Prepare and execute each edit on its own. Earlier edits stay applied
    /// when a later one fails.
    pub fn execute_batch(
        &mut self,
        edits: &[(PathBuf, String)],
        force: bool,
    ) -> Vec<(PathBuf, Result<EditOutcome, EditError>)> {
        edits
            .iter()
            .map(|(path, proposed)| {
                let outcome = self
                    .prepare(path, proposed)
                    .and_then(|ctx| self.execute(ctx, force));
                (path.clone(), outcome)
            })
            .collect()
    }
}

fn edit_recommendations(
    language: Option<Language>,
    original: &str,
    proposed: &str,
    impact_score: f64,
    affected_files: &[String],
    checks: &SafetyChecks,
) -> Vec<String> {
    let mut out = Vec::new();
    if !checks.all_passed() {
        out.push("Fix the failed safety checks before applying".to_string());
    }
    if impact_score > 0.5 {
        out.push("High-impact change detected. Run thorough tests".to_string());
    }
    if impact_score > 0.7 {
        out.push("Critical change detected. Consider a staged rollout".to_string());
    }
    if !affected_files.is_empty() {
        out.push(format!("Review {} affected file(s)", affected_files.len()));
    }
    let functions_touched = !removed_public_functions(language, original, proposed).is_empty()
        || !removed_public_functions(language, proposed, original).is_empty();
    if functions_touched {
        out.push("Function changes detected. Consider updating documentation".to_string());
    }
    let classes_touched = !removed_public_classes(language, original, proposed).is_empty()
        || !removed_public_classes(language, proposed, original).is_empty();
    if classes_touched {
        out.push("Class changes detected. Check subclasses".to_string());
    }
    if out.is_empty() {
        out.push("A backup will be created before changes".to_string());
    }
    out
}
