//! Report Aggregator
//!
//! Fans targets out to the per-target analyzer under a concurrency bound,
//! isolates task failures, persists each finalized result, and folds all
//! results into one consolidated report.
//!
//! Ordering: results are collected by awaiting join handles in input order,
//! so the report never depends on completion order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use assay_core::{CoreError, CoreResult};
use assay_llm::InferenceClient;
use chrono::{SecondsFormat, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::analyzer::TargetAnalyzer;
use crate::config::PipelineConfig;
use crate::error::TargetFailure;
use crate::heuristics;
use crate::models::{
    ActionItem, ActionPriority, AnalysisLayer, AnalysisStage, AnalysisTarget, CleanupItem,
    ComplianceScore, ComplianceScores, ConsolidatedReport, CriticalFindingEntry, FailureKind,
    FieldProvenance, InteractionMetrics, PerTargetResult, Provenance, RawRecord, Severity,
    StageFailure, StructuredFinding,
};
use crate::sink::{sanitize_file_stem, ResultSink};

/// Overall score below which a remediation item is planned
const OVERALL_SCORE_TARGET: u8 = 70;

/// Runs a batch of targets and produces the consolidated report.
pub struct ReportAggregator {
    analyzer: TargetAnalyzer,
    sink: Arc<dyn ResultSink>,
    config: PipelineConfig,
}

impl ReportAggregator {
    pub fn new(
        client: Arc<dyn InferenceClient>,
        sink: Arc<dyn ResultSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            analyzer: TargetAnalyzer::new(client, &config),
            sink,
            config,
        }
    }

    /// Analyze every target and consolidate the results.
    ///
    /// Fails only on invalid input or configuration; per-target failures are
    /// recovered and show up in the report instead.
    pub async fn analyze(
        &self,
        targets: &[AnalysisTarget],
        records: &HashMap<String, Vec<RawRecord>>,
    ) -> CoreResult<ConsolidatedReport> {
        validate_input(targets, records)?;
        self.config.validate().map_err(CoreError::config)?;

        let started = Instant::now();
        info!(
            targets = targets.len(),
            max_concurrency = self.config.max_concurrency,
            run_timeout_secs = self.config.run_timeout_secs,
            "analysis run started"
        );

        let cancel = CancellationToken::new();
        let timer = {
            let cancel = cancel.clone();
            let timeout = Duration::from_secs(self.config.run_timeout_secs);
            tokio::spawn(async move {
                tokio::time::sleep(timeout).await;
                warn!(timeout_secs = timeout.as_secs(), "run timeout reached, cancelling in-flight requests");
                cancel.cancel();
            })
        };

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let handles: Vec<_> = targets
            .iter()
            .map(|target| {
                let analyzer = self.analyzer.clone();
                let target = target.clone();
                let batch = records.get(&target.name).cloned().unwrap_or_default();
                let semaphore = Arc::clone(&semaphore);
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    analyzer.analyze(&target, &batch, &cancel).await
                })
            })
            .collect();

        let mut results = Vec::with_capacity(targets.len());
        for (target, handle) in targets.iter().zip(handles) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let failure = TargetFailure::new(&target.name, describe_join_error(e));
                    error!(target_name = %target.name, error = %failure, "target task failed");
                    failed_target_result(target, &failure)
                }
            };
            self.persist(&result).await;
            results.push(result);
        }
        timer.abort();

        let report = consolidate(results, Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        info!(
            targets = report.targets_analyzed,
            degraded = report.degraded_targets.len(),
            overall = report.compliance_scores.overall.value(),
            actions = report.prioritized_action_plan.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis run finished"
        );
        Ok(report)
    }

    /// Write one result through the sink on the blocking pool; failures are
    /// logged only.
    async fn persist(&self, result: &PerTargetResult) {
        let sink = Arc::clone(&self.sink);
        let stored = result.clone();
        match tokio::task::spawn_blocking(move || sink.persist(&stored)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(target_name = %result.target.name, error = %e, "failed to persist target result");
            }
            Err(e) => {
                warn!(target_name = %result.target.name, error = %e, "result sink task failed");
            }
        }
    }
}

/// Reject input the pipeline cannot run on.
pub fn validate_input(
    targets: &[AnalysisTarget],
    records: &HashMap<String, Vec<RawRecord>>,
) -> CoreResult<()> {
    if targets.is_empty() {
        return Err(CoreError::validation("no analysis targets supplied"));
    }
    let mut seen = HashSet::new();
    let mut stems: HashMap<String, &str> = HashMap::new();
    for (index, target) in targets.iter().enumerate() {
        if target.name.trim().is_empty() {
            return Err(CoreError::validation(format!(
                "target #{} has an empty name",
                index + 1
            )));
        }
        if !seen.insert(target.name.as_str()) {
            return Err(CoreError::validation(format!(
                "duplicate target name '{}'",
                target.name
            )));
        }
        if let Some(other) = stems.insert(sanitize_file_stem(&target.name), &target.name) {
            return Err(CoreError::validation(format!(
                "target names '{}' and '{}' map to the same result file",
                other, target.name
            )));
        }
        if records.get(&target.name).map_or(true, Vec::is_empty) {
            return Err(CoreError::validation(format!(
                "target '{}' has no records",
                target.name
            )));
        }
    }
    Ok(())
}

fn describe_join_error(e: JoinError) -> String {
    if e.is_cancelled() {
        return "task was cancelled".to_string();
    }
    let payload = e.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    format!("task panicked: {}", detail)
}

/// Placeholder result for a target whose task did not complete.
pub fn failed_target_result(target: &AnalysisTarget, failure: &TargetFailure) -> PerTargetResult {
    let findings = vec![StructuredFinding {
        category: AnalysisLayer::Functionality,
        severity: Severity::High,
        description: "analysis did not complete".to_string(),
        location: target.name.clone(),
        recommendation: "Re-run the analysis for this target".to_string(),
        example: Some(failure.message.clone()),
    }];
    let compliance_score = heuristics::compliance_score(&findings, &[]);
    PerTargetResult {
        target: target.clone(),
        findings,
        optimizations: Vec::new(),
        legacy_remnants: Vec::new(),
        compliance_score,
        metrics: InteractionMetrics::default(),
        provenance: FieldProvenance::all(Provenance::Fallback),
        omissions: Vec::new(),
        failure: Some(StageFailure::new(
            FailureKind::TargetFailure,
            failure.to_string(),
        )),
        stages: vec![AnalysisStage::Failed, AnalysisStage::Finalized],
    }
}

// ============================================================================
// Consolidation
// ============================================================================

/// Fold finalized results, in input order, into the report.
pub fn consolidate(results: Vec<PerTargetResult>, timestamp: String) -> ConsolidatedReport {
    let critical_findings = results.iter().flat_map(critical_entries).collect();

    let legacy_system_cleanup = results
        .iter()
        .flat_map(|r| {
            r.legacy_remnants.iter().map(move |remnant| CleanupItem {
                location: format!("{}: {}", r.target.name, remnant.location),
                action: remnant.action.clone(),
                status: remnant.status,
            })
        })
        .collect();

    let compliance_scores = compliance_scores(&results);
    let prioritized_action_plan = action_plan(&results, &compliance_scores);
    let degraded_targets = results
        .iter()
        .filter(|r| r.is_degraded())
        .map(|r| r.target.name.clone())
        .collect();

    ConsolidatedReport {
        timestamp,
        targets_analyzed: results.len(),
        critical_findings,
        legacy_system_cleanup,
        compliance_scores,
        prioritized_action_plan,
        degraded_targets,
        target_results: results,
    }
}

/// One entry per (critical or high severity, category) present in a result
fn critical_entries(result: &PerTargetResult) -> Vec<CriticalFindingEntry> {
    let mut entries = Vec::new();
    for severity in [Severity::Critical, Severity::High] {
        for category in AnalysisLayer::ALL {
            let issue_count = result.count_findings(severity, category);
            if issue_count > 0 {
                entries.push(CriticalFindingEntry {
                    component: result.target.name.clone(),
                    issue_count,
                    severity,
                    category,
                });
            }
        }
    }
    entries
}

fn layer_weight(layer: AnalysisLayer) -> f64 {
    match layer {
        AnalysisLayer::Security => 0.35,
        AnalysisLayer::Functionality => 0.30,
        AnalysisLayer::Performance => 0.20,
        AnalysisLayer::UserExperience => 0.15,
    }
}

/// Per-layer minimum and capped weighted overall.
///
/// Placeholders of failed targets do not count. A layer with no counted
/// target scores 100 and does not enter the overall.
pub fn compliance_scores(results: &[PerTargetResult]) -> ComplianceScores {
    let mut observed: Vec<(AnalysisLayer, ComplianceScore)> = Vec::new();
    for layer in AnalysisLayer::ALL {
        let minimum = results
            .iter()
            .filter(|r| r.target.category == layer && !r.is_target_failure())
            .map(|r| r.compliance_score)
            .min();
        if let Some(score) = minimum {
            observed.push((layer, score));
        }
    }

    let layer_score = |layer: AnalysisLayer| {
        observed
            .iter()
            .find(|(l, _)| *l == layer)
            .map(|(_, s)| *s)
            .unwrap_or(ComplianceScore::MAX)
    };

    let overall = match observed.iter().map(|(_, s)| *s).min() {
        None => ComplianceScore::MAX,
        Some(floor) => {
            let weight_sum: f64 = observed.iter().map(|(l, _)| layer_weight(*l)).sum();
            let weighted: f64 = observed
                .iter()
                .map(|(l, s)| layer_weight(*l) * f64::from(s.value()))
                .sum();
            ComplianceScore::from_f64(weighted / weight_sum).min(floor)
        }
    };

    ComplianceScores {
        security: layer_score(AnalysisLayer::Security),
        functionality: layer_score(AnalysisLayer::Functionality),
        performance: layer_score(AnalysisLayer::Performance),
        user_experience: layer_score(AnalysisLayer::UserExperience),
        overall,
    }
}

/// Effort estimate for a number of issues
pub fn effort_for(count: usize) -> &'static str {
    match count {
        0..=2 => "2-4 hours",
        3..=5 => "1-2 days",
        _ => "1-2 weeks",
    }
}

/// Total count and affected target names for findings matching `predicate`
fn tally(
    results: &[PerTargetResult],
    predicate: impl Fn(&StructuredFinding) -> bool,
) -> (usize, Vec<&str>) {
    let mut total = 0;
    let mut components = Vec::new();
    for result in results.iter().filter(|r| !r.is_target_failure()) {
        let count = result.findings.iter().filter(|f| predicate(f)).count();
        if count > 0 {
            total += count;
            components.push(result.target.name.as_str());
        }
    }
    (total, components)
}

/// Ordered remediation plan derived from findings, remnants, and scores.
pub fn action_plan(results: &[PerTargetResult], scores: &ComplianceScores) -> Vec<ActionItem> {
    let mut plan = Vec::new();

    let (count, components) = tally(results, |f| {
        f.severity == Severity::Critical && f.category == AnalysisLayer::Security
    });
    if count > 0 {
        plan.push(ActionItem {
            priority: ActionPriority::Immediate,
            task: format!(
                "Fix {} critical security finding(s) in {}",
                count,
                components.join(", ")
            ),
            estimated_effort: effort_for(count).to_string(),
            business_impact: "Prevents data exposure and compliance violations".to_string(),
        });
    }

    let unresolved: Vec<(&str, usize)> = results
        .iter()
        .map(|r| (r.target.name.as_str(), r.unresolved_remnants()))
        .filter(|(_, n)| *n > 0)
        .collect();
    let unresolved_total: usize = unresolved.iter().map(|(_, n)| n).sum();
    if unresolved_total > 0 {
        let names: Vec<&str> = unresolved.iter().map(|(name, _)| *name).collect();
        plan.push(ActionItem {
            priority: ActionPriority::Immediate,
            task: format!(
                "Remove or migrate {} legacy remnant(s) in {}",
                unresolved_total,
                names.join(", ")
            ),
            estimated_effort: effort_for(unresolved_total).to_string(),
            business_impact: "Removes mock data and dead code paths from production".to_string(),
        });
    }

    let (count, components) = tally(results, |f| {
        f.category == AnalysisLayer::Functionality && f.severity.is_critical_or_high()
    });
    if count > 0 {
        plan.push(ActionItem {
            priority: ActionPriority::High,
            task: format!(
                "Resolve {} functionality issue(s) in {}",
                count,
                components.join(", ")
            ),
            estimated_effort: effort_for(count).to_string(),
            business_impact: "Restores broken or unreliable flows".to_string(),
        });
    }

    let failed: Vec<&str> = results
        .iter()
        .filter(|r| r.is_target_failure())
        .map(|r| r.target.name.as_str())
        .collect();
    if !failed.is_empty() {
        plan.push(ActionItem {
            priority: ActionPriority::High,
            task: format!("Re-run analysis for {}", failed.join(", ")),
            estimated_effort: effort_for(failed.len()).to_string(),
            business_impact: "Closes gaps in analysis coverage".to_string(),
        });
    }

    let (count, components) = tally(results, |f| f.category == AnalysisLayer::Performance);
    if count > 0 {
        plan.push(ActionItem {
            priority: ActionPriority::Medium,
            task: format!(
                "Address {} performance finding(s) in {}",
                count,
                components.join(", ")
            ),
            estimated_effort: effort_for(count).to_string(),
            business_impact: "Faster handling and better responsiveness".to_string(),
        });
    }

    if scores.overall.value() < OVERALL_SCORE_TARGET {
        let below = AnalysisLayer::ALL
            .iter()
            .filter(|l| scores.layer(**l).value() < OVERALL_SCORE_TARGET)
            .count();
        plan.push(ActionItem {
            priority: ActionPriority::Medium,
            task: format!(
                "Raise overall compliance from {} to at least {}",
                scores.overall, OVERALL_SCORE_TARGET
            ),
            estimated_effort: effort_for(below.max(1) * 2).to_string(),
            business_impact: "Brings the system back within the compliance target".to_string(),
        });
    }

    plan
}
