//! Per-Target Analyzer
//!
//! Drives one target through `Built -> Requested -> {Parsed | Failed} ->
//! Finalized`. Inference and parse errors are absorbed here: a failed target
//! is finalized from the fallback engine, a parsed reply has its omitted
//! groups backfilled. The result always carries the full schema.

use std::sync::Arc;
use std::time::Instant;

use assay_llm::{AnalysisRequest, InferenceClient, InferenceError, InferenceResult};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, SummaryConfig};
use crate::heuristics::{self, HeuristicAssessment};
use crate::models::{
    AnalysisStage, AnalysisTarget, FailureKind, FieldGroup, FieldProvenance, PerTargetResult,
    Provenance, RawRecord, StageFailure,
};
use crate::parser::{parse_model_response, ModelAssessment};
use crate::prompt::PromptBuilder;
use crate::summarizer::summarize_records;

/// State of one target's analysis
#[derive(Debug)]
enum AnalysisState {
    /// Request assembled, not yet sent
    Built(AnalysisRequest),
    /// Inference call returned or was cancelled
    Requested(InferenceResult<String>),
    /// Reply parsed into (possibly partial) field groups
    Parsed(ModelAssessment),
    /// Inference or parsing failed
    Failed(StageFailure),
    /// Terminal
    Finalized(PerTargetResult),
}

impl AnalysisState {
    fn stage(&self) -> AnalysisStage {
        match self {
            AnalysisState::Built(_) => AnalysisStage::Built,
            AnalysisState::Requested(_) => AnalysisStage::Requested,
            AnalysisState::Parsed(_) => AnalysisStage::Parsed,
            AnalysisState::Failed(_) => AnalysisStage::Failed,
            AnalysisState::Finalized(_) => AnalysisStage::Finalized,
        }
    }
}

/// Analyzes single targets against an injected inference client.
#[derive(Clone)]
pub struct TargetAnalyzer {
    client: Arc<dyn InferenceClient>,
    prompt: PromptBuilder,
    summary: SummaryConfig,
}

impl TargetAnalyzer {
    pub fn new(client: Arc<dyn InferenceClient>, config: &PipelineConfig) -> Self {
        Self {
            client,
            prompt: PromptBuilder::new(config.request.clone()),
            summary: config.summary.clone(),
        }
    }

    /// Analyze one target. Never fails; cancellation while the request is in
    /// flight counts as a transport failure.
    pub async fn analyze(
        &self,
        target: &AnalysisTarget,
        records: &[RawRecord],
        cancel: &CancellationToken,
    ) -> PerTargetResult {
        let started = Instant::now();
        let digest = summarize_records(records, &self.summary);
        let request = self.prompt.build_for_target(&digest, target);

        let mut state = AnalysisState::Built(request);
        let mut stages = vec![AnalysisStage::Built];

        loop {
            state = match state {
                AnalysisState::Built(request) => {
                    debug!(
                        target_name = %target.name,
                        client = self.client.name(),
                        prompt_chars = request.prompt_text.chars().count(),
                        "sending analysis request"
                    );
                    let reply = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(InferenceError::transport("analysis run cancelled")),
                        reply = self.client.complete(&request) => reply,
                    };
                    AnalysisState::Requested(reply)
                }
                AnalysisState::Requested(Ok(text)) => match parse_model_response(&text) {
                    Ok(assessment) => AnalysisState::Parsed(assessment),
                    Err(e) => AnalysisState::Failed(StageFailure::new(
                        FailureKind::ParseFailure,
                        e.message,
                    )),
                },
                AnalysisState::Requested(Err(e)) => AnalysisState::Failed(StageFailure::new(
                    FailureKind::from(e.kind()),
                    e.to_string(),
                )),
                AnalysisState::Parsed(assessment) => {
                    let mut trail = stages.clone();
                    trail.push(AnalysisStage::Finalized);
                    AnalysisState::Finalized(finalize(target, records, Some(assessment), None, trail))
                }
                AnalysisState::Failed(failure) => {
                    warn!(
                        target_name = %target.name,
                        kind = ?failure.kind,
                        error = %failure.message,
                        "analysis falling back to heuristics"
                    );
                    let mut trail = stages.clone();
                    trail.push(AnalysisStage::Finalized);
                    AnalysisState::Finalized(finalize(target, records, None, Some(failure), trail))
                }
                AnalysisState::Finalized(result) => {
                    info!(
                        target_name = %target.name,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        findings = result.findings.len(),
                        score = result.compliance_score.value(),
                        omissions = result.omissions.len(),
                        degraded = result.is_degraded(),
                        "target analysis finalized"
                    );
                    return result;
                }
            };
            if !matches!(state, AnalysisState::Finalized(_)) {
                stages.push(state.stage());
            }
        }
    }
}

/// Assemble the final result from a parsed reply, a failure, or both absent.
///
/// Every group the reply did not supply comes from the fallback engine. A
/// backfilled compliance score is computed from the final findings and
/// remnants, whichever source they came from.
pub fn finalize(
    target: &AnalysisTarget,
    records: &[RawRecord],
    assessment: Option<ModelAssessment>,
    failure: Option<StageFailure>,
    stages: Vec<AnalysisStage>,
) -> PerTargetResult {
    let assessment = assessment.unwrap_or_default();
    let omissions = if failure.is_some() {
        Vec::new()
    } else {
        assessment.omissions()
    };

    let fallback: Option<HeuristicAssessment> = if assessment.omissions().is_empty() {
        None
    } else {
        Some(heuristics::assess(target, records))
    };
    let mut provenance = FieldProvenance::all(Provenance::Model);

    let ModelAssessment {
        findings,
        optimizations,
        legacy_remnants,
        compliance_score,
        metrics,
    } = assessment;

    let mut take = |group: FieldGroup, present: bool| {
        if !present {
            provenance.set(group, Provenance::Fallback);
        }
    };
    take(FieldGroup::Findings, findings.is_some());
    take(FieldGroup::Optimizations, optimizations.is_some());
    take(FieldGroup::LegacyRemnants, legacy_remnants.is_some());
    take(FieldGroup::ComplianceScore, compliance_score.is_some());
    take(FieldGroup::Metrics, metrics.is_some());

    // Fallback findings are aggregated per rule; score them by record hits
    let fallback_hits = match (&fallback, findings.is_some()) {
        (Some(fb), false) => Some(fb.critical_or_high_hits),
        _ => None,
    };

    let (findings, optimizations, legacy_remnants, metrics) = match fallback {
        Some(fb) => (
            findings.unwrap_or(fb.findings),
            optimizations.unwrap_or(fb.optimizations),
            legacy_remnants.unwrap_or(fb.legacy_remnants),
            metrics.unwrap_or(fb.metrics),
        ),
        None => (
            findings.unwrap_or_default(),
            optimizations.unwrap_or_default(),
            legacy_remnants.unwrap_or_default(),
            metrics.unwrap_or_default(),
        ),
    };
    let compliance_score = compliance_score.unwrap_or_else(|| match fallback_hits {
        Some(hits) => heuristics::score_from_counts(hits, heuristics::unresolved_count(&legacy_remnants)),
        None => heuristics::compliance_score(&findings, &legacy_remnants),
    });

    if !omissions.is_empty() {
        debug!(
            target_name = %target.name,
            omitted = ?omissions,
            "backfilled omitted groups from heuristics"
        );
    }

    PerTargetResult {
        target: target.clone(),
        findings,
        optimizations,
        legacy_remnants,
        compliance_score,
        metrics,
        provenance,
        omissions,
        failure,
        stages,
    }
}
