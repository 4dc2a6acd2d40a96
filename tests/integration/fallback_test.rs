//! Fallback Integration Tests
//!
//! Heuristic-only runs: no credentials, so every target is computed from its
//! records alone. Covers mixed-script input, determinism, and output bounds
//! on large batches.

use std::sync::Arc;

use assay_analysis::{
    AnalysisLayer, ConsolidatedReport, FailureKind, MemoryResultSink, PipelineConfig, RawRecord,
    ReportAggregator, Severity,
};
use assay_llm::{build_inference_client, InferenceClient, ProviderConfig};

use crate::support::{component_batch, input, persian_batch};

// ============================================================================
// Helper Functions
// ============================================================================

async fn run_heuristic(
    targets: Vec<(&str, AnalysisLayer, Vec<RawRecord>)>,
) -> ConsolidatedReport {
    let client = build_inference_client(&ProviderConfig::default()).unwrap();
    assert_eq!(client.name(), "disabled");
    let aggregator = ReportAggregator::new(
        client,
        Arc::new(MemoryResultSink::new()),
        PipelineConfig::default(),
    );
    let (targets, records) = input(targets);
    aggregator.analyze(&targets, &records).await.unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_persian_batch_without_credentials() {
    let report = run_heuristic(vec![(
        "support-calls",
        AnalysisLayer::UserExperience,
        persian_batch(),
    )])
    .await;

    let result = &report.target_results[0];
    assert!(result.provenance.is_fully_fallback());
    assert_eq!(result.failure.as_ref().map(|f| f.kind), Some(FailureKind::AuthFailure));
    assert_eq!(result.metrics.resolution_rate, 33);
    assert_eq!(result.metrics.average_response_minutes, 10.0);
    assert!(result.metrics.quality_score <= 100);
    assert!(!result.optimizations.is_empty());
    assert!(result.legacy_remnants.is_empty());
    assert_eq!(report.degraded_targets, vec!["support-calls"]);
    assert!(report.timestamp.ends_with('Z'));
}

#[tokio::test]
async fn test_component_batch_flags_secrets_and_remnants() {
    let report = run_heuristic(vec![("web-app", AnalysisLayer::Security, component_batch())]).await;
    let result = &report.target_results[0];

    let security = result
        .findings
        .iter()
        .find(|f| f.category == AnalysisLayer::Security)
        .unwrap();
    assert_eq!(security.severity, Severity::Critical);
    assert!(result
        .legacy_remnants
        .iter()
        .any(|r| r.location.contains("src/billing/invoices.ts")));
    assert!(result.optimizations.is_empty());

    assert_eq!(report.critical_findings.len(), 1);
    assert_eq!(report.critical_findings[0].component, "web-app");
    assert!(!report.legacy_system_cleanup.is_empty());
    assert!(report.compliance_scores.security.value() < 100);
}

#[tokio::test]
async fn test_heuristic_runs_are_deterministic() {
    let targets = || {
        vec![
            ("support-calls", AnalysisLayer::UserExperience, persian_batch()),
            ("web-app", AnalysisLayer::Security, component_batch()),
        ]
    };
    let mut first = run_heuristic(targets()).await;
    let mut second = run_heuristic(targets()).await;
    first.timestamp.clear();
    second.timestamp.clear();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_large_batch_output_stays_bounded() {
    let records: Vec<RawRecord> = (0..1000)
        .map(|i| RawRecord::interaction(format!("customer {} leaked a password, call failed", i), 90.0))
        .collect();
    let report = run_heuristic(vec![("bulk", AnalysisLayer::Security, records)]).await;
    let result = &report.target_results[0];

    assert!(result.findings.len() <= 4);
    let security = result
        .findings
        .iter()
        .find(|f| f.category == AnalysisLayer::Security)
        .unwrap();
    assert!(security.description.starts_with("1000 record(s)"));
    assert_eq!(result.metrics.average_response_minutes, 90.0);
    assert!(report.critical_findings.len() <= 2);
}
