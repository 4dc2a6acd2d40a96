//! Pipeline Integration Tests
//!
//! Runs the aggregator with scripted model replies and checks how model
//! output, fallback values, and failures meet in the consolidated report.

use std::sync::Arc;

use assay_analysis::{
    ActionPriority, AnalysisLayer, AnalysisStage, FailureKind, FieldGroup, FileResultSink,
    MemoryResultSink, PerTargetResult, PipelineConfig, Provenance, ReportAggregator, Severity,
};
use assay_core::CoreError;
use assay_llm::InferenceError;

use crate::support::{component_batch, input, persian_batch, ScriptedClient};

// ============================================================================
// Helper Functions
// ============================================================================

const FULL_REPLY: &str = r#"Here is the assessment:
```json
{
  "criticalIssues": [
    {
      "category": "security",
      "severity": "critical",
      "description": "Hardcoded admin password",
      "location": "src/auth/config.ts",
      "recommendation": "Load credentials from the secret store"
    }
  ],
  "optimizations": [
    {"area": "auth", "suggestion": "Rotate keys", "expectedBenefit": "Smaller blast radius", "effort": "low"}
  ],
  "legacySystemRemnants": [
    {"location": "src/billing/invoices.ts", "description": "MOCK_INVOICES fixture", "action": "wire real API", "status": "unresolved"}
  ],
  "complianceScore": 42,
  "performanceMetrics": {
    "qualityScore": 60,
    "resolutionRate": 50,
    "averageResponseMinutes": 7.25,
    "satisfactionIndex": 55,
    "followUpRate": 10,
    "engagementScore": 70
  }
}
```"#;

const PARTIAL_REPLY: &str = r#"{"criticalIssues": [], "complianceScore": 88}"#;

fn by_name<'a>(results: &'a [PerTargetResult], name: &str) -> &'a PerTargetResult {
    results
        .iter()
        .find(|r| r.target.name == name)
        .unwrap_or_else(|| panic!("no result for {}", name))
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_mixed_outcomes_are_isolated_per_target() {
    let client = Arc::new(ScriptedClient::new(vec![
        ("context for auth-module", Ok(FULL_REPLY.to_string())),
        ("context for support-calls", Ok("I could not decide, sorry.".to_string())),
        (
            "context for payments",
            Err(InferenceError::ServiceError {
                status: Some(503),
                message: "overloaded".to_string(),
            }),
        ),
    ]));
    let sink = Arc::new(MemoryResultSink::new());
    let aggregator = ReportAggregator::new(client.clone(), sink.clone(), PipelineConfig::default());

    let (targets, records) = input(vec![
        ("auth-module", AnalysisLayer::Security, component_batch()),
        ("support-calls", AnalysisLayer::UserExperience, persian_batch()),
        ("payments", AnalysisLayer::Functionality, component_batch()),
    ]);
    let report = aggregator.analyze(&targets, &records).await.unwrap();

    assert_eq!(report.targets_analyzed, 3);
    let names: Vec<&str> = report.target_results.iter().map(|r| r.target.name.as_str()).collect();
    assert_eq!(names, vec!["auth-module", "support-calls", "payments"]);
    assert_eq!(client.prompts().len(), 3);
    assert_eq!(sink.results().len(), 3);

    let auth = by_name(&report.target_results, "auth-module");
    assert!(auth.provenance.is_fully_model());
    assert!(auth.failure.is_none());
    assert_eq!(auth.compliance_score.value(), 42);
    assert_eq!(auth.metrics.average_response_minutes, 7.3);
    assert_eq!(auth.stages.last(), Some(&AnalysisStage::Finalized));

    let support = by_name(&report.target_results, "support-calls");
    assert!(support.provenance.is_fully_fallback());
    assert_eq!(support.failure.as_ref().map(|f| f.kind), Some(FailureKind::ParseFailure));
    assert!(support.stages.contains(&AnalysisStage::Failed));
    assert_eq!(support.metrics.resolution_rate, 33);

    let payments = by_name(&report.target_results, "payments");
    assert_eq!(payments.failure.as_ref().map(|f| f.kind), Some(FailureKind::ServiceError));
    assert!(payments
        .findings
        .iter()
        .any(|f| f.severity == Severity::Critical && f.category == AnalysisLayer::Security));

    assert_eq!(report.degraded_targets, vec!["support-calls", "payments"]);
    assert_eq!(report.compliance_scores.security.value(), 42);
    assert!(report.compliance_scores.overall.value() <= 42);
    assert_eq!(
        report.prioritized_action_plan.first().map(|a| a.priority),
        Some(ActionPriority::Immediate)
    );
}

#[tokio::test]
async fn test_partial_reply_is_backfilled_without_degrading() {
    let client = Arc::new(ScriptedClient::new(vec![(
        "context for support-calls",
        Ok(PARTIAL_REPLY.to_string()),
    )]));
    let sink = Arc::new(MemoryResultSink::new());
    let aggregator = ReportAggregator::new(client, sink, PipelineConfig::default());

    let (targets, records) = input(vec![("support-calls", AnalysisLayer::UserExperience, persian_batch())]);
    let report = aggregator.analyze(&targets, &records).await.unwrap();
    let result = &report.target_results[0];

    assert!(result.failure.is_none());
    assert!(report.degraded_targets.is_empty());
    assert_eq!(result.provenance.findings, Provenance::Model);
    assert_eq!(result.provenance.compliance_score, Provenance::Model);
    assert_eq!(result.provenance.metrics, Provenance::Fallback);
    assert_eq!(result.provenance.optimizations, Provenance::Fallback);
    assert!(result.omissions.contains(&FieldGroup::Metrics));
    assert!(result.findings.is_empty());
    assert_eq!(result.compliance_score.value(), 88);
    assert_eq!(result.metrics.resolution_rate, 33);
    assert_eq!(report.compliance_scores.user_experience.value(), 88);
}

#[tokio::test]
async fn test_results_are_written_to_file_sink() {
    let temp = tempfile::tempdir().unwrap();
    let client = Arc::new(ScriptedClient::new(vec![]));
    let sink = Arc::new(FileResultSink::new(temp.path().join("results")));
    let aggregator = ReportAggregator::new(client, sink.clone(), PipelineConfig::default());

    let (targets, records) = input(vec![
        ("crm calls", AnalysisLayer::UserExperience, persian_batch()),
        ("auth/module", AnalysisLayer::Security, component_batch()),
    ]);
    aggregator.analyze(&targets, &records).await.unwrap();

    for name in ["crm calls", "auth/module"] {
        let content = std::fs::read_to_string(sink.path_for(name)).unwrap();
        let stored: PerTargetResult = serde_json::from_str(&content).unwrap();
        assert_eq!(stored.target.name, name);
    }
}

#[tokio::test]
async fn test_invalid_input_fails_before_any_request() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let aggregator = ReportAggregator::new(
        client.clone(),
        Arc::new(MemoryResultSink::new()),
        PipelineConfig::default(),
    );

    let (targets, records) = input(vec![]);
    let err = aggregator.analyze(&targets, &records).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let (targets, records) = input(vec![("empty", AnalysisLayer::Performance, vec![])]);
    let err = aggregator.analyze(&targets, &records).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    // Distinct names that would share one result file
    let (targets, records) = input(vec![
        ("crm calls", AnalysisLayer::UserExperience, persian_batch()),
        ("crm/calls", AnalysisLayer::UserExperience, persian_batch()),
    ]);
    let err = aggregator.analyze(&targets, &records).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(client.prompts().is_empty());
}
