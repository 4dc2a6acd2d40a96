//! Analysis Models
//!
//! Data structures for analysis targets, raw records, per-target results, and
//! the consolidated report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assay_llm::InferenceErrorKind;

// ============================================================================
// Targets and Records
// ============================================================================

/// Analysis layer of a target, and category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisLayer {
    Security,
    Functionality,
    Performance,
    UserExperience,
}

impl AnalysisLayer {
    /// All layers in report order
    pub const ALL: [AnalysisLayer; 4] = [
        AnalysisLayer::Security,
        AnalysisLayer::Functionality,
        AnalysisLayer::Performance,
        AnalysisLayer::UserExperience,
    ];

    /// Wire name as used in prompts and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisLayer::Security => "security",
            AnalysisLayer::Functionality => "functionality",
            AnalysisLayer::Performance => "performance",
            AnalysisLayer::UserExperience => "userExperience",
        }
    }

    /// Lenient parse of a model-supplied category name.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "security" | "secure" | "vulnerability" => Some(AnalysisLayer::Security),
            "functionality" | "functional" | "function" | "bug" | "correctness" => {
                Some(AnalysisLayer::Functionality)
            }
            "performance" | "perf" | "latency" => Some(AnalysisLayer::Performance),
            "userexperience" | "ux" | "usability" | "experience" => {
                Some(AnalysisLayer::UserExperience)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of thing a target is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TargetKind {
    /// A named source component
    #[default]
    Component,
    /// A time-bounded batch of interaction records
    InteractionBatch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<DateTime<Utc>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<DateTime<Utc>>,
    },
}

/// One unit of work submitted for assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTarget {
    /// Unique, non-empty name
    pub name: String,
    /// Free-text context handed to the model
    #[serde(default)]
    pub context_description: String,
    /// Analysis layer
    pub category: AnalysisLayer,
    /// Component or interaction batch
    #[serde(default)]
    pub kind: TargetKind,
}

impl AnalysisTarget {
    /// Create a component target
    pub fn new(
        name: impl Into<String>,
        context_description: impl Into<String>,
        category: AnalysisLayer,
    ) -> Self {
        Self {
            name: name.into(),
            context_description: context_description.into(),
            category,
            kind: TargetKind::Component,
        }
    }

    /// Set the target kind
    pub fn with_kind(mut self, kind: TargetKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Direction of an interaction record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    Internal,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Inbound => write!(f, "inbound"),
            Direction::Outbound => write!(f, "outbound"),
            Direction::Internal => write!(f, "internal"),
        }
    }
}

/// One domain record. Every field may be absent.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Explicit follow-up marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<bool>,
    /// Source location for component descriptors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Descriptor body for component descriptors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl RawRecord {
    /// Interaction record with a summary and duration
    pub fn interaction(summary_text: impl Into<String>, duration_minutes: f64) -> Self {
        Self {
            summary_text: Some(summary_text.into()),
            duration_minutes: Some(duration_minutes),
            ..Default::default()
        }
    }

    /// Component descriptor at a location
    pub fn component(location: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_follow_up(mut self, follow_up: bool) -> Self {
        self.follow_up = Some(follow_up);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Summary text, empty when absent
    pub fn summary(&self) -> &str {
        self.summary_text.as_deref().unwrap_or("")
    }

    /// Duration when present, finite, and positive
    pub fn positive_duration(&self) -> Option<f64> {
        self.duration_minutes.filter(|d| d.is_finite() && *d > 0.0)
    }
}

// ============================================================================
// Structured Outputs
// ============================================================================

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn is_critical_or_high(&self) -> bool {
        matches!(self, Severity::Critical | Severity::High)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "critical" | "blocker" => Some(Severity::Critical),
            "high" | "major" => Some(Severity::High),
            "medium" | "moderate" => Some(Severity::Medium),
            "low" | "minor" | "info" => Some(Severity::Low),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// A normalized issue record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFinding {
    pub category: AnalysisLayer,
    pub severity: Severity,
    pub description: String,
    pub location: String,
    pub recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Relative implementation effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl Effort {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "low" | "small" => Some(Effort::Low),
            "medium" | "moderate" => Some(Effort::Medium),
            "high" | "large" => Some(Effort::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSuggestion {
    pub area: String,
    pub suggestion: String,
    pub expected_benefit: String,
    pub effort: Effort,
}

/// Whether a legacy remnant still needs work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemnantStatus {
    #[default]
    Unresolved,
    Resolved,
}

/// Leftover mock data, placeholder, or deprecated code path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRemnant {
    pub location: String,
    pub description: String,
    pub action: String,
    #[serde(default)]
    pub status: RemnantStatus,
}

/// Integer score clamped to 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct ComplianceScore(u8);

impl ComplianceScore {
    pub const MAX: ComplianceScore = ComplianceScore(100);
    pub const MIN: ComplianceScore = ComplianceScore(0);

    /// Clamp any integer into range
    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, 100) as u8)
    }

    /// Round and clamp a float; non-finite values map to 0
    pub fn from_f64(value: f64) -> Self {
        if !value.is_finite() {
            return Self::MIN;
        }
        Self(value.round().clamp(0.0, 100.0) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl From<i64> for ComplianceScore {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<ComplianceScore> for u8 {
    fn from(score: ComplianceScore) -> u8 {
        score.0
    }
}

impl std::fmt::Display for ComplianceScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Performance metrics of an interaction batch. Percentages are 0..=100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InteractionMetrics {
    pub quality_score: u8,
    pub resolution_rate: u8,
    pub average_response_minutes: f64,
    pub satisfaction_index: u8,
    pub follow_up_rate: u8,
    pub engagement_score: u8,
}

// ============================================================================
// Per-Target Result
// ============================================================================

/// Where a field group came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Model,
    Fallback,
}

/// The independently backfilled parts of a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldGroup {
    Findings,
    Optimizations,
    LegacyRemnants,
    ComplianceScore,
    Metrics,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 5] = [
        FieldGroup::Findings,
        FieldGroup::Optimizations,
        FieldGroup::LegacyRemnants,
        FieldGroup::ComplianceScore,
        FieldGroup::Metrics,
    ];

    /// Key of this group in the model's JSON reply
    pub fn response_key(&self) -> &'static str {
        match self {
            FieldGroup::Findings => "criticalIssues",
            FieldGroup::Optimizations => "optimizations",
            FieldGroup::LegacyRemnants => "legacySystemRemnants",
            FieldGroup::ComplianceScore => "complianceScore",
            FieldGroup::Metrics => "performanceMetrics",
        }
    }
}

/// Provenance flag per field group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldProvenance {
    pub findings: Provenance,
    pub optimizations: Provenance,
    pub legacy_remnants: Provenance,
    pub compliance_score: Provenance,
    pub metrics: Provenance,
}

impl FieldProvenance {
    pub fn all(provenance: Provenance) -> Self {
        Self {
            findings: provenance,
            optimizations: provenance,
            legacy_remnants: provenance,
            compliance_score: provenance,
            metrics: provenance,
        }
    }

    pub fn get(&self, group: FieldGroup) -> Provenance {
        match group {
            FieldGroup::Findings => self.findings,
            FieldGroup::Optimizations => self.optimizations,
            FieldGroup::LegacyRemnants => self.legacy_remnants,
            FieldGroup::ComplianceScore => self.compliance_score,
            FieldGroup::Metrics => self.metrics,
        }
    }

    pub fn set(&mut self, group: FieldGroup, provenance: Provenance) {
        match group {
            FieldGroup::Findings => self.findings = provenance,
            FieldGroup::Optimizations => self.optimizations = provenance,
            FieldGroup::LegacyRemnants => self.legacy_remnants = provenance,
            FieldGroup::ComplianceScore => self.compliance_score = provenance,
            FieldGroup::Metrics => self.metrics = provenance,
        }
    }

    /// Whether every group came from the model
    pub fn is_fully_model(&self) -> bool {
        FieldGroup::ALL
            .iter()
            .all(|g| self.get(*g) == Provenance::Model)
    }

    /// Whether every group came from the fallback engine
    pub fn is_fully_fallback(&self) -> bool {
        FieldGroup::ALL
            .iter()
            .all(|g| self.get(*g) == Provenance::Fallback)
    }
}

/// Stages of the per-target state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStage {
    Built,
    Requested,
    Parsed,
    Failed,
    Finalized,
}

/// Why a target fell back to heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    AuthFailure,
    TransportFailure,
    ServiceError,
    EmptyResponse,
    InvalidRequest,
    ParseFailure,
    TargetFailure,
}

impl From<InferenceErrorKind> for FailureKind {
    fn from(kind: InferenceErrorKind) -> Self {
        match kind {
            InferenceErrorKind::AuthFailure => FailureKind::AuthFailure,
            InferenceErrorKind::TransportFailure => FailureKind::TransportFailure,
            InferenceErrorKind::ServiceError => FailureKind::ServiceError,
            InferenceErrorKind::EmptyResponse => FailureKind::EmptyResponse,
            InferenceErrorKind::InvalidRequest => FailureKind::InvalidRequest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl StageFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Finalized, schema-complete result for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerTargetResult {
    pub target: AnalysisTarget,
    pub findings: Vec<StructuredFinding>,
    pub optimizations: Vec<OptimizationSuggestion>,
    pub legacy_remnants: Vec<LegacyRemnant>,
    pub compliance_score: ComplianceScore,
    pub metrics: InteractionMetrics,
    pub provenance: FieldProvenance,
    /// Groups the model left out or sent malformed
    #[serde(default)]
    pub omissions: Vec<FieldGroup>,
    /// Failure that sent the whole target to the fallback engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StageFailure>,
    /// Visited states, in order
    #[serde(default)]
    pub stages: Vec<AnalysisStage>,
}

impl PerTargetResult {
    /// Number of findings rated critical or high
    pub fn critical_or_high_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity.is_critical_or_high())
            .count()
    }

    /// Number of findings with the given severity and category
    pub fn count_findings(&self, severity: Severity, category: AnalysisLayer) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity && f.category == category)
            .count()
    }

    pub fn unresolved_remnants(&self) -> usize {
        self.legacy_remnants
            .iter()
            .filter(|r| r.status == RemnantStatus::Unresolved)
            .count()
    }

    /// Whether the analysis of this target did not complete at all
    pub fn is_target_failure(&self) -> bool {
        self.failure
            .as_ref()
            .is_some_and(|f| f.kind == FailureKind::TargetFailure)
    }

    /// Whether the target fell back wholesale or did not complete
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

// ============================================================================
// Consolidated Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriticalFindingEntry {
    pub component: String,
    pub issue_count: usize,
    pub severity: Severity,
    pub category: AnalysisLayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupItem {
    pub location: String,
    pub action: String,
    pub status: RemnantStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceScores {
    pub security: ComplianceScore,
    pub functionality: ComplianceScore,
    pub performance: ComplianceScore,
    pub user_experience: ComplianceScore,
    pub overall: ComplianceScore,
}

impl ComplianceScores {
    pub fn layer(&self, layer: AnalysisLayer) -> ComplianceScore {
        match layer {
            AnalysisLayer::Security => self.security,
            AnalysisLayer::Functionality => self.functionality,
            AnalysisLayer::Performance => self.performance,
            AnalysisLayer::UserExperience => self.user_experience,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Immediate,
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub priority: ActionPriority,
    pub task: String,
    pub estimated_effort: String,
    pub business_impact: String,
}

/// Batch-level summary folded from every per-target result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedReport {
    /// RFC 3339 generation time
    pub timestamp: String,
    pub targets_analyzed: usize,
    pub critical_findings: Vec<CriticalFindingEntry>,
    pub legacy_system_cleanup: Vec<CleanupItem>,
    pub compliance_scores: ComplianceScores,
    pub prioritized_action_plan: Vec<ActionItem>,
    /// Targets that fell back wholesale or failed, in input order
    pub degraded_targets: Vec<String>,
    /// Per-target results, in input order
    pub target_results: Vec<PerTargetResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compliance_score_clamps() {
        assert_eq!(ComplianceScore::new(-20).value(), 0);
        assert_eq!(ComplianceScore::new(250).value(), 100);
        assert_eq!(ComplianceScore::from_f64(72.6).value(), 73);
        assert_eq!(ComplianceScore::from_f64(f64::NAN).value(), 0);
    }

    #[test]
    fn test_compliance_score_serde_clamps() {
        let score: ComplianceScore = serde_json::from_str("140").unwrap();
        assert_eq!(score.value(), 100);
        assert_eq!(serde_json::to_string(&ComplianceScore::new(42)).unwrap(), "42");
    }

    #[test]
    fn test_layer_parse_is_lenient() {
        assert_eq!(AnalysisLayer::parse("Security"), Some(AnalysisLayer::Security));
        assert_eq!(
            AnalysisLayer::parse("user_experience"),
            Some(AnalysisLayer::UserExperience)
        );
        assert_eq!(AnalysisLayer::parse("UX"), Some(AnalysisLayer::UserExperience));
        assert_eq!(AnalysisLayer::parse("billing"), None);
    }

    #[test]
    fn test_layer_serde_names() {
        assert_eq!(
            serde_json::to_string(&AnalysisLayer::UserExperience).unwrap(),
            "\"userExperience\""
        );
    }

    #[test]
    fn test_target_deserializes_with_defaults() {
        let target: AnalysisTarget =
            serde_json::from_str(r#"{"name": "crm-calls", "category": "userExperience"}"#).unwrap();
        assert_eq!(target.kind, TargetKind::Component);
        assert!(target.context_description.is_empty());

        let batch: AnalysisTarget = serde_json::from_str(
            r#"{"name": "q1", "category": "performance",
                "kind": {"type": "interactionBatch", "from": "2024-01-01T00:00:00Z"}}"#,
        )
        .unwrap();
        assert!(matches!(
            batch.kind,
            TargetKind::InteractionBatch { from: Some(_), to: None }
        ));
    }

    #[test]
    fn test_all_null_record_deserializes() {
        let record: RawRecord = serde_json::from_str(
            r#"{"id": null, "summaryText": null, "durationMinutes": null, "timestamp": null}"#,
        )
        .unwrap();
        assert_eq!(record, RawRecord::default());
        assert_eq!(record.summary(), "");
        assert_eq!(record.positive_duration(), None);
    }

    #[test]
    fn test_positive_duration_filters() {
        assert_eq!(RawRecord::interaction("", 0.0).positive_duration(), None);
        assert_eq!(RawRecord::interaction("", -3.0).positive_duration(), None);
        assert_eq!(RawRecord::interaction("", 7.5).positive_duration(), Some(7.5));
    }

    #[test]
    fn test_field_provenance() {
        let mut provenance = FieldProvenance::all(Provenance::Model);
        assert!(provenance.is_fully_model());
        provenance.set(FieldGroup::Metrics, Provenance::Fallback);
        assert!(!provenance.is_fully_model());
        assert!(!provenance.is_fully_fallback());
        assert_eq!(provenance.get(FieldGroup::Metrics), Provenance::Fallback);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!(Severity::parse("CRITICAL"), Some(Severity::Critical));
        assert_eq!(Severity::parse(" minor "), Some(Severity::Low));
        assert_eq!(Severity::parse("urgent-ish"), None);
        assert!(Severity::High.is_critical_or_high());
        assert!(!Severity::Medium.is_critical_or_high());
    }
}
