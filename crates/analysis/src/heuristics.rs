//! Fallback Heuristic Engine
//!
//! Deterministic computation of the full result schema from raw records.
//! Used wholesale when inference or parsing fails, and group by group to
//! backfill omissions in a model reply. Everything here is a pure function of
//! its input: no I/O, no clock, no randomness.
//!
//! Keyword lists cover English and Persian; matching is case-insensitive
//! substring search over lowercased text.

use crate::models::{
    AnalysisLayer, AnalysisTarget, ComplianceScore, Effort, InteractionMetrics, LegacyRemnant,
    OptimizationSuggestion, RawRecord, RemnantStatus, Severity, StructuredFinding, TargetKind,
};
use crate::summarizer::truncate_chars;

// ============================================================================
// Keyword Lists
// ============================================================================

const RESOLUTION_KEYWORDS: &[&str] = &[
    "resolved", "solved", "fixed", "closed", "completed", "حل شد", "برطرف شد", "رفع شد",
    "انجام شد",
];

const RESOLUTION_NEGATIONS: &[&str] = &["unresolved", "not resolved", "not fixed", "not solved"];

const SATISFACTION_KEYWORDS: &[&str] = &[
    "satisfied", "happy", "thank", "great", "excellent", "pleased", "راضی", "خوشحال", "ممنون",
    "تشکر", "عالی",
];

const SATISFACTION_NEGATIONS: &[&str] = &[
    "dissatisfied",
    "unsatisfied",
    "unhappy",
    "not satisfied",
    "not happy",
    "ناراضی",
    "نارضایتی",
];

const FOLLOW_UP_KEYWORDS: &[&str] = &[
    "follow up", "follow-up", "followup", "callback", "call back", "پیگیری", "تماس مجدد",
];

const SECURITY_KEYWORDS: &[&str] = &[
    "password", "credential", "api key", "apikey", "secret", "unauthorized", "breach", "leak",
    "injection", "xss", "رمز عبور", "نفوذ", "غیرمجاز", "افشا",
];

const FAILURE_KEYWORDS: &[&str] = &[
    "error", "failed", "failure", "crash", "exception", "outage", "broken", "خطا", "خرابی",
    "ناموفق",
];

const LEGACY_KEYWORDS: &[&str] = &[
    "deprecated", "legacy", "mock data", "mockdata", "mock_", "placeholder", "hardcoded",
    "hard-coded", "todo", "fixme", "منسوخ", "داده آزمایشی",
];

/// Handling time above which a record counts as slow, in minutes
const SLOW_RECORD_MINUTES: f64 = 60.0;

/// Average response time above which an optimization is suggested, in minutes
const SLOW_AVERAGE_MINUTES: f64 = 30.0;

/// Summary length that earns the detail bonus in the quality score
const DETAILED_SUMMARY_CHARS: usize = 40;

const EXAMPLE_CHARS: usize = 120;

/// Default action for a detected legacy remnant
pub const REMNANT_ACTION: &str = "remove or migrate";

// ============================================================================
// Full Assessment
// ============================================================================

/// Every field group computed from records alone
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicAssessment {
    pub findings: Vec<StructuredFinding>,
    pub optimizations: Vec<OptimizationSuggestion>,
    pub legacy_remnants: Vec<LegacyRemnant>,
    pub compliance_score: ComplianceScore,
    pub metrics: InteractionMetrics,
    /// Record hits of the critical and high rules behind `findings`
    pub critical_or_high_hits: usize,
}

/// Compute the complete fallback assessment of a batch.
pub fn assess(target: &AnalysisTarget, records: &[RawRecord]) -> HeuristicAssessment {
    let metrics = compute_metrics(records);
    let tally = tally_rules(records);
    let critical_or_high_hits = tally.critical_or_high_hits();
    let findings = tally.into_findings();
    let legacy_remnants = detect_legacy_remnants(records);
    let compliance_score = score_from_counts(critical_or_high_hits, unresolved_count(&legacy_remnants));
    let optimizations = suggest_optimizations(&target.kind, records, &metrics);
    HeuristicAssessment {
        findings,
        optimizations,
        legacy_remnants,
        compliance_score,
        metrics,
        critical_or_high_hits,
    }
}

// ============================================================================
// Metrics
// ============================================================================

/// All six interaction metrics of a batch
pub fn compute_metrics(records: &[RawRecord]) -> InteractionMetrics {
    InteractionMetrics {
        quality_score: quality_score(records),
        resolution_rate: resolution_rate(records),
        average_response_minutes: average_response_minutes(records),
        satisfaction_index: satisfaction_index(records),
        follow_up_rate: follow_up_rate(records),
        engagement_score: engagement_score(records),
    }
}

/// Mean per-record quality score, 0 for an empty batch.
pub fn quality_score(records: &[RawRecord]) -> u8 {
    mean_score(records, |record| {
        let mut score = 50.0;
        if let Some(duration) = record.positive_duration() {
            score += (duration * 20.0 / 30.0).round().min(20.0);
        }
        if record.summary().chars().count() > DETAILED_SUMMARY_CHARS {
            score += 15.0;
        }
        if has_follow_up(record) {
            score += 15.0;
        }
        score.clamp(0.0, 100.0)
    })
}

/// Percentage of records whose summary reports a resolution
pub fn resolution_rate(records: &[RawRecord]) -> u8 {
    percentage(records, |r| {
        matches_keywords(r.summary(), RESOLUTION_KEYWORDS, RESOLUTION_NEGATIONS)
    })
}

/// Mean of positive durations in minutes, rounded to one decimal; 0 when none
pub fn average_response_minutes(records: &[RawRecord]) -> f64 {
    let durations: Vec<f64> = records.iter().filter_map(RawRecord::positive_duration).collect();
    if durations.is_empty() {
        return 0.0;
    }
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Percentage of records whose summary carries positive sentiment
pub fn satisfaction_index(records: &[RawRecord]) -> u8 {
    percentage(records, |r| {
        matches_keywords(r.summary(), SATISFACTION_KEYWORDS, SATISFACTION_NEGATIONS)
    })
}

/// Percentage of records carrying a follow-up marker
pub fn follow_up_rate(records: &[RawRecord]) -> u8 {
    percentage(records, has_follow_up)
}

/// Mean record completeness: subject 30, summary 40, duration 30
pub fn engagement_score(records: &[RawRecord]) -> u8 {
    mean_score(records, |record| {
        let mut score = 0.0;
        if record.subject.as_deref().is_some_and(|s| !s.trim().is_empty()) {
            score += 30.0;
        }
        if !record.summary().trim().is_empty() {
            score += 40.0;
        }
        if record.positive_duration().is_some() {
            score += 30.0;
        }
        score
    })
}

fn has_follow_up(record: &RawRecord) -> bool {
    record.follow_up == Some(true) || matches_keywords(record.summary(), FOLLOW_UP_KEYWORDS, &[])
}

fn percentage(records: &[RawRecord], predicate: impl Fn(&RawRecord) -> bool) -> u8 {
    if records.is_empty() {
        return 0;
    }
    let hits = records.iter().filter(|r| predicate(r)).count();
    ComplianceScore::from_f64(hits as f64 * 100.0 / records.len() as f64).value()
}

fn mean_score(records: &[RawRecord], score: impl Fn(&RawRecord) -> f64) -> u8 {
    if records.is_empty() {
        return 0;
    }
    let total: f64 = records.iter().map(score).sum();
    ComplianceScore::from_f64(total / records.len() as f64).value()
}

/// Whether `text` contains a keyword and no negation
fn matches_keywords(text: &str, keywords: &[&str], negations: &[&str]) -> bool {
    first_keyword(text, keywords).is_some() && first_keyword(text, negations).is_none()
}

fn first_keyword<'k>(text: &str, keywords: &[&'k str]) -> Option<&'k str> {
    if text.is_empty() {
        return None;
    }
    let lowered = text.to_lowercase();
    keywords.iter().copied().find(|k| lowered.contains(k))
}

// ============================================================================
// Findings and Remnants
// ============================================================================

/// Searchable free text of a record
fn record_text(record: &RawRecord) -> String {
    [&record.subject, &record.summary_text, &record.content]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best available location label of a record
fn record_location(index: usize, record: &RawRecord) -> String {
    if let Some(location) = record.location.as_deref().filter(|l| !l.trim().is_empty()) {
        return location.to_string();
    }
    match record.id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(id) => format!("record {}", id),
        None => format!("record #{}", index + 1),
    }
}

/// Offenders of one rule: count, first location, first example
struct RuleHits {
    count: usize,
    location: Option<String>,
    example: Option<String>,
}

impl RuleHits {
    fn new() -> Self {
        Self {
            count: 0,
            location: None,
            example: None,
        }
    }

    fn hit(&mut self, location: impl FnOnce() -> String, example: Option<String>) {
        self.count += 1;
        if self.location.is_none() {
            self.location = Some(location());
            self.example = example;
        }
    }

    fn into_finding(
        self,
        category: AnalysisLayer,
        severity: Severity,
        description: String,
        recommendation: &str,
    ) -> Option<StructuredFinding> {
        if self.count == 0 {
            return None;
        }
        Some(StructuredFinding {
            category,
            severity,
            description,
            location: self.location.unwrap_or_else(|| "unspecified".to_string()),
            recommendation: recommendation.to_string(),
            example: self.example,
        })
    }
}

/// Hits of every finding rule over one batch
struct RuleTally {
    security: RuleHits,
    failure: RuleHits,
    slow: RuleHits,
    missing_summary: RuleHits,
}

/// Keyword and threshold rules, one aggregated finding per rule.
pub fn detect_findings(records: &[RawRecord]) -> Vec<StructuredFinding> {
    tally_rules(records).into_findings()
}

fn tally_rules(records: &[RawRecord]) -> RuleTally {
    let mut security = RuleHits::new();
    let mut failure = RuleHits::new();
    let mut slow = RuleHits::new();
    let mut missing_summary = RuleHits::new();

    for (index, record) in records.iter().enumerate() {
        let text = record_text(record);
        let example = || Some(truncate_chars(&text, EXAMPLE_CHARS));

        if first_keyword(&text, SECURITY_KEYWORDS).is_some() {
            security.hit(|| record_location(index, record), example());
        }
        if first_keyword(&text, FAILURE_KEYWORDS).is_some() {
            failure.hit(|| record_location(index, record), example());
        }
        if let Some(duration) = record.positive_duration().filter(|d| *d > SLOW_RECORD_MINUTES) {
            slow.hit(
                || record_location(index, record),
                Some(format!("{} minutes", duration)),
            );
        }
        let has_content = record.content.as_deref().is_some_and(|c| !c.trim().is_empty());
        if record.summary().trim().is_empty() && !has_content {
            missing_summary.hit(|| record_location(index, record), None);
        }
    }

    RuleTally {
        security,
        failure,
        slow,
        missing_summary,
    }
}

impl RuleTally {
    /// Security and failure hits; these rules emit critical or high findings
    fn critical_or_high_hits(&self) -> usize {
        self.security.count + self.failure.count
    }

    fn into_findings(self) -> Vec<StructuredFinding> {
        let RuleTally {
            security,
            failure,
            slow,
            missing_summary,
        } = self;
        let security_count = security.count;
        let failure_count = failure.count;
        let slow_count = slow.count;
        let missing_count = missing_summary.count;

        [
            security.into_finding(
                AnalysisLayer::Security,
                Severity::Critical,
                format!("{} record(s) mention security-sensitive material", security_count),
                "Remove sensitive data and review access controls",
            ),
            failure.into_finding(
                AnalysisLayer::Functionality,
                Severity::High,
                format!("{} record(s) report errors or failures", failure_count),
                "Investigate the failing flow and add handling for the error case",
            ),
            slow.into_finding(
                AnalysisLayer::Performance,
                Severity::Medium,
                format!(
                    "{} record(s) took longer than {} minutes",
                    slow_count, SLOW_RECORD_MINUTES
                ),
                "Review the handling steps of long cases and add shortcuts or escalation",
            ),
            missing_summary.into_finding(
                AnalysisLayer::UserExperience,
                Severity::Low,
                format!("{} record(s) have no summary", missing_count),
                "Require a short summary when closing a record",
            ),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// One unresolved remnant per record carrying a legacy marker.
pub fn detect_legacy_remnants(records: &[RawRecord]) -> Vec<LegacyRemnant> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            let keyword = first_keyword(&record_text(record), LEGACY_KEYWORDS)?;
            Some(LegacyRemnant {
                location: record_location(index, record),
                description: format!("legacy marker '{}' found", keyword),
                action: REMNANT_ACTION.to_string(),
                status: RemnantStatus::Unresolved,
            })
        })
        .collect()
}

// ============================================================================
// Optimizations and Score
// ============================================================================

/// Threshold-based suggestions over the batch metrics.
///
/// Only interaction batches get suggestions; interaction metrics say nothing
/// about component descriptors.
pub fn suggest_optimizations(
    kind: &TargetKind,
    records: &[RawRecord],
    metrics: &InteractionMetrics,
) -> Vec<OptimizationSuggestion> {
    if !matches!(kind, TargetKind::InteractionBatch { .. }) || records.is_empty() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();
    if metrics.average_response_minutes > SLOW_AVERAGE_MINUTES {
        suggestions.push(OptimizationSuggestion {
            area: "response time".to_string(),
            suggestion: format!(
                "Average handling time is {} minutes; add templates and triage for common cases",
                metrics.average_response_minutes
            ),
            expected_benefit: "Shorter handling time per record".to_string(),
            effort: Effort::Medium,
        });
    }
    if metrics.resolution_rate < 50 {
        suggestions.push(OptimizationSuggestion {
            area: "resolution".to_string(),
            suggestion: format!(
                "Only {}% of records end resolved; add an escalation path for open cases",
                metrics.resolution_rate
            ),
            expected_benefit: "Higher first-contact resolution".to_string(),
            effort: Effort::Medium,
        });
    }
    if metrics.satisfaction_index < 50 {
        suggestions.push(OptimizationSuggestion {
            area: "customer satisfaction".to_string(),
            suggestion: format!(
                "Positive sentiment appears in {}% of records; review scripts and staff training",
                metrics.satisfaction_index
            ),
            expected_benefit: "Improved satisfaction and retention".to_string(),
            effort: Effort::High,
        });
    }
    if metrics.follow_up_rate < 20 {
        suggestions.push(OptimizationSuggestion {
            area: "follow-up".to_string(),
            suggestion: format!(
                "Follow-ups are recorded for {}% of records; schedule them automatically",
                metrics.follow_up_rate
            ),
            expected_benefit: "Fewer dropped cases".to_string(),
            effort: Effort::Low,
        });
    }
    suggestions
}

/// Score of a finding list and remnant list, one penalty per finding.
pub fn compliance_score(findings: &[StructuredFinding], remnants: &[LegacyRemnant]) -> ComplianceScore {
    let critical_or_high = findings
        .iter()
        .filter(|f| f.severity.is_critical_or_high())
        .count();
    score_from_counts(critical_or_high, unresolved_count(remnants))
}

/// `max(0, 100 - 10 * critical_or_high) - 5 * unresolved`, clamped.
pub fn score_from_counts(critical_or_high: usize, unresolved: usize) -> ComplianceScore {
    let penalty = |count: usize, weight: i64| {
        i64::try_from(count).unwrap_or(i64::MAX).saturating_mul(weight)
    };
    let base = 100i64.saturating_sub(penalty(critical_or_high, 10)).max(0);
    ComplianceScore::new(base.saturating_sub(penalty(unresolved, 5)))
}

pub fn unresolved_count(remnants: &[LegacyRemnant]) -> usize {
    remnants
        .iter()
        .filter(|r| r.status == RemnantStatus::Unresolved)
        .count()
}
