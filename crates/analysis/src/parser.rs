//! Response Parser
//!
//! Extracts one JSON object from free-form model output and validates each
//! known key on its own. A key that is missing or malformed becomes an
//! omission the analyzer backfills; only a reply with no JSON object at all
//! is a `ParseFailure`.

use serde_json::{Map, Value};

use crate::error::ParseFailure;
use crate::models::{
    AnalysisLayer, ComplianceScore, Effort, FieldGroup, InteractionMetrics, LegacyRemnant,
    OptimizationSuggestion, RemnantStatus, Severity, StructuredFinding,
};
use crate::summarizer::truncate_chars;

/// Field groups recovered from a model reply. `None` marks an omission.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelAssessment {
    pub findings: Option<Vec<StructuredFinding>>,
    pub optimizations: Option<Vec<OptimizationSuggestion>>,
    pub legacy_remnants: Option<Vec<LegacyRemnant>>,
    pub compliance_score: Option<ComplianceScore>,
    pub metrics: Option<InteractionMetrics>,
}

impl ModelAssessment {
    /// Groups the reply did not supply in valid form, in schema order
    pub fn omissions(&self) -> Vec<FieldGroup> {
        let mut omitted = Vec::new();
        if self.findings.is_none() {
            omitted.push(FieldGroup::Findings);
        }
        if self.optimizations.is_none() {
            omitted.push(FieldGroup::Optimizations);
        }
        if self.legacy_remnants.is_none() {
            omitted.push(FieldGroup::LegacyRemnants);
        }
        if self.compliance_score.is_none() {
            omitted.push(FieldGroup::ComplianceScore);
        }
        if self.metrics.is_none() {
            omitted.push(FieldGroup::Metrics);
        }
        omitted
    }
}

/// Parse a raw model reply.
pub fn parse_model_response(text: &str) -> Result<ModelAssessment, ParseFailure> {
    let object = extract_object(text)?;

    Ok(ModelAssessment {
        findings: array_group(&object, FieldGroup::Findings, "critical_issues", parse_finding),
        optimizations: array_group(
            &object,
            FieldGroup::Optimizations,
            "optimizations",
            parse_optimization,
        ),
        legacy_remnants: array_group(
            &object,
            FieldGroup::LegacyRemnants,
            "legacy_system_remnants",
            parse_remnant,
        ),
        compliance_score: field(&object, FieldGroup::ComplianceScore.response_key(), "compliance_score")
            .and_then(|v| v.as_f64())
            .map(ComplianceScore::from_f64),
        metrics: field(&object, FieldGroup::Metrics.response_key(), "performance_metrics")
            .and_then(|v| v.as_object())
            .and_then(parse_metrics),
    })
}

// ============================================================================
// JSON Extraction
// ============================================================================

fn extract_object(text: &str) -> Result<Map<String, Value>, ParseFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseFailure::new("reply is empty"));
    }

    let mut candidates: Vec<&str> = Vec::new();
    if let Some(fenced) = json_fence_body(trimmed) {
        candidates.push(fenced);
    }
    candidates.push(strip_fences(trimmed));
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    let mut saw_non_object = false;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(map)) => return Ok(map),
            Ok(_) => saw_non_object = true,
            Err(_) => continue,
        }
    }

    if saw_non_object {
        Err(ParseFailure::new("top-level JSON value is not an object"))
    } else {
        Err(ParseFailure::new(format!(
            "no JSON object found in reply starting with {:?}",
            truncate_chars(trimmed, 80)
        )))
    }
}

/// Interior of the first ```json fenced block, if any.
fn json_fence_body(text: &str) -> Option<&str> {
    // ASCII lowering keeps byte offsets aligned with `text`
    let lowered = text.to_ascii_lowercase();
    let marker = "```json";
    let start = lowered.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

/// The text without a leading fence line and a trailing fence marker.
fn strip_fences(text: &str) -> &str {
    let mut body = text;
    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(nl) => &body[nl + 1..],
            None => &body[3..],
        };
    }
    body = body.trim_end();
    if let Some(stripped) = body.strip_suffix("```") {
        body = stripped;
    }
    body.trim()
}

// ============================================================================
// Field Validation
// ============================================================================

/// Look up a key by its camelCase name or snake_case alias. JSON null counts as absent.
fn field<'a>(object: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    object
        .get(camel)
        .or_else(|| object.get(snake))
        .filter(|v| !v.is_null())
}

/// Validate an array group item by item.
///
/// Invalid items are dropped. A non-empty array with no valid item, or a
/// value that is not an array, is an omission.
fn array_group<T>(
    object: &Map<String, Value>,
    group: FieldGroup,
    snake: &str,
    parse_item: fn(&Map<String, Value>) -> Option<T>,
) -> Option<Vec<T>> {
    let items = field(object, group.response_key(), snake)?.as_array()?;
    let parsed: Vec<T> = items
        .iter()
        .filter_map(|item| item.as_object().and_then(parse_item))
        .collect();
    if !items.is_empty() && parsed.is_empty() {
        return None;
    }
    Some(parsed)
}

/// Non-blank string field
fn text(object: &Map<String, Value>, camel: &str, snake: &str) -> Option<String> {
    field(object, camel, snake)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn parse_finding(item: &Map<String, Value>) -> Option<StructuredFinding> {
    let category = AnalysisLayer::parse(&text(item, "category", "category")?)?;
    let severity = Severity::parse(&text(item, "severity", "severity")?)?;
    let description = text(item, "description", "description")?;
    Some(StructuredFinding {
        category,
        severity,
        description,
        location: text(item, "location", "location").unwrap_or_else(|| "unspecified".to_string()),
        recommendation: text(item, "recommendation", "recommendation").unwrap_or_default(),
        example: text(item, "example", "example"),
    })
}

fn parse_optimization(item: &Map<String, Value>) -> Option<OptimizationSuggestion> {
    let suggestion = text(item, "suggestion", "suggestion")?;
    let effort = match text(item, "effort", "effort") {
        Some(raw) => Effort::parse(&raw)?,
        None => Effort::Medium,
    };
    Some(OptimizationSuggestion {
        area: text(item, "area", "area").unwrap_or_else(|| "general".to_string()),
        suggestion,
        expected_benefit: text(item, "expectedBenefit", "expected_benefit").unwrap_or_default(),
        effort,
    })
}

fn parse_remnant(item: &Map<String, Value>) -> Option<LegacyRemnant> {
    let location = text(item, "location", "location")?;
    let description = text(item, "description", "description")?;
    let status = match text(item, "status", "status") {
        Some(raw) => match raw.to_lowercase().as_str() {
            "unresolved" | "open" | "pending" => RemnantStatus::Unresolved,
            "resolved" | "done" | "fixed" => RemnantStatus::Resolved,
            _ => return None,
        },
        None => RemnantStatus::Unresolved,
    };
    Some(LegacyRemnant {
        location,
        description,
        action: text(item, "action", "action").unwrap_or_else(|| "remove or migrate".to_string()),
        status,
    })
}

/// All six metrics must be valid numbers for the group to count.
fn parse_metrics(object: &Map<String, Value>) -> Option<InteractionMetrics> {
    let percent = |camel: &str, snake: &str| -> Option<u8> {
        let value = field(object, camel, snake)?.as_f64()?;
        Some(ComplianceScore::from_f64(value).value())
    };
    let minutes = field(object, "averageResponseMinutes", "average_response_minutes")?.as_f64()?;
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }

    Some(InteractionMetrics {
        quality_score: percent("qualityScore", "quality_score")?,
        resolution_rate: percent("resolutionRate", "resolution_rate")?,
        average_response_minutes: (minutes * 10.0).round() / 10.0,
        satisfaction_index: percent("satisfactionIndex", "satisfaction_index")?,
        follow_up_rate: percent("followUpRate", "follow_up_rate")?,
        engagement_score: percent("engagementScore", "engagement_score")?,
    })
}
