//! Prompt Builder
//!
//! Turns a record digest, a context description, and an analysis layer into
//! the request sent to the model. The text spells out the expected JSON shape
//! so the parser can validate the reply field by field. Output is a pure
//! function of the inputs.

use assay_llm::AnalysisRequest;

use crate::config::RequestConfig;
use chrono::SecondsFormat;

use crate::models::{AnalysisLayer, AnalysisTarget, TargetKind};

/// Builds analysis requests with fixed sampling parameters.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    request: RequestConfig,
}

impl PromptBuilder {
    pub fn new(request: RequestConfig) -> Self {
        Self { request }
    }

    /// Build the request for `target`, with its kind and time window noted
    /// after the context description.
    pub fn build_for_target(&self, digest: &str, target: &AnalysisTarget) -> AnalysisRequest {
        let context = target.context_description.trim();
        let scope = describe_kind(&target.kind);
        let context = if context.is_empty() {
            scope
        } else {
            format!("{}\n{}", context, scope)
        };
        self.build(digest, &context, target.category)
    }

    /// Build the request for one target.
    pub fn build(&self, digest: &str, context: &str, layer: AnalysisLayer) -> AnalysisRequest {
        let context = context.trim();
        let context = if context.is_empty() {
            "(no context provided)"
        } else {
            context
        };

        let text = format!(
            r#"Analyze the following records for the {layer} layer and produce a quality assessment.

Context:
{context}

Focus:
{focus}

Respond with a single JSON object and nothing else, using exactly this shape:
{{
  "criticalIssues": [
    {{
      "category": "security" | "functionality" | "performance" | "userExperience",
      "severity": "critical" | "high" | "medium" | "low",
      "description": "what is wrong",
      "location": "where it occurs",
      "recommendation": "how to fix it",
      "example": "optional evidence"
    }}
  ],
  "optimizations": [
    {{
      "area": "affected area",
      "suggestion": "what to change",
      "expectedBenefit": "what improves",
      "effort": "low" | "medium" | "high"
    }}
  ],
  "legacySystemRemnants": [
    {{
      "location": "where it is",
      "description": "mock data, placeholder, or deprecated path",
      "action": "remove or migrate",
      "status": "unresolved" | "resolved"
    }}
  ],
  "complianceScore": <integer 0-100>,
  "performanceMetrics": {{
    "qualityScore": <integer 0-100>,
    "resolutionRate": <integer 0-100>,
    "averageResponseMinutes": <number >= 0>,
    "satisfactionIndex": <integer 0-100>,
    "followUpRate": <integer 0-100>,
    "engagementScore": <integer 0-100>
  }}
}}

Use empty arrays when nothing applies. Percentages are integers from 0 to 100.

Records:
```
{digest}
```"#,
            layer = layer,
            context = context,
            focus = focus_for(layer),
            digest = digest,
        );

        AnalysisRequest::new(text, self.request.temperature, self.request.max_output_tokens)
    }
}

fn describe_kind(kind: &TargetKind) -> String {
    match kind {
        TargetKind::Component => {
            "Target: a source component; each record describes one of its files.".to_string()
        }
        TargetKind::InteractionBatch { from, to } => {
            let bound = |at: &Option<chrono::DateTime<chrono::Utc>>| {
                at.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
                    .unwrap_or_else(|| "open".to_string())
            };
            format!(
                "Target: a batch of interaction records, window {} to {}.",
                bound(from),
                bound(to)
            )
        }
    }
}

fn focus_for(layer: AnalysisLayer) -> &'static str {
    match layer {
        AnalysisLayer::Security => {
            "Look for exposed credentials, missing authorization checks, injection risks, \
             and sensitive data leaking into logs or responses."
        }
        AnalysisLayer::Functionality => {
            "Look for failed or unresolved cases, broken flows, error handling gaps, \
             and leftover mock data or placeholder logic."
        }
        AnalysisLayer::Performance => {
            "Look for slow responses, long handling times, and repeated work. \
             Fill performanceMetrics from the records."
        }
        AnalysisLayer::UserExperience => {
            "Look for unresolved requests, negative sentiment, missing follow-ups, \
             and incomplete records."
        }
    }
}
