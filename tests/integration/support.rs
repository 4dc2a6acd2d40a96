//! Shared fixtures for the integration suite.

use std::collections::HashMap;
use std::sync::Mutex;

use assay_analysis::{AnalysisLayer, AnalysisTarget, RawRecord, TargetKind};
use assay_llm::{AnalysisRequest, InferenceClient, InferenceError, InferenceResult};
use async_trait::async_trait;

/// Replies chosen by a substring of the prompt; unmatched prompts fail.
pub struct ScriptedClient {
    script: Vec<(&'static str, InferenceResult<String>)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<(&'static str, InferenceResult<String>)>) -> Self {
        Self {
            script,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn complete(&self, request: &AnalysisRequest) -> InferenceResult<String> {
        self.prompts.lock().unwrap().push(request.prompt_text.clone());
        self.script
            .iter()
            .find(|(marker, _)| request.prompt_text.contains(marker))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Err(InferenceError::transport("no scripted reply")))
    }
}

/// The three-record Persian support batch
pub fn persian_batch() -> Vec<RawRecord> {
    vec![
        RawRecord::interaction("مشکل حل شد, مشتری راضی", 12.0),
        RawRecord::interaction("", 0.0),
        RawRecord::interaction("پیگیری لازم است", 8.0),
    ]
}

/// Component descriptors with a leftover mock and a hardcoded secret
pub fn component_batch() -> Vec<RawRecord> {
    vec![
        RawRecord::component("src/billing/invoices.ts", "const invoices = MOCK_INVOICES; // mock data"),
        RawRecord::component("src/auth/config.ts", "export const password = 'admin123'"),
        RawRecord::component("src/reports/chart.ts", "renderChart(data)"),
    ]
}

/// Targets plus their records keyed by name. Batches whose records carry
/// summaries become interaction batches, the rest components.
pub fn input(
    targets: Vec<(&str, AnalysisLayer, Vec<RawRecord>)>,
) -> (Vec<AnalysisTarget>, HashMap<String, Vec<RawRecord>>) {
    let mut list = Vec::new();
    let mut records = HashMap::new();
    for (name, layer, batch) in targets {
        let kind = if batch.iter().any(|r| r.summary_text.is_some()) {
            TargetKind::InteractionBatch { from: None, to: None }
        } else {
            TargetKind::Component
        };
        list.push(AnalysisTarget::new(name, format!("context for {}", name), layer).with_kind(kind));
        records.insert(name.to_string(), batch);
    }
    (list, records)
}
