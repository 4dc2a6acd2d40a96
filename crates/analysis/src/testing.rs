//! Inference client doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use assay_llm::{AnalysisRequest, InferenceClient, InferenceError, InferenceResult};
use async_trait::async_trait;

/// Returns queued replies in order, repeating the last one when exhausted.
pub struct MockClient {
    replies: Mutex<Vec<InferenceResult<String>>>,
    calls: AtomicUsize,
}

impl MockClient {
    pub fn new(replies: Vec<InferenceResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing(error: InferenceError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceClient for MockClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, _request: &AnalysisRequest) -> InferenceResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies
                .first()
                .cloned()
                .unwrap_or(Err(InferenceError::EmptyResponse))
        }
    }
}

/// Sleeps before replying.
pub struct SlowClient {
    delay: Duration,
}

impl SlowClient {
    pub fn new(delay_secs: u64) -> Self {
        Self {
            delay: Duration::from_secs(delay_secs),
        }
    }
}

#[async_trait]
impl InferenceClient for SlowClient {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn complete(&self, _request: &AnalysisRequest) -> InferenceResult<String> {
        tokio::time::sleep(self.delay).await;
        Ok(r#"{"complianceScore": 100}"#.to_string())
    }
}

/// Panics when the prompt mentions the given marker, replies otherwise.
pub struct PanickingClient {
    marker: &'static str,
    reply: &'static str,
}

impl PanickingClient {
    pub fn new(marker: &'static str, reply: &'static str) -> Self {
        Self { marker, reply }
    }
}

#[async_trait]
impl InferenceClient for PanickingClient {
    fn name(&self) -> &'static str {
        "panicking"
    }

    async fn complete(&self, request: &AnalysisRequest) -> InferenceResult<String> {
        if request.prompt_text.contains(self.marker) {
            panic!("client blew up on {}", self.marker);
        }
        Ok(self.reply.to_string())
    }
}
