//! HTTP Integration Tests
//!
//! Full runs against a local chat-completions endpoint, built through the
//! same client factory the binary uses.

use std::sync::{Arc, Mutex};

use assay_analysis::{
    AnalysisLayer, FailureKind, MemoryResultSink, PipelineConfig, Provenance, ReportAggregator,
};
use assay_llm::{build_inference_client, InferenceClient, ProviderConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::support::{input, persian_batch};

// ============================================================================
// Helper Functions
// ============================================================================

/// Captured raw requests
type Captured = Arc<Mutex<Vec<String>>>;

/// Serve every connection with the same status and body until the test ends.
async fn serve(status_line: &'static str, body: String) -> (String, Captured) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let sink = captured.clone();
    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let body = body.clone();
            let sink = sink.clone();
            tokio::spawn(async move {
                respond(socket, status_line, &body, &sink).await;
            });
        }
    });
    (format!("http://{}/v1/chat/completions", addr), captured)
}

async fn respond(mut socket: TcpStream, status_line: &str, body: &str, captured: &Captured) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|l| {
                    l.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    captured
        .lock()
        .unwrap()
        .push(String::from_utf8_lossy(&buf).to_string());

    let response = format!(
        "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn chat_envelope(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

fn provider(base_url: String) -> ProviderConfig {
    ProviderConfig {
        api_key: Some("sk-local".to_string()),
        base_url: Some(base_url),
        model: "local-model".to_string(),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_run_against_local_endpoint() {
    let reply = r#"{"criticalIssues": [], "optimizations": [], "legacySystemRemnants": [],
        "complianceScore": 91,
        "performanceMetrics": {"qualityScore": 80, "resolutionRate": 66, "averageResponseMinutes": 10,
            "satisfactionIndex": 70, "followUpRate": 33, "engagementScore": 75}}"#;
    let (url, captured) = serve("HTTP/1.1 200 OK", chat_envelope(reply)).await;

    let client = build_inference_client(&provider(url)).unwrap();
    assert_eq!(client.name(), "openai_compatible");
    let aggregator = ReportAggregator::new(
        client,
        Arc::new(MemoryResultSink::new()),
        PipelineConfig::default(),
    );
    let (targets, records) = input(vec![("support-calls", AnalysisLayer::UserExperience, persian_batch())]);
    let report = aggregator.analyze(&targets, &records).await.unwrap();

    let result = &report.target_results[0];
    assert!(result.provenance.is_fully_model());
    assert_eq!(result.compliance_score.value(), 91);
    assert_eq!(result.metrics.resolution_rate, 66);
    assert!(report.degraded_targets.is_empty());

    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("POST /v1/chat/completions"));
    assert!(requests[0].to_ascii_lowercase().contains("authorization: bearer sk-local"));
    assert!(requests[0].contains("\"model\":\"local-model\""));
}

#[tokio::test]
async fn test_rejected_credentials_fall_back() {
    let (url, _) = serve(
        "HTTP/1.1 401 Unauthorized",
        r#"{"error": {"message": "bad key"}}"#.to_string(),
    )
    .await;

    let aggregator = ReportAggregator::new(
        build_inference_client(&provider(url)).unwrap(),
        Arc::new(MemoryResultSink::new()),
        PipelineConfig::default(),
    );
    let (targets, records) = input(vec![("support-calls", AnalysisLayer::UserExperience, persian_batch())]);
    let report = aggregator.analyze(&targets, &records).await.unwrap();

    let result = &report.target_results[0];
    assert_eq!(result.failure.as_ref().map(|f| f.kind), Some(FailureKind::AuthFailure));
    assert_eq!(result.provenance.metrics, Provenance::Fallback);
    assert_eq!(result.metrics.resolution_rate, 33);
    assert_eq!(report.degraded_targets, vec!["support-calls"]);
}
