//! Result Sink
//!
//! Destination for finalized per-target results. The aggregator writes every
//! result through this port; a failed write is logged and never fails a run.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use assay_core::{CoreError, CoreResult};

use crate::models::PerTargetResult;

/// Stem used when a target name has no usable characters
const FALLBACK_STEM: &str = "target";

/// Persists finalized per-target results.
///
/// `persist` may block; the aggregator calls it on the blocking thread pool.
/// Target names never share a file stem; `validate_input` rejects collisions.
pub trait ResultSink: Send + Sync {
    fn persist(&self, result: &PerTargetResult) -> CoreResult<()>;
}

/// Writes each result as pretty JSON to `<dir>/<sanitized-name>.json`.
#[derive(Debug, Clone)]
pub struct FileResultSink {
    dir: PathBuf,
}

impl FileResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path the result for `target_name` is written to
    pub fn path_for(&self, target_name: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", sanitize_file_stem(target_name)))
    }
}

impl ResultSink for FileResultSink {
    fn persist(&self, result: &PerTargetResult) -> CoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&result.target.name);
        let json = serde_json::to_string_pretty(result)?;
        fs::write(&path, json)?;
        Ok(())
    }
}

/// Keeps results in memory, in write order.
#[derive(Debug, Default)]
pub struct MemoryResultSink {
    results: Mutex<Vec<PerTargetResult>>,
}

impl MemoryResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything persisted so far
    pub fn results(&self) -> Vec<PerTargetResult> {
        self.results
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl ResultSink for MemoryResultSink {
    fn persist(&self, result: &PerTargetResult) -> CoreResult<()> {
        let mut results = self
            .results
            .lock()
            .map_err(|e| CoreError::internal(format!("result sink lock poisoned: {}", e)))?;
        results.push(result.clone());
        Ok(())
    }
}

/// File stem for a target name: letters and digits kept (any script),
/// everything else collapsed into single dashes.
pub fn sanitize_file_stem(name: &str) -> String {
    let mut stem = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            stem.push(ch);
        } else if !stem.ends_with('-') {
            stem.push('-');
        }
    }
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::finalize;
    use crate::models::{AnalysisLayer, AnalysisTarget, RawRecord};
    use tempfile::TempDir;

    fn result(name: &str) -> PerTargetResult {
        let target = AnalysisTarget::new(name, "ctx", AnalysisLayer::Security);
        finalize(&target, &[RawRecord::interaction("ok", 1.0)], None, None, vec![])
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("billing/invoices v2"), "billing-invoices-v2");
        assert_eq!(sanitize_file_stem("../../etc/passwd"), "etc-passwd");
        assert_eq!(sanitize_file_stem("تماس مشتری"), "تماس-مشتری");
        assert_eq!(sanitize_file_stem("snake_case"), "snake_case");
        assert_eq!(sanitize_file_stem("///"), "target");
    }

    #[test]
    fn test_file_sink_writes_pretty_json() {
        let dir = TempDir::new().unwrap();
        let sink = FileResultSink::new(dir.path().join("results"));
        sink.persist(&result("crm calls")).unwrap();

        let path = dir.path().join("results").join("crm-calls.json");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'));
        let back: PerTargetResult = serde_json::from_str(&content).unwrap();
        assert_eq!(back.target.name, "crm calls");
    }

    #[test]
    fn test_file_sink_reports_io_errors() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "not a directory").unwrap();
        let sink = FileResultSink::new(&blocker);
        assert!(matches!(sink.persist(&result("x")), Err(CoreError::Io(_))));
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryResultSink::new();
        sink.persist(&result("a")).unwrap();
        sink.persist(&result("b")).unwrap();
        let names: Vec<String> = sink.results().into_iter().map(|r| r.target.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
