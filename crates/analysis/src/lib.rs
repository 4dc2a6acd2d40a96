//! Assay Analysis
//!
//! The analysis pipeline: per-target assessment through an external model,
//! with a deterministic heuristic engine that fills in whatever the model
//! does not deliver, and aggregation of many targets into one report.
//!
//! - `summarizer` - Bounded digest of a record batch
//! - `prompt` - Request text with an explicit output schema
//! - `parser` - Tolerant JSON extraction and per-field validation
//! - `heuristics` - Pure fallback computation of the full result schema
//! - `analyzer` - Per-target state machine (Built, Requested, Parsed/Failed, Finalized)
//! - `aggregator` - Bounded fan-out, failure isolation, consolidation
//! - `sink` - Persistence port for finalized results

pub mod aggregator;
pub mod analyzer;
pub mod config;
pub mod error;
pub mod heuristics;
pub mod models;
pub mod parser;
pub mod prompt;
pub mod sink;
pub mod summarizer;

#[cfg(test)]
mod testing;

// Re-export model types
pub use models::{
    ActionItem, ActionPriority, AnalysisLayer, AnalysisStage, AnalysisTarget, CleanupItem,
    ComplianceScore, ComplianceScores, ConsolidatedReport, CriticalFindingEntry, Direction,
    Effort, FailureKind, FieldGroup, FieldProvenance, InteractionMetrics, LegacyRemnant,
    OptimizationSuggestion, PerTargetResult, Provenance, RawRecord, RemnantStatus, Severity,
    StageFailure, StructuredFinding, TargetKind,
};

// Re-export pipeline entry points
pub use aggregator::{consolidate, validate_input, ReportAggregator};
pub use analyzer::TargetAnalyzer;
pub use config::{PipelineConfig, RequestConfig, SummaryConfig};
pub use error::{ParseFailure, TargetFailure};
pub use heuristics::{assess, HeuristicAssessment};
pub use parser::{parse_model_response, ModelAssessment};
pub use prompt::PromptBuilder;
pub use sink::{FileResultSink, MemoryResultSink, ResultSink};
pub use summarizer::summarize_records;
