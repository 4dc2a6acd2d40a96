//! Analyze Command
//!
//! Loads an input batch, runs the aggregator, and writes the consolidated
//! report.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assay_analysis::{ConsolidatedReport, FileResultSink, PipelineConfig, ReportAggregator};
use assay_llm::{build_inference_client, DisabledClient, InferenceClient};
use tracing::info;

use crate::cli::AnalyzeArgs;
use crate::models::input::InputFile;
use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{ensure_dir, results_dir};

/// Pipeline configuration with command-line overrides applied
pub fn effective_pipeline(args: &AnalyzeArgs, config: &AppConfig) -> AppResult<PipelineConfig> {
    let mut pipeline = config.pipeline.clone();
    if let Some(concurrency) = args.concurrency {
        pipeline.max_concurrency = concurrency;
    }
    if let Some(timeout) = args.timeout_secs {
        pipeline.run_timeout_secs = timeout;
    }
    pipeline.validate().map_err(AppError::validation)?;
    Ok(pipeline)
}

/// Directory per-target results are written to
pub fn effective_output_dir(args: &AnalyzeArgs, config: &AppConfig) -> AppResult<PathBuf> {
    match args.output_dir.as_ref().or(config.output_dir.as_ref()) {
        Some(dir) => Ok(dir.clone()),
        None => results_dir(),
    }
}

/// Build the inference client, or a disabled one for heuristic-only runs
pub fn inference_client(
    args: &AnalyzeArgs,
    config: &AppConfig,
) -> AppResult<Arc<dyn InferenceClient>> {
    if args.no_inference {
        return Ok(Arc::new(DisabledClient::new("disabled by --no-inference")));
    }
    Ok(build_inference_client(&config.provider)?)
}

/// Run an analysis as described by `args`.
pub async fn run_analyze(args: &AnalyzeArgs, config: &AppConfig) -> AppResult<ConsolidatedReport> {
    let pipeline = effective_pipeline(args, config)?;
    let output_dir = effective_output_dir(args, config)?;
    let client = inference_client(args, config)?;

    let (targets, records) = InputFile::load(&args.input)?.into_parts();
    info!(
        input = %args.input.display(),
        targets = targets.len(),
        client = client.name(),
        output_dir = %output_dir.display(),
        "starting analysis"
    );

    let sink = Arc::new(FileResultSink::new(output_dir));
    let aggregator = ReportAggregator::new(client, sink, pipeline);
    Ok(aggregator.analyze(&targets, &records).await?)
}

/// Write the report as pretty JSON to `path`, or to stdout when `None`.
pub fn write_report(report: &ConsolidatedReport, path: Option<&Path>) -> AppResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                ensure_dir(parent)?;
            }
            fs::write(path, json)?;
            info!(path = %path.display(), "report written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}
