//! Command Line Interface
//!
//! Argument definitions for the `assay` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "assay", version, about = "AI-augmented analysis with a deterministic fallback")]
pub struct Cli {
    /// Configuration file (defaults to ~/.assay/config.json when present)
    #[arg(short, long, global = true, env = "ASSAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless ASSAY_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a batch of targets and print the consolidated report
    Analyze(AnalyzeArgs),

    /// Print the effective configuration with secrets redacted
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Input file: {"targets": [{name, contextDescription, category, kind?, records}]}
    #[arg(short, long)]
    pub input: PathBuf,

    /// Directory for per-target result files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Skip the model and use heuristics only
    #[arg(long)]
    pub no_inference: bool,

    /// Override pipeline.maxConcurrency
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Override pipeline.runTimeoutSecs
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
