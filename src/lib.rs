//! Assay
//!
//! Application layer of the analysis pipeline: configuration file handling,
//! logging setup, the input file format, and the CLI commands. The pipeline
//! itself lives in `assay-analysis`; inference in `assay-llm`.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod models;
pub mod storage;
pub mod utils;

pub use models::input::{InputFile, InputTarget};
pub use models::settings::AppConfig;
pub use storage::config::ConfigService;
pub use utils::error::{AppError, AppResult};
