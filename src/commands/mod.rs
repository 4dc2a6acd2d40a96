//! Commands
//!
//! Implementations behind the CLI subcommands.

pub mod analyze;
pub mod config;
