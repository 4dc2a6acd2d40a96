//! Analysis Errors
//!
//! Failures local to the analysis pipeline. Neither ever aborts a run: parse
//! failures route a target to the fallback engine, target failures become
//! placeholder results.

use thiserror::Error;

/// The model's reply could not be turned into a JSON object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Parse failure: {message}")]
pub struct ParseFailure {
    pub message: String,
}

impl ParseFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The analysis task of one target did not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Analysis of '{target}' did not complete: {message}")]
pub struct TargetFailure {
    pub target: String,
    pub message: String,
}

impl TargetFailure {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}
