//! Input File Models
//!
//! The batch file consumed by `assay analyze`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use assay_analysis::{AnalysisLayer, AnalysisTarget, RawRecord, TargetKind};
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};

/// `{ "targets": [ ... ] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputFile {
    pub targets: Vec<InputTarget>,
}

/// One target with its records inline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputTarget {
    pub name: String,
    #[serde(default)]
    pub context_description: String,
    pub category: AnalysisLayer,
    #[serde(default)]
    pub kind: TargetKind,
    #[serde(default)]
    pub records: Vec<RawRecord>,
}

impl InputFile {
    /// Read and parse an input file
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::not_found(format!(
                "input file {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            AppError::validation(format!("{} is not a valid input file: {}", path.display(), e))
        })
    }

    /// Split into the target list and the records keyed by target name
    pub fn into_parts(self) -> (Vec<AnalysisTarget>, HashMap<String, Vec<RawRecord>>) {
        let mut targets = Vec::with_capacity(self.targets.len());
        let mut records = HashMap::with_capacity(self.targets.len());
        for input in self.targets {
            targets.push(
                AnalysisTarget::new(input.name.clone(), input.context_description, input.category)
                    .with_kind(input.kind),
            );
            records.insert(input.name, input.records);
        }
        (targets, records)
    }
}
