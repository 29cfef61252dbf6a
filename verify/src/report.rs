//! JSON reports for TUI validation runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ocr::CheckpointOutcome;

/// Result of validating one GIF, persisted with `--report`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub demo: String,
    pub gif: String,
    /// SHA-256 of the GIF, so a report can be matched to the recording.
    pub gif_sha256: Option<String>,
    pub generated_at: String,
    pub passed: bool,
    pub checkpoints: Vec<CheckpointReport>,
    /// Failures that stopped validation before any frame was read.
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckpointReport {
    pub frame: u32,
    pub passed: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Report for a run whose checkpoints were evaluated.
    pub fn from_outcomes(demo: &str, gif: &Path, outcomes: &[CheckpointOutcome]) -> Self {
        let checkpoints: Vec<CheckpointReport> = outcomes
            .iter()
            .map(|outcome| CheckpointReport {
                frame: outcome.frame,
                passed: outcome.passed(),
                errors: outcome.errors.clone(),
            })
            .collect();
        Self {
            demo: demo.to_string(),
            gif: gif.display().to_string(),
            gif_sha256: file_sha256(gif).ok(),
            generated_at: Utc::now().to_rfc3339(),
            passed: checkpoints.iter().all(|checkpoint| checkpoint.passed),
            checkpoints,
            errors: Vec::new(),
        }
    }

    /// Report for a run that failed before reading frames.
    pub fn aborted(demo: &str, gif: &Path, error: String) -> Self {
        Self {
            demo: demo.to_string(),
            gif: gif.display().to_string(),
            gif_sha256: file_sha256(gif).ok(),
            generated_at: Utc::now().to_rfc3339(),
            passed: false,
            checkpoints: Vec::new(),
            errors: vec![error],
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create report dir {}", parent.display()))?;
        }
        let mut json = serde_json::to_string_pretty(self).context("serialize report")?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("write report {}", path.display()))
    }
}

fn file_sha256(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}
