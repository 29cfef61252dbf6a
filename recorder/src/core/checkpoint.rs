//! Checkpoints for OCR validation of recorded TUI demos.
//!
//! A checkpoint pairs a frame number with text that must, or must not, appear
//! in the OCR output of that frame. Matching is case-insensitive substring
//! containment.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Expected and forbidden text for a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Checkpoint {
    /// Zero-based frame index at the recording frame rate (30fps for VHS).
    pub frame: u32,
    /// Every pattern must be present.
    #[serde(default)]
    pub expected: Vec<String>,
    /// No pattern may be present.
    #[serde(default)]
    pub forbidden: Vec<String>,
}

impl Checkpoint {
    pub fn new(frame: u32, expected: &[&str], forbidden: &[&str]) -> Self {
        Self {
            frame,
            expected: expected.iter().map(|p| p.to_string()).collect(),
            forbidden: forbidden.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Compare OCR text against a checkpoint, returning one error per violation.
pub fn match_text(text: &str, checkpoint: &Checkpoint) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut errors = Vec::new();
    for pattern in &checkpoint.expected {
        if !haystack.contains(&pattern.to_lowercase()) {
            errors.push(format!("Expected pattern not found: '{pattern}'"));
        }
    }
    for pattern in &checkpoint.forbidden {
        if haystack.contains(&pattern.to_lowercase()) {
            errors.push(format!("Forbidden pattern found: '{pattern}'"));
        }
    }
    errors
}

/// Checkpoints that ship with the tool, keyed by demo name.
///
/// Frame numbers are calibrated against the recorded GIFs at 30fps.
pub fn builtin_checkpoints() -> BTreeMap<String, Vec<Checkpoint>> {
    let mut map = BTreeMap::new();
    map.insert(
        "wt-zellij-omnibus".to_string(),
        vec![
            // assistant UI on the first tab
            Checkpoint::new(
                200,
                &["Opus", "acme", "Add a test"],
                &["command not found", "Unknown command"],
            ),
            // closing `wt list --full`
            Checkpoint::new(
                1750,
                &["Branch", "main", "billing"],
                &["CONFLICT", "error:", "failed"],
            ),
        ],
    );
    map
}
