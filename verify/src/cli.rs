//! CLI command implementations.
//!
//! Each command returns whether validation passed; `main` maps that to an
//! exit code.

use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use recorder::demo::DemoContext;
use recorder::io::env::CargoToolchain;
use recorder::io::manifest::resolve_manifest;
use recorder::io::process::check_dependencies;

use crate::cases::load_checkpoints;
use crate::ocr::{
    FrameReader, describe_outcomes, precheck, run_checkpoints, validate_tui_demo,
    validate_tui_demo_verbose,
};
use crate::report::ValidationReport;
use crate::snapshot::{SnapshotStatus, check_snapshot};

/// List demos that have OCR checkpoints.
pub fn list_checkpoints(checkpoints_dir: &Path) -> Result<()> {
    for (demo, checkpoints) in load_checkpoints(checkpoints_dir)? {
        let frames: Vec<String> = checkpoints.iter().map(|c| c.frame.to_string()).collect();
        println!("{demo}\tframes={}", frames.join(","));
    }
    Ok(())
}

/// Validate a TUI demo GIF against its checkpoints.
///
/// `quiet` prints only failing frames. A report needs per-frame outcomes, so
/// `report_path` always takes the verbose route.
pub fn validate_tui(
    reader: &dyn FrameReader,
    checkpoints_dir: &Path,
    demo: &str,
    gif: &Path,
    quiet: bool,
    report_path: Option<&Path>,
) -> Result<bool> {
    let checkpoints = load_checkpoints(checkpoints_dir)?;
    debug!(demo, gif = %gif.display(), quiet, "validating tui demo");

    let Some(report_path) = report_path else {
        if quiet {
            let errors = validate_tui_demo(reader, demo, gif, &checkpoints)?;
            for error in &errors {
                println!("{error}");
            }
            return Ok(errors.is_empty());
        }
        let (passed, message) = validate_tui_demo_verbose(reader, demo, gif, &checkpoints)?;
        println!("{message}");
        return Ok(passed);
    };

    let (passed, message, report) = match precheck(reader, demo, gif, &checkpoints) {
        Ok(demo_checkpoints) => {
            let outcomes = run_checkpoints(reader, gif, demo_checkpoints)?;
            let (passed, message) = describe_outcomes(demo, gif, &outcomes);
            let report = ValidationReport::from_outcomes(demo, gif, &outcomes);
            (passed, message, report)
        }
        Err(error) => {
            let report = ValidationReport::aborted(demo, gif, error.clone());
            (false, error, report)
        }
    };

    if !quiet || !passed {
        println!("{message}");
    }
    report.write(report_path)?;
    info!(path = %report_path.display(), "report written");
    Ok(passed)
}

/// Re-record a demo's snapshot and diff it against the committed copy.
pub fn validate_snapshot(repo_root: &Path, demos_dir: &Path, demo: &str, update: bool) -> Result<bool> {
    check_dependencies(&["git", "cargo", "fish"])?;
    let loaded = resolve_manifest(demos_dir, demo)?;
    let ctx = DemoContext::new(repo_root);
    let status = check_snapshot(&loaded, &ctx, &CargoToolchain, update)?;

    let name = loaded.name();
    let passed = match (&status, update) {
        (SnapshotStatus::Unchanged, _) => {
            println!("snapshot: {name} unchanged");
            true
        }
        (SnapshotStatus::Missing, true) => {
            println!("snapshot: {name} created");
            true
        }
        (SnapshotStatus::Changed(diff), true) => {
            print!("{diff}");
            println!("snapshot: {name} updated");
            true
        }
        (SnapshotStatus::Missing, false) => {
            println!("snapshot: {name} has no committed snapshot (run with --update)");
            false
        }
        (SnapshotStatus::Changed(diff), false) => {
            print!("{diff}");
            println!("snapshot: {name} changed (run with --update to accept)");
            false
        }
    };
    Ok(passed)
}
