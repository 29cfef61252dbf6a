//! Text-diff validation of command snapshots.
//!
//! A demo's snapshot is re-recorded into a scratch file and compared line by
//! line with the committed copy.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, instrument};

use recorder::core::snapshot::{diff_lines, has_changes, render_diff};
use recorder::demo::{self, DemoContext};
use recorder::io::env::Toolchain;
use recorder::io::manifest::LoadedManifest;
use recorder::io::snapshot::read_snapshot;

/// How a fresh recording compares with the committed snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotStatus {
    Unchanged,
    /// No committed snapshot exists yet.
    Missing,
    /// Rendered `-`/`+` diff from committed to fresh.
    Changed(String),
}

impl SnapshotStatus {
    pub fn passed(&self) -> bool {
        matches!(self, SnapshotStatus::Unchanged)
    }
}

/// Compare a fresh recording with the committed snapshot, if any.
pub fn compare_snapshot(committed: Option<&str>, fresh: &str) -> SnapshotStatus {
    let Some(committed) = committed else {
        return SnapshotStatus::Missing;
    };
    if committed == fresh {
        return SnapshotStatus::Unchanged;
    }
    let diff = diff_lines(committed, fresh);
    if has_changes(&diff) {
        SnapshotStatus::Changed(render_diff(&diff))
    } else {
        // same lines, different line endings or trailing newlines
        SnapshotStatus::Changed(format!("{}~ line endings differ\n", render_diff(&diff)))
    }
}

/// Re-record a demo's snapshot and compare it with the committed file.
///
/// With `update`, a missing or changed snapshot is overwritten and the
/// status describes what was replaced.
#[instrument(skip_all, fields(demo = %loaded.name(), update))]
pub fn check_snapshot(
    loaded: &LoadedManifest,
    ctx: &DemoContext,
    toolchain: &dyn Toolchain,
    update: bool,
) -> Result<SnapshotStatus> {
    let committed_path = loaded
        .snapshot_path()
        .ok_or_else(|| anyhow!("demo {} has no snapshot output", loaded.name()))?;

    let env = demo::prepare(loaded, ctx, toolchain)?;
    let scratch = tempfile::Builder::new()
        .prefix("wt-snapshot-")
        .tempdir()
        .context("create snapshot scratch dir")?;
    let fresh_path = scratch.path().join(format!("{}.snap", loaded.name()));
    demo::record_snapshot_output(loaded, &env, ctx, Some(fresh_path.as_path()))?;

    let fresh = fs::read_to_string(&fresh_path)
        .with_context(|| format!("read {}", fresh_path.display()))?;
    let committed = read_snapshot(&committed_path)?;
    let status = compare_snapshot(committed.as_deref(), &fresh);

    if update && !status.passed() {
        write_snapshot(&committed_path, &fresh)?;
        info!(path = %committed_path.display(), "snapshot updated");
    }
    Ok(status)
}

fn write_snapshot(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write snapshot {}", path.display()))
}
