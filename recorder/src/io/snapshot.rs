//! Command-output snapshots for regression checks.
//!
//! The visible `wt`/`git` commands of a tape run in fish with full shell
//! integration, the same environment the GIF recordings use. The snapshot
//! captures what commands print rather than how the terminal renders it.

use std::ffi::OsString;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, instrument};

use super::env::{DemoEnv, target_debug, write_file};
use super::process::describe;
use super::tape::render_tape;
use super::vhs::resolve_path;
use crate::core::commands::{DEFAULT_PREFIXES, extract_commands};
use crate::core::snapshot::{build_snapshot_script, normalize_output};
use crate::core::tape::Replacements;

/// Visible commands of the tape at `tape`; a missing tape yields none.
pub fn extract_commands_from_tape(
    tape: &Path,
    repo_root: &Path,
    prefixes: &[&str],
) -> Result<Vec<String>> {
    let Some(rendered) = render_tape(tape, &Replacements::new(), repo_root)? else {
        return Ok(Vec::new());
    };
    Ok(extract_commands(&rendered, prefixes))
}

/// `PATH` with the product build and the demo mocks in front.
pub fn snapshot_path_var(env: &DemoEnv, repo_root: &Path) -> Result<OsString> {
    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let mut entries = vec![target_debug(repo_root), env.bin_dir()];
    entries.extend(std::env::split_paths(&inherited));
    std::env::join_paths(entries).context("build PATH for snapshot")
}

/// Run the tape's commands and write their combined output to `output_snap`.
///
/// Each command appears as `$ <cmd>` followed by its output, with a blank
/// line between commands. Demo paths are replaced by `<DEMO_DIR>`.
#[instrument(skip_all, fields(demo = %env.name, tape = %tape.display()))]
pub fn record_snapshot(
    env: &DemoEnv,
    tape: &Path,
    output_snap: &Path,
    repo_root: &Path,
) -> Result<()> {
    let commands = extract_commands_from_tape(tape, repo_root, DEFAULT_PREFIXES)?;
    if commands.is_empty() {
        let name = tape
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| tape.display().to_string());
        bail!("No snapshotable commands found in {name}");
    }
    debug!(count = commands.len(), "snapshot commands");

    // fish `cd`s into the repo before running anything, so every path it
    // sees must be absolute.
    let home = resolve_path(&env.home());
    let script = build_snapshot_script(&commands, &resolve_path(&env.repo()));
    let script_path = env.out_dir.join(".snapshot-script.fish");
    write_file(&script_path, &script)?;

    let mut cmd = Command::new("fish");
    cmd.arg(&script_path)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("HOME", &home)
        .env("PATH", snapshot_path_var(env, repo_root)?)
        .env("TERM", "xterm-256color")
        .env("LANG", "en_US.UTF-8")
        .env("LC_ALL", "en_US.UTF-8")
        .stdin(Stdio::null());
    // Failing commands are part of the snapshot, so the exit status is ignored.
    let output = cmd
        .output()
        .with_context(|| format!("spawn {}", describe(&cmd)))?;
    debug!(exit_code = ?output.status.code(), "snapshot script finished");

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    let normalized = normalize_output(&combined, &env.out_dir, &resolve_path(&env.out_dir));

    write_file(output_snap, &format!("{normalized}\n"))
}

/// Read a committed snapshot, if one exists.
pub fn read_snapshot(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("read snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_visible_commands_from_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let tape = temp.path().join("demo.tape");
        fs::write(
            &tape,
            "Hide\nType \"wt config shell init\"\nEnter\nShow\nType \"wt list\"\nSleep 1s\nEnter\nType \"ls\"\nEnter\n",
        )
        .expect("tape");
        let commands =
            extract_commands_from_tape(&tape, temp.path(), DEFAULT_PREFIXES).expect("extract");
        assert_eq!(commands, vec!["wt list"]);
    }

    #[test]
    fn missing_tape_has_no_commands() {
        let temp = tempfile::tempdir().expect("tempdir");
        let commands =
            extract_commands_from_tape(&temp.path().join("none.tape"), temp.path(), DEFAULT_PREFIXES)
                .expect("extract");
        assert!(commands.is_empty());
    }

    #[test]
    fn tape_without_commands_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("snap", temp.path());
        let tape = temp.path().join("quiet.tape");
        fs::write(&tape, "Show\nType \"echo hi\"\nEnter\n").expect("tape");
        let err = record_snapshot(&env, &tape, &temp.path().join("out.snap"), temp.path())
            .expect_err("no commands");
        assert_eq!(err.to_string(), "No snapshotable commands found in quiet.tape");
    }

    #[test]
    fn path_puts_build_and_mocks_first() {
        let env = DemoEnv::new("snap", "/out");
        let path = snapshot_path_var(&env, Path::new("/repo")).expect("path");
        let entries: Vec<_> = std::env::split_paths(&path).collect();
        assert_eq!(entries[0], Path::new("/repo/target/debug"));
        assert_eq!(entries[1], Path::new("/out/.demo-snap/.local/bin"));
    }

    #[test]
    fn read_snapshot_handles_absent_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("demo.snap");
        assert_eq!(read_snapshot(&path).expect("read"), None);
        fs::write(&path, "$ wt list\n").expect("write");
        assert_eq!(read_snapshot(&path).expect("read").as_deref(), Some("$ wt list\n"));
    }

    /// Stand-in `fish` that reports its environment instead of running the script.
    #[cfg(unix)]
    fn install_fake_fish(repo_root: &Path) {
        crate::io::mocks::write_executable(
            &target_debug(repo_root).join("fish"),
            r#"#!/bin/sh
echo "HOME=$HOME"
echo "XDG_CONFIG_HOME=$XDG_CONFIG_HOME"
echo "TERM=$TERM LANG=$LANG LC_ALL=$LC_ALL"
case "$HOME" in /*) echo "home is absolute" ;; *) echo "home is relative" ;; esac
grep '^cd ' "$1"
echo "warning: from stderr" >&2
"#,
        )
        .expect("fake fish");
    }

    #[cfg(unix)]
    #[test]
    fn records_combined_normalised_output() {
        let temp = tempfile::tempdir().expect("tempdir");
        let repo_root = temp.path().join("product");
        install_fake_fish(&repo_root);
        let env = DemoEnv::new("snap", temp.path().join("out"));
        fs::create_dir_all(env.repo()).expect("repo");
        let tape = temp.path().join("demo.tape");
        fs::write(&tape, "Show\nType \"wt list\"\nEnter\n").expect("tape");
        let snap = temp.path().join("snapshots/demo.snap");

        record_snapshot(&env, &tape, &snap, &repo_root).expect("record");

        assert_eq!(
            fs::read_to_string(&snap).expect("snapshot"),
            "HOME=<DEMO_DIR>/.demo-snap
XDG_CONFIG_HOME=<DEMO_DIR>/.demo-snap/.config
TERM=xterm-256color LANG=en_US.UTF-8 LC_ALL=en_US.UTF-8
home is absolute
cd <DEMO_DIR>/.demo-snap/w/worktrunk
warning: from stderr
"
        );
        assert!(env.out_dir.join(".snapshot-script.fish").exists());
    }

    #[cfg(unix)]
    #[test]
    fn relative_out_dir_still_gives_fish_absolute_paths() {
        let product = tempfile::tempdir().expect("product");
        install_fake_fish(product.path());
        let scratch = tempfile::tempdir_in(".").expect("relative scratch");
        let out_dir = scratch.path().join("out");
        assert!(out_dir.is_relative());
        let env = DemoEnv::new("snap", &out_dir);
        fs::create_dir_all(env.repo()).expect("repo");
        let tape = scratch.path().join("demo.tape");
        fs::write(&tape, "Show\nType \"wt list\"\nEnter\n").expect("tape");
        let snap = scratch.path().join("demo.snap");

        record_snapshot(&env, &tape, &snap, product.path()).expect("record");

        let recorded = fs::read_to_string(&snap).expect("snapshot");
        assert!(recorded.contains("home is absolute\n"), "{recorded}");
        assert!(recorded.contains("HOME=<DEMO_DIR>/.demo-snap\n"), "{recorded}");
        assert!(recorded.contains("cd <DEMO_DIR>/.demo-snap/w/worktrunk\n"), "{recorded}");
    }
}
