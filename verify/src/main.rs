//! Validation of recorded `wt` demos.
//!
//! `tui` reads key frames of a GIF back with OCR; `snapshot` re-records a
//! command snapshot and diffs it against the committed copy.

mod cases;
mod cli;
mod ocr;
mod report;
mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use recorder::{exit_codes, logging};

use crate::ocr::OcrTools;

#[derive(Parser)]
#[command(name = "verify", version, about = "Validate recorded demos")]
struct Cli {
    /// Product checkout the demos were recorded against.
    #[arg(long, global = true, default_value = ".")]
    repo_root: PathBuf,
    /// Directory of demo subdirectories (default: `<repo-root>/demos`).
    #[arg(long, global = true)]
    demos_dir: Option<PathBuf>,
    /// Checkpoint files layered over the built-in set
    /// (default: `<demos-dir>/checkpoints`).
    #[arg(long, global = true)]
    checkpoints_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List demos with OCR checkpoints.
    List,
    /// Check a TUI demo GIF against its OCR checkpoints.
    Tui {
        demo: String,
        gif: PathBuf,
        /// Print failing frames only.
        #[arg(long, short)]
        quiet: bool,
        /// Write a JSON report here.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Re-record a demo's command snapshot and diff it.
    Snapshot {
        /// Demo name, demo directory or manifest path.
        demo: String,
        /// Overwrite the committed snapshot with the fresh recording.
        #[arg(long)]
        update: bool,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(exit_codes::VALIDATION_FAILED),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    let repo_root = cli
        .repo_root
        .canonicalize()
        .with_context(|| format!("resolve repo root {}", cli.repo_root.display()))?;
    let demos_dir = cli.demos_dir.unwrap_or_else(|| repo_root.join("demos"));
    let checkpoints_dir = cli
        .checkpoints_dir
        .unwrap_or_else(|| demos_dir.join("checkpoints"));

    match cli.command {
        Command::List => cli::list_checkpoints(&checkpoints_dir).map(|()| true),
        Command::Tui {
            demo,
            gif,
            quiet,
            report,
        } => cli::validate_tui(
            &OcrTools::default(),
            &checkpoints_dir,
            &demo,
            &gif,
            quiet,
            report.as_deref(),
        ),
        Command::Snapshot { demo, update } => {
            cli::validate_snapshot(&repo_root, &demos_dir, &demo, update)
        }
    }
}
