//! Git adapter for provisioning demo repositories.
//!
//! Demo history must look lived-in, so commits are backdated with
//! `GIT_AUTHOR_DATE`/`GIT_COMMITTER_DATE` and the product's own commit hook is
//! silenced with `SKIP_DEMO_HOOK`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use anyhow::Result;
use chrono::Local;
use tracing::{debug, instrument};

use super::process;
use crate::core::dates::commit_timestamp;

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// `git init -q` in the working directory.
    pub fn init(&self) -> Result<()> {
        self.run_checked(&["init", "-q"])?;
        Ok(())
    }

    pub fn config(&self, key: &str, value: &str) -> Result<()> {
        self.run_checked(&["config", key, value])?;
        Ok(())
    }

    pub fn add(&self, paths: &[&str]) -> Result<()> {
        let mut args = vec!["add"];
        args.extend_from_slice(paths);
        self.run_checked(&args)?;
        Ok(())
    }

    /// Commit staged changes dated `offset` (e.g. `7d`, `2H`) in the past.
    #[instrument(skip_all, fields(offset))]
    pub fn commit_dated(
        &self,
        message: &str,
        offset: &str,
        extra_env: &BTreeMap<String, String>,
    ) -> Result<()> {
        let date = commit_timestamp(Local::now().naive_local(), offset)?;
        debug!(message, date = %date, "dated commit");
        let mut cmd = self.command(&["commit", "-qm", message]);
        cmd.env("GIT_AUTHOR_DATE", &date)
            .env("GIT_COMMITTER_DATE", &date)
            .env("SKIP_DEMO_HOOK", "1");
        for (key, value) in extra_env {
            cmd.env(key, value);
        }
        process::run(&mut cmd)?;
        Ok(())
    }

    pub fn branch(&self, name: &str) -> Result<()> {
        self.run_checked(&["branch", name])?;
        Ok(())
    }

    pub fn rename_branch(&self, name: &str) -> Result<()> {
        self.run_checked(&["branch", "-m", name])?;
        Ok(())
    }

    pub fn checkout(&self, branch: &str) -> Result<()> {
        self.run_checked(&["checkout", "-q", branch])?;
        Ok(())
    }

    /// Create `branch` from `start` and check it out.
    pub fn checkout_new(&self, branch: &str, start: &str) -> Result<()> {
        self.run_checked(&["checkout", "-q", "-b", branch, start])?;
        Ok(())
    }

    pub fn add_remote(&self, name: &str, url: &Path) -> Result<()> {
        let url = url.display().to_string();
        self.run_checked(&["remote", "add", name, &url])?;
        Ok(())
    }

    /// Push the current branch to its upstream.
    pub fn push(&self) -> Result<()> {
        self.run_checked(&["push", "-q"])?;
        Ok(())
    }

    /// Push `branch` to `origin` and set it as upstream.
    pub fn push_upstream(&self, branch: &str) -> Result<()> {
        self.run_checked(&["push", "-u", "origin", branch, "-q"])?;
        Ok(())
    }

    pub fn worktree_add(&self, path: &Path, branch: &str) -> Result<()> {
        let path = path.display().to_string();
        self.run_checked(&["worktree", "add", "-q", &path, branch])?;
        Ok(())
    }

    /// Return stdout of an arbitrary git command.
    pub fn capture(&self, args: &[&str]) -> Result<String> {
        let output = self.run_checked(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn run_checked(&self, args: &[&str]) -> Result<Output> {
        process::run(&mut self.command(args))
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(&self.workdir).args(args);
        cmd
    }
}

/// `git init --bare -q <path>`.
pub fn init_bare(path: &Path) -> Result<()> {
    process::run(
        Command::new("git")
            .args(["init", "--bare", "-q"])
            .arg(path),
    )?;
    Ok(())
}
