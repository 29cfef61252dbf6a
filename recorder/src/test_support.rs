//! Test-only helpers for provisioning demo environments without a toolchain.

use std::cell::RefCell;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use crate::io::env::{DemoEnv, Toolchain, write_file};

const STUB_LOCKFILE: &str = "# This file is automatically @generated by Cargo.\nversion = 4\n\n[[package]]\nname = \"acme\"\nversion = \"0.1.0\"\n";

/// [`Toolchain`] that records calls instead of compiling.
///
/// `generate_lockfile` writes a fixed `Cargo.lock` so the repo history matches
/// a real build.
#[derive(Debug, Default)]
pub struct StubToolchain {
    calls: RefCell<Vec<&'static str>>,
}

impl StubToolchain {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.borrow().clone()
    }
}

impl Toolchain for StubToolchain {
    fn build_product(&self, _repo_root: &Path) -> Result<()> {
        self.calls.borrow_mut().push("build");
        Ok(())
    }

    fn generate_lockfile(&self, project: &Path) -> Result<()> {
        self.calls.borrow_mut().push("lockfile");
        write_file(&project.join("Cargo.lock"), STUB_LOCKFILE)
    }

    fn install_completions(&self, _repo_root: &Path, home: &Path) -> Result<()> {
        self.calls.borrow_mut().push("completions");
        write_file(
            &home.join(".config/fish/completions/wt.fish"),
            "complete -c wt -f\n",
        )
    }
}

/// A demo environment rooted in a fresh temp dir.
pub struct TestEnv {
    pub temp: TempDir,
    pub env: DemoEnv,
}

impl TestEnv {
    pub fn new(name: &str) -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new(name, temp.path().join("out")).with_repo_name("acme");
        Self { temp, env }
    }

    /// Directory standing in for the product checkout.
    pub fn repo_root(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `relative` under the temp dir and return its path.
    pub fn write(&self, relative: &str, contents: &str) -> std::path::PathBuf {
        let path = self.temp.path().join(relative);
        write_file(&path, contents).expect("write test file");
        path
    }
}
