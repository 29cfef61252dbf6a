//! Downloaded and built dependencies, cached under `docs/demos/.deps`.
//!
//! Several demo recordings can run at once, so downloads land in a
//! per-process temp file and only move into place if nobody got there first.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{self as std_process, Command};

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument};

use super::mocks::set_executable;
use super::process;
use crate::core::platform::platform_id;

const CLAUDE_RELEASES: &str = "https://storage.googleapis.com/claude-code-dist-86c565f3-f756-42ad-8dfa-d59b1c096819/claude-code-releases";
const ZELLIJ_PLUGIN_URL: &str =
    "https://github.com/Cynary/zellij-tab-name/releases/download/v0.4.1/zellij-tab-name.wasm";
const VHS_FORK_REPO: &str = "https://github.com/max-sixty/vhs.git";
const VHS_FORK_BRANCH: &str = "keypress-overlay";

/// Cache directory for external dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepsDir {
    dir: PathBuf,
}

impl DepsDir {
    /// The cache inside the product checkout.
    pub fn for_repo(repo_root: &Path) -> Self {
        Self::new(repo_root.join("docs").join("demos").join(".deps"))
    }

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn claude_binary(&self) -> PathBuf {
        self.dir.join("claude")
    }

    pub fn zellij_plugin(&self) -> PathBuf {
        self.dir.join("zellij-tab-name.wasm")
    }

    pub fn vhs_dir(&self) -> PathBuf {
        self.dir.join("vhs")
    }

    pub fn vhs_binary(&self) -> PathBuf {
        self.vhs_dir().join("vhs")
    }

    /// Download the assistant binary for this platform if it is not cached.
    #[instrument(skip_all)]
    pub fn ensure_claude_binary(&self) -> Result<PathBuf> {
        let binary = self.claude_binary();
        if binary.exists() {
            return Ok(binary);
        }

        let plat = detect_platform()?;
        info!(platform = %plat, "Fetching Claude Code");
        let version = fetch_text(&format!("{CLAUDE_RELEASES}/stable"))?
            .trim()
            .to_string();
        info!(version = %version, "Claude Code version");

        download_file(&format!("{CLAUDE_RELEASES}/{version}/{plat}/claude"), &binary)?;
        set_executable(&binary)?;

        verify_version(&binary, "Claude binary downloaded")?;
        info!(version = %version, "Claude Code ready");
        Ok(binary)
    }

    /// Download the Zellij tab-name plugin if it is not cached.
    #[instrument(skip_all)]
    pub fn ensure_zellij_plugin(&self) -> Result<PathBuf> {
        let plugin = self.zellij_plugin();
        if plugin.exists() {
            return Ok(plugin);
        }
        download_file(ZELLIJ_PLUGIN_URL, &plugin)?;
        info!("Zellij plugin ready");
        Ok(plugin)
    }

    /// Clone and build the VHS fork with keystroke overlay support.
    ///
    /// Requires `go` on `PATH`.
    #[instrument(skip_all)]
    pub fn ensure_vhs_binary(&self) -> Result<PathBuf> {
        let vhs_dir = self.vhs_dir();
        let binary = self.vhs_binary();
        if binary.exists() {
            return Ok(binary);
        }

        if which::which("go").is_err() {
            bail!("Go is required to build VHS. Install from https://go.dev/dl/");
        }

        if !vhs_dir.exists() {
            info!("Cloning VHS fork...");
            fs::create_dir_all(&self.dir)
                .with_context(|| format!("create {}", self.dir.display()))?;
            process::run(
                Command::new("git")
                    .args(["clone", "-b", VHS_FORK_BRANCH, "--depth=1", VHS_FORK_REPO])
                    .arg(&vhs_dir),
            )
            .context("Failed to clone VHS fork")?;
        }

        info!("Building VHS...");
        process::run(
            Command::new("go")
                .args(["build", "-o", "vhs", "."])
                .current_dir(&vhs_dir),
        )
        .context("Failed to build VHS")?;

        verify_version(&binary, "VHS built")?;
        info!("VHS ready");
        Ok(binary)
    }
}

/// Detect the platform id used in release download paths.
pub fn detect_platform() -> Result<String> {
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    let musl = os == "linux" && matches!(arch, "x86_64" | "amd64") && is_musl();
    platform_id(os, arch, musl)
}

fn is_musl() -> bool {
    // glibc prints the version to stdout, musl to stderr
    match Command::new("ldd").arg("--version").output() {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
            let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
            stdout.contains("musl") || stderr.contains("musl")
        }
        Err(_) => false,
    }
}

fn fetch_text(url: &str) -> Result<String> {
    debug!(url, "fetching");
    reqwest::blocking::get(url)
        .and_then(|resp| resp.error_for_status())
        .and_then(|resp| resp.text())
        .with_context(|| format!("fetch {url}"))
}

/// Download `url` to `dest` without clobbering a concurrent winner.
pub fn download_file(url: &str, dest: &Path) -> Result<()> {
    info!(file = %file_name(dest), "Downloading");
    install_via_temp(dest, |temp| {
        let mut resp = reqwest::blocking::get(url)
            .and_then(|resp| resp.error_for_status())
            .with_context(|| format!("download {url}"))?;
        let mut file = File::create(temp).with_context(|| format!("create {}", temp.display()))?;
        resp.copy_to(&mut file)
            .with_context(|| format!("write {}", temp.display()))?;
        Ok(())
    })
}

/// Temp path for `dest`: its extension replaced by `<pid>.tmp`.
pub fn temp_path(dest: &Path, pid: u32) -> PathBuf {
    dest.with_extension(format!("{pid}.tmp"))
}

/// Fill a pid-unique temp file with `fill`, then rename it to `dest` only if
/// `dest` does not exist yet. The temp file never outlives the call.
pub fn install_via_temp<F>(dest: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let temp = temp_path(dest, std_process::id());
    let result = fill(&temp).and_then(|()| {
        if !dest.exists() {
            fs::rename(&temp, dest)
                .with_context(|| format!("rename {} to {}", temp.display(), dest.display()))?;
        }
        Ok(())
    });
    match fs::remove_file(&temp) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => debug!(err = %err, temp = %temp.display(), "temp file not removed"),
    }
    result
}

fn verify_version(binary: &Path, what: &str) -> Result<()> {
    let output = Command::new(binary)
        .arg("--version")
        .output()
        .with_context(|| format!("run {} --version", binary.display()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            String::from_utf8_lossy(&output.stdout).into_owned()
        } else {
            stderr.into_owned()
        };
        bail!("{what} but --version failed: {}", detail.trim());
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
