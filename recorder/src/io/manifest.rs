//! Demo manifest parsing and validation.
//!
//! Each demo is a directory holding a `demo.toml` manifest next to its tape.
//! See `demos/` for examples.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use super::fixtures;
use crate::core::size::SizePreset;
use crate::core::theme::THEME_NAMES;

/// File name of a manifest inside a demo directory.
pub const MANIFEST_FILE: &str = "demo.toml";

/// A parsed manifest describing one demo.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DemoManifest {
    pub demo: DemoMeta,
    #[serde(default)]
    pub setup: SetupConfig,
    #[serde(default)]
    pub outputs: Outputs,
}

/// Demo identity, tape and recording parameters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DemoMeta {
    /// Unique identifier (slug format: `[a-z0-9_-]+`).
    pub name: String,
    /// Tape template, relative to the manifest directory.
    pub tape: PathBuf,
    /// Repository directory name inside the work base.
    pub repo_name: Option<String>,
    #[serde(default)]
    pub size: SizePreset,
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,
    /// Output directory, relative to the manifest directory.
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

/// Which repository fixture to provision.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepoKind {
    /// History and build only.
    Base,
    /// Base plus hooks, mocks, branches and worktrees.
    #[default]
    Full,
}

/// Environment provisioning for the demo.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SetupConfig {
    #[serde(default)]
    pub repo: RepoKind,
    /// Project hooks for `.config/wt.toml` (full repo only).
    pub hooks: Option<String>,
    /// Contents of `~/.config/worktrunk/config.toml`.
    pub user_config: Option<String>,
    /// Install mock CLIs into a base repo; full repos always get them.
    #[serde(default)]
    pub mock_clis: bool,
    pub fish: Option<FishSetup>,
    pub zellij: Option<ZellijSetup>,
    pub claude: Option<ClaudeSection>,
    /// Extra files written into the repo after provisioning.
    #[serde(default)]
    pub files: Vec<RepoFile>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FishSetup {
    #[serde(default)]
    pub wsl_create: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ZellijSetup {
    pub default_cwd: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClaudeSection {
    /// Worktree directories to pre-trust, relative to the work base.
    #[serde(default)]
    pub worktrees: Vec<PathBuf>,
    #[serde(default)]
    pub allowed_tools: Vec<String>,
}

/// A file to write into the demo repository.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepoFile {
    /// Destination, relative to the repository root.
    pub path: PathBuf,
    /// Name of an embedded fixture.
    pub fixture: Option<String>,
    /// Literal contents.
    pub contents: Option<String>,
}

impl RepoFile {
    /// The text to write, from the fixture or the literal contents.
    pub fn resolve_contents(&self) -> Result<&str> {
        match (&self.fixture, &self.contents) {
            (Some(name), None) => {
                fixtures::fixture(name).ok_or_else(|| anyhow!("unknown fixture {name}"))
            }
            (None, Some(contents)) => Ok(contents.as_str()),
            _ => bail!(
                "files entry {} needs exactly one of fixture or contents",
                self.path.display()
            ),
        }
    }
}

/// Where recordings and snapshots go.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Outputs {
    /// Committed snapshot, relative to the manifest directory.
    pub snapshot: Option<PathBuf>,
    /// Text capture, relative to the output directory.
    pub text: Option<PathBuf>,
}

fn default_themes() -> Vec<String> {
    THEME_NAMES.iter().map(|name| (*name).to_string()).collect()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("out")
}

/// A manifest together with the directory it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedManifest {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub manifest: DemoManifest,
}

impl LoadedManifest {
    pub fn name(&self) -> &str {
        &self.manifest.demo.name
    }

    pub fn tape_path(&self) -> PathBuf {
        self.dir.join(&self.manifest.demo.tape)
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.join(&self.manifest.demo.out_dir)
    }

    /// GIF destination for `theme`: `<out_dir>/<theme>/<name>.gif`.
    pub fn gif_path(&self, theme: &str) -> PathBuf {
        self.out_dir()
            .join(theme)
            .join(format!("{}.gif", self.name()))
    }

    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.manifest
            .outputs
            .snapshot
            .as_ref()
            .map(|path| self.dir.join(path))
    }

    pub fn text_path(&self) -> Option<PathBuf> {
        self.manifest
            .outputs
            .text
            .as_ref()
            .map(|path| self.out_dir().join(path))
    }
}

impl DemoManifest {
    /// Load and validate a manifest from the given path.
    ///
    /// The manifest path is made absolute so every derived demo path is too.
    pub fn load(path: &Path) -> Result<LoadedManifest> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        let manifest = Self::parse_str(&contents)
            .with_context(|| format!("load manifest {}", path.display()))?;
        let path = std::path::absolute(path)
            .with_context(|| format!("resolve manifest path {}", path.display()))?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Ok(LoadedManifest {
            path,
            dir,
            manifest,
        })
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let manifest: DemoManifest = toml::from_str(contents).context("parse manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.demo.name)?;
        if self.demo.tape.as_os_str().is_empty() {
            bail!("demo.tape must be non-empty");
        }
        if let Some(repo_name) = &self.demo.repo_name
            && (repo_name.trim().is_empty() || repo_name.contains('/'))
        {
            bail!("demo.repo_name must be a non-empty directory name");
        }
        if self.demo.themes.is_empty() {
            bail!("demo.themes must be a non-empty array");
        }
        for theme in &self.demo.themes {
            if !THEME_NAMES.contains(&theme.as_str()) {
                bail!("unknown theme {theme} (expected one of {})", THEME_NAMES.join(", "));
            }
        }
        if self.setup.hooks.is_some() && self.setup.repo == RepoKind::Base {
            bail!("setup.hooks requires setup.repo = \"full\"");
        }
        for (index, file) in self.setup.files.iter().enumerate() {
            if file.path.as_os_str().is_empty() || file.path.is_absolute() {
                bail!("setup.files[{index}].path must be a relative path");
            }
            file.resolve_contents()
                .with_context(|| format!("setup.files[{index}] invalid"))?;
        }
        Ok(())
    }
}

/// Discover and load all manifests in the immediate subdirectories of `dir`.
///
/// Returns manifests sorted by name. Errors if duplicate names are found.
pub fn discover_manifests(dir: &Path) -> Result<Vec<LoadedManifest>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut manifests = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read demos dir {}", dir.display()))? {
        let entry = entry.context("read demo entry")?;
        let path = entry.path().join(MANIFEST_FILE);
        if path.is_file() {
            manifests.push(DemoManifest::load(&path)?);
        }
    }
    manifests.sort_by(|left, right| left.name().cmp(right.name()));
    for pair in manifests.windows(2) {
        if pair[0].name() == pair[1].name() {
            return Err(anyhow!("duplicate demo.name {}", pair[0].name()));
        }
    }
    Ok(manifests)
}

/// Find the manifest for `name` among the demos in `dir`.
pub fn find_manifest(dir: &Path, name: &str) -> Result<LoadedManifest> {
    discover_manifests(dir)?
        .into_iter()
        .find(|manifest| manifest.name() == name)
        .ok_or_else(|| anyhow!("demo {name} not found in {}", dir.display()))
}

/// Accept a manifest path, a demo directory or a demo name under `demos_dir`.
pub fn resolve_manifest(demos_dir: &Path, arg: &str) -> Result<LoadedManifest> {
    let path = Path::new(arg);
    if path.is_file() {
        return DemoManifest::load(path);
    }
    if path.join(MANIFEST_FILE).is_file() {
        return DemoManifest::load(&path.join(MANIFEST_FILE));
    }
    find_manifest(demos_dir, arg)
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        bail!("demo.name must be non-empty");
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
    {
        bail!("demo.name must use [a-z0-9_-] only");
    }
    Ok(())
}
