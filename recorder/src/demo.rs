//! Demo orchestration: provision the environment a manifest describes, then
//! record GIFs, text captures or command snapshots from its tape.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::core::tape::Replacements;
use crate::io::claude::{ClaudeSetup, setup_claude_config};
use crate::io::deps::DepsDir;
use crate::io::env::{
    DemoEnv, Toolchain, prepare_base_repo, prepare_demo_repo, write_repo_files, write_user_config,
};
use crate::io::fish::setup_fish_config;
use crate::io::fixtures::ConfigTemplates;
use crate::io::manifest::{LoadedManifest, RepoKind};
use crate::io::mocks::setup_mock_clis;
use crate::io::snapshot::record_snapshot;
use crate::io::vhs::{
    Vhs, build_tape_replacements, record_all_themes, record_text, setup_demo_output,
};
use crate::io::zellij::setup_zellij_config;

/// Files the recorder leaves in a demo's output directory.
const SCRATCH_FILES: &[&str] = &[
    ".rendered.tape",
    ".text-rendered.tape",
    ".text-output.txt",
    ".snapshot-script.fish",
];

/// Settings shared by every demo in one invocation.
#[derive(Debug, Clone)]
pub struct DemoContext {
    /// Product checkout: `Source` paths, `target/debug` and the deps cache.
    pub repo_root: PathBuf,
    pub deps: DepsDir,
    /// The invoking user's home, exposed to tapes as `REAL_HOME`.
    pub real_home: PathBuf,
    pub api_key: Option<String>,
    /// VHS override; the keypress-overlay fork is built when unset.
    pub vhs: Option<Vhs>,
}

impl DemoContext {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        Self {
            deps: DepsDir::for_repo(&repo_root),
            real_home: dirs::home_dir().unwrap_or_default(),
            api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            vhs: None,
            repo_root,
        }
    }

    pub fn with_vhs(mut self, vhs: Vhs) -> Self {
        self.vhs = Some(vhs);
        self
    }

    fn vhs(&self) -> Result<Vhs> {
        match &self.vhs {
            Some(vhs) => Ok(vhs.clone()),
            None => Ok(Vhs::new(self.deps.ensure_vhs_binary()?)),
        }
    }
}

/// The demo environment a manifest describes, without touching disk.
pub fn demo_env(loaded: &LoadedManifest) -> DemoEnv {
    let env = DemoEnv::new(loaded.name(), loaded.out_dir());
    match &loaded.manifest.demo.repo_name {
        Some(repo_name) => env.with_repo_name(repo_name),
        None => env,
    }
}

/// Provision the repo, home directory and tool configs for a demo.
#[instrument(skip_all, fields(demo = %loaded.name()))]
pub fn prepare(
    loaded: &LoadedManifest,
    ctx: &DemoContext,
    toolchain: &dyn Toolchain,
) -> Result<DemoEnv> {
    let env = demo_env(loaded);
    let setup = &loaded.manifest.setup;

    setup_demo_output(&env.out_dir)?;
    match setup.repo {
        RepoKind::Base => {
            prepare_base_repo(&env, &ctx.repo_root, toolchain)?;
            if setup.mock_clis {
                setup_mock_clis(&env)?;
            }
        }
        RepoKind::Full => {
            prepare_demo_repo(&env, &ctx.repo_root, setup.hooks.as_deref(), toolchain)?;
        }
    }

    if let Some(config) = &setup.user_config {
        write_user_config(&env, config)?;
    }
    let written = write_repo_files(&env, &setup.files)?;
    debug!(files = written.len(), "extra repo files written");

    let templates = ConfigTemplates::new()?;
    if let Some(fish) = &setup.fish {
        setup_fish_config(&env, &templates, fish.wsl_create)?;
    }
    if let Some(zellij) = &setup.zellij {
        let plugin = ctx.deps.ensure_zellij_plugin()?;
        setup_zellij_config(&env, &templates, zellij.default_cwd.as_deref(), &plugin)?;
    }
    if let Some(claude) = &setup.claude {
        let binary = ctx.deps.ensure_claude_binary()?;
        let worktrees: Vec<PathBuf> = claude
            .worktrees
            .iter()
            .map(|path| env.work_base().join(path))
            .collect();
        let options = ClaudeSetup {
            worktree_paths: &worktrees,
            allowed_tools: &claude.allowed_tools,
            api_key: ctx.api_key.as_deref(),
        };
        setup_claude_config(&env, &options, &binary)?;
    }

    info!(repo = %env.repo().display(), "demo environment ready");
    Ok(env)
}

/// Record one GIF per configured theme; returns the GIFs written.
#[instrument(skip_all, fields(demo = %loaded.name()))]
pub fn record_gifs(loaded: &LoadedManifest, env: &DemoEnv, ctx: &DemoContext) -> Result<Vec<PathBuf>> {
    let vhs = ctx.vhs()?;
    let outputs: Vec<(String, PathBuf)> = loaded
        .manifest
        .demo
        .themes
        .iter()
        .map(|theme| (theme.clone(), loaded.gif_path(theme)))
        .collect();
    for (_, gif) in &outputs {
        if let Some(parent) = gif.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let base = base_replacements(env, ctx);
    record_all_themes(
        env,
        &loaded.tape_path(),
        &outputs,
        &base,
        &ctx.repo_root,
        &vhs,
        loaded.manifest.demo.size.size(),
    )
}

/// Record the text capture named in `[outputs]`, if any.
#[instrument(skip_all, fields(demo = %loaded.name()))]
pub fn record_text_output(
    loaded: &LoadedManifest,
    env: &DemoEnv,
    ctx: &DemoContext,
) -> Result<Option<PathBuf>> {
    let Some(dest) = loaded.text_path() else {
        debug!("no text output configured");
        return Ok(None);
    };
    let vhs = ctx.vhs()?;
    record_text(
        env,
        &loaded.tape_path(),
        &dest,
        &base_replacements(env, ctx),
        &ctx.repo_root,
        &vhs,
    )?;
    info!(output = %dest.display(), "text output saved");
    Ok(Some(dest))
}

/// Record the command snapshot into `dest`, or the manifest's snapshot path.
#[instrument(skip_all, fields(demo = %loaded.name()))]
pub fn record_snapshot_output(
    loaded: &LoadedManifest,
    env: &DemoEnv,
    ctx: &DemoContext,
    dest: Option<&Path>,
) -> Result<Option<PathBuf>> {
    let Some(dest) = dest.map(Path::to_path_buf).or_else(|| loaded.snapshot_path()) else {
        debug!("no snapshot output configured");
        return Ok(None);
    };
    record_snapshot(env, &loaded.tape_path(), &dest, &ctx.repo_root)?;
    info!(output = %dest.display(), "snapshot saved");
    Ok(Some(dest))
}

/// Remove the demo environment and recorder scratch files.
///
/// Recorded GIFs and text captures are kept.
pub fn clean(loaded: &LoadedManifest) -> Result<()> {
    let env = demo_env(loaded);
    let root = env.root();
    if root.exists() {
        fs::remove_dir_all(&root).with_context(|| format!("remove {}", root.display()))?;
    }
    for name in SCRATCH_FILES {
        let path = env.out_dir.join(name);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
        }
    }
    Ok(())
}

/// Tape variables shared by every recording of this demo.
pub fn base_replacements(env: &DemoEnv, ctx: &DemoContext) -> Replacements {
    build_tape_replacements(
        env,
        &ctx.repo_root,
        &ctx.real_home,
        ctx.api_key.as_deref().unwrap_or_default(),
    )
}
