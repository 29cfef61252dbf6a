//! Isolated demo environments: a throwaway home directory holding a git
//! repository with realistic history, branches and worktrees.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use super::fixtures;
use super::git::{Git, init_bare};
use super::manifest::RepoFile;
use super::mocks;
use super::process;

/// Default repository directory name inside the work base.
pub const DEFAULT_REPO_NAME: &str = "worktrunk";

/// Default project hooks written by [`prepare_demo_repo`].
pub const DEFAULT_HOOKS: &str = "[pre-merge]\ntest = \"cargo nextest run\"\n";

/// Isolated demo environment with its own repo and home directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoEnv {
    pub name: String,
    pub out_dir: PathBuf,
    pub repo_name: String,
}

impl DemoEnv {
    pub fn new(name: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            out_dir: out_dir.into(),
            repo_name: DEFAULT_REPO_NAME.to_string(),
        }
    }

    pub fn with_repo_name(mut self, repo_name: impl Into<String>) -> Self {
        self.repo_name = repo_name.into();
        self
    }

    pub fn root(&self) -> PathBuf {
        self.out_dir.join(format!(".demo-{}", self.name))
    }

    /// The fake `$HOME`; shares the root so demo paths stay short on screen.
    pub fn home(&self) -> PathBuf {
        self.root()
    }

    pub fn work_base(&self) -> PathBuf {
        self.home().join("w")
    }

    pub fn repo(&self) -> PathBuf {
        self.work_base().join(&self.repo_name)
    }

    pub fn bare_remote(&self) -> PathBuf {
        self.root().join("remote.git")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.home().join(".local").join("bin")
    }

    pub fn config_dir(&self) -> PathBuf {
        self.home().join(".config")
    }

    /// Path of the worktree for `branch`, next to the main checkout.
    pub fn worktree(&self, branch: &str) -> PathBuf {
        self.work_base().join(format!("acme.{branch}"))
    }
}

/// Build steps that need the real Rust toolchain.
///
/// Split out so provisioning can be exercised without compiling anything.
pub trait Toolchain {
    /// Build the product binary (`wt`) in the product checkout.
    fn build_product(&self, repo_root: &Path) -> Result<()>;
    /// Produce `Cargo.lock` for the demo project.
    fn generate_lockfile(&self, project: &Path) -> Result<()>;
    /// Install fish completions into the demo home.
    fn install_completions(&self, repo_root: &Path, home: &Path) -> Result<()>;
}

/// [`Toolchain`] backed by `cargo` and the freshly built `wt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoToolchain;

impl Toolchain for CargoToolchain {
    fn build_product(&self, repo_root: &Path) -> Result<()> {
        info!("Building wt binary...");
        process::run(
            Command::new("cargo")
                .args(["build", "--quiet"])
                .current_dir(repo_root),
        )?;
        Ok(())
    }

    fn generate_lockfile(&self, project: &Path) -> Result<()> {
        process::run(
            Command::new("cargo")
                .args(["build", "--release", "-q"])
                .current_dir(project),
        )?;
        Ok(())
    }

    fn install_completions(&self, repo_root: &Path, home: &Path) -> Result<()> {
        let wt = product_binary(repo_root);
        process::run(
            Command::new(&wt)
                .args(["config", "shell", "install", "fish", "--yes"])
                .env("HOME", home),
        )?;
        Ok(())
    }
}

/// `target/debug` of the product checkout.
pub fn target_debug(repo_root: &Path) -> PathBuf {
    repo_root.join("target").join("debug")
}

/// Path of the debug `wt` binary.
pub fn product_binary(repo_root: &Path) -> PathBuf {
    let binary = format!("wt{}", std::env::consts::EXE_SUFFIX);
    target_debug(repo_root).join(binary)
}

/// Set up the base demo repository with a small Rust project.
///
/// Creates the repo with backdated history pushed to a local bare remote, the
/// `cat` wrapper, the built product with fish completions, and empty user and
/// project config directories. Demos add hooks, branches and mocks on top.
#[instrument(skip_all, fields(demo = %env.name))]
pub fn prepare_base_repo(env: &DemoEnv, repo_root: &Path, toolchain: &dyn Toolchain) -> Result<()> {
    // Stale processes can hold files open; whatever survives is overwritten.
    if let Err(err) = fs::remove_dir_all(env.root()) {
        debug!(err = %err, "previous demo root not removed");
    }
    let repo = env.repo();
    fs::create_dir_all(&repo).with_context(|| format!("create {}", repo.display()))?;

    init_bare(&env.bare_remote())?;

    let git = Git::new(&repo);
    git.init()?;
    git.config("user.name", "Worktrunk Demo")?;
    git.config("user.email", "demo@example.com")?;
    git.config("commit.gpgsign", "false")?;
    // Hints are stored in git config; mark them shown so they stay off screen.
    git.config("worktrunk.hints.worktree-path", "true")?;

    let no_env = BTreeMap::new();
    write_file(&repo.join("README.md"), "# Acme App\n\nA demo application.\n")?;
    git.add(&["README.md"])?;
    git.commit_dated("Initial commit", "7d", &no_env)?;
    git.rename_branch("main")?;
    // A local bare remote; network remotes make VHS hang on SSH prompts.
    git.add_remote("origin", &env.bare_remote())?;
    git.push_upstream("main")?;

    write_file(
        &repo.join("Cargo.toml"),
        "[package]\nname = \"acme\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[workspace]\n",
    )?;
    write_file(&repo.join("src").join("lib.rs"), fixtures::LIB_RS)?;
    write_file(&repo.join(".gitignore"), "/target\n")?;
    git.add(&[".gitignore", "Cargo.toml", "src/"])?;
    git.commit_dated("Add Rust project with tests", "6d", &no_env)?;

    if let Err(err) = toolchain.generate_lockfile(&repo) {
        warn!(err = %format!("{err:#}"), "demo project build failed");
    }
    if repo.join("Cargo.lock").exists() {
        git.add(&["Cargo.lock"])?;
        git.commit_dated("Add Cargo.lock", "6d", &no_env)?;
    }
    git.push()?;

    mocks::install_bat_wrapper(env)?;

    toolchain.build_product(repo_root)?;
    toolchain.install_completions(repo_root, &env.home())?;

    let user_config = env.config_dir().join("worktrunk");
    fs::create_dir_all(&user_config)
        .with_context(|| format!("create {}", user_config.display()))?;
    let project_config = repo.join(".config");
    fs::create_dir_all(&project_config)
        .with_context(|| format!("create {}", project_config.display()))?;

    debug!(repo = %repo.display(), "base repo ready");
    Ok(())
}

/// Set up a full demo repository with varied branches for rich `wt list` output.
///
/// On top of the base repo: all mock CLIs, project hooks (`hooks` or
/// [`DEFAULT_HOOKS`]), the `gh` mock, branches without worktrees
/// (`docs/readme`, `spike/search`) and three worktrees:
/// - `alpha`: large diff, unpushed commit, ahead of main
/// - `beta`: staged changes, behind main
/// - `hooks`: no upstream, staged and unstaged changes
#[instrument(skip_all, fields(demo = %env.name))]
pub fn prepare_demo_repo(
    env: &DemoEnv,
    repo_root: &Path,
    hooks: Option<&str>,
    toolchain: &dyn Toolchain,
) -> Result<()> {
    prepare_base_repo(env, repo_root, toolchain)?;
    mocks::setup_mock_clis(env)?;

    let repo = env.repo();
    let git = Git::new(&repo);
    let no_env = BTreeMap::new();

    write_file(
        &repo.join(".config").join("wt.toml"),
        hooks.unwrap_or(DEFAULT_HOOKS),
    )?;
    write_file(
        &repo.join(".claude").join("CLAUDE.md"),
        "# Acme App\n\nRust project. Run `cargo test` for tests.\n",
    )?;
    git.add(&[".config/wt.toml", ".claude/CLAUDE.md"])?;
    git.commit_dated("Add project hooks", "5d", &no_env)?;
    git.push()?;

    mocks::install_gh_mock(env)?;

    git.branch("docs/readme")?;
    git.branch("spike/search")?;

    // beta branches off before the next main commit, so it ends up behind
    create_branch_beta(env, &git)?;

    append_file(
        &repo.join("README.md"),
        "\n## Development\n\nSee CONTRIBUTING.md for guidelines.\n",
    )?;
    write_file(&repo.join("notes.md"), "# Notes\n")?;
    git.add(&["README.md", "notes.md"])?;
    git.commit_dated("docs: add development section", "1d", &no_env)?;
    git.push()?;

    // alpha and hooks start from the new main: ahead only, not diverged
    create_branch_alpha(env, &git)?;
    create_branch_hooks(env, &git)?;

    info!(repo = %repo.display(), "demo repo ready");
    Ok(())
}

fn create_branch_alpha(env: &DemoEnv, git: &Git) -> Result<()> {
    let branch = "alpha";
    let repo = env.repo();
    let path = env.worktree(branch);
    let no_env = BTreeMap::new();

    git.checkout_new(branch, "main")?;

    write_file(
        &repo.join("README.md"),
        "# Acme App

A demo application for showcasing worktrunk features.

## Features

- Fast worktree switching
- Integrated merge workflow
- Pre-merge test hooks
- LLM commit messages

## Getting Started

Run `wt list` to see all worktrees.
",
    )?;
    git.add(&["README.md"])?;
    git.commit_dated("docs: expand README", "3d", &no_env)?;

    append_file(&repo.join("README.md"), "\n## Contributing\n\nPRs welcome!\n")?;
    git.add(&["README.md"])?;
    git.commit_dated("docs: add contributing section", "3d", &no_env)?;

    append_file(&repo.join("README.md"), "\n## License\n\nMIT\n")?;
    git.add(&["README.md"])?;
    git.commit_dated("docs: add license", "3d", &no_env)?;

    write_file(&repo.join("src").join("utils.rs"), fixtures::ALPHA_UTILS_RS)?;
    let lib_rs = repo.join("src").join("lib.rs");
    let lib = read_file(&lib_rs)?;
    write_file(&lib_rs, &format!("pub mod utils;\n\n{lib}"))?;
    git.add(&["src/utils.rs", "src/lib.rs"])?;
    git.commit_dated("feat: add utility functions module", "3d", &no_env)?;

    git.push_upstream(branch)?;
    git.checkout("main")?;
    git.worktree_add(&path, branch)?;

    let worktree = Git::new(&path);
    append_file(&path.join("README.md"), "## FAQ\n\n")?;
    worktree.add(&["README.md"])?;
    worktree.commit_dated("docs: add FAQ section", "3d", &no_env)?;

    // uncommitted: large README diff plus an untracked file
    write_file(&path.join("README.md"), fixtures::ALPHA_README_MD)?;
    write_file(&path.join("scratch.rs"), "// scratch\n")?;
    Ok(())
}

fn create_branch_beta(env: &DemoEnv, git: &Git) -> Result<()> {
    let branch = "beta";
    let path = env.worktree(branch);

    git.checkout_new(branch, "main")?;
    git.push_upstream(branch)?;
    git.checkout("main")?;
    git.worktree_add(&path, branch)?;

    write_file(&path.join("notes.txt"), "# TODO\n- Add caching\n")?;
    Git::new(&path).add(&["notes.txt"])?;
    Ok(())
}

fn create_branch_hooks(env: &DemoEnv, git: &Git) -> Result<()> {
    let branch = "hooks";
    let repo = env.repo();
    let path = env.worktree(branch);

    git.checkout_new(branch, "main")?;
    write_file(&repo.join("src").join("lib.rs"), fixtures::LIB_HOOKS_RS)?;
    git.add(&["src/lib.rs"])?;
    git.commit_dated(
        "feat: add math operations, consolidate tests",
        "2H",
        &BTreeMap::new(),
    )?;

    // never pushed, so no upstream
    git.checkout("main")?;
    git.worktree_add(&path, branch)?;

    let lib_rs = path.join("src").join("lib.rs");
    append_file(&lib_rs, "// Division coming soon\n")?;
    Git::new(&path).add(&["src/lib.rs"])?;
    append_file(&lib_rs, "// TODO: add division\n")?;
    Ok(())
}

/// Write `~/.config/worktrunk/config.toml` in the demo home.
pub fn write_user_config(env: &DemoEnv, contents: &str) -> Result<PathBuf> {
    let path = env.config_dir().join("worktrunk").join("config.toml");
    write_file(&path, contents)?;
    Ok(path)
}

/// Write extra manifest files into the repo, left uncommitted.
pub fn write_repo_files(env: &DemoEnv, files: &[RepoFile]) -> Result<Vec<PathBuf>> {
    let repo = env.repo();
    let mut written = Vec::with_capacity(files.len());
    for file in files {
        let path = repo.join(&file.path);
        write_file(&path, file.resolve_contents()?)?;
        written.push(path);
    }
    Ok(written)
}

/// Write `contents` to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn append_file(path: &Path, suffix: &str) -> Result<()> {
    let mut contents = read_file(path)?;
    contents.push_str(suffix);
    write_file(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubToolchain;

    #[test]
    fn paths_follow_layout() {
        let env = DemoEnv::new("wt-list", "/out").with_repo_name("acme");
        assert_eq!(env.root(), PathBuf::from("/out/.demo-wt-list"));
        assert_eq!(env.home(), env.root());
        assert_eq!(env.repo(), PathBuf::from("/out/.demo-wt-list/w/acme"));
        assert_eq!(env.bare_remote(), PathBuf::from("/out/.demo-wt-list/remote.git"));
        assert_eq!(env.bin_dir(), PathBuf::from("/out/.demo-wt-list/.local/bin"));
        assert_eq!(env.worktree("beta"), PathBuf::from("/out/.demo-wt-list/w/acme.beta"));
    }

    #[test]
    fn default_repo_name() {
        let env = DemoEnv::new("x", "/o");
        assert_eq!(env.repo(), PathBuf::from("/o/.demo-x/w/worktrunk"));
    }

    #[test]
    fn user_config_and_extra_files_land_in_demo_home() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("files", temp.path());
        let config = write_user_config(&env, "[list]\nfull = true\n").expect("config");
        assert_eq!(
            config,
            temp.path().join(".demo-files/.config/worktrunk/config.toml")
        );

        let files = vec![
            RepoFile {
                path: "src/validation.rs".into(),
                fixture: Some("validation.rs".into()),
                contents: None,
            },
            RepoFile {
                path: "notes.md".into(),
                fixture: None,
                contents: Some("# Notes\n".into()),
            },
        ];
        let written = write_repo_files(&env, &files).expect("files");
        assert_eq!(written.len(), 2);
        assert_eq!(
            fs::read_to_string(env.repo().join("src/validation.rs")).expect("read"),
            fixtures::VALIDATION_RS
        );
        assert_eq!(
            fs::read_to_string(env.repo().join("notes.md")).expect("read"),
            "# Notes\n"
        );
    }

    #[test]
    fn base_repo_has_history_and_remote() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("base", temp.path()).with_repo_name("acme");
        let toolchain = StubToolchain::default();
        prepare_base_repo(&env, temp.path(), &toolchain).expect("prepare");

        let git = Git::new(env.repo());
        let log = git.capture(&["log", "--format=%s"]).expect("log");
        assert_eq!(
            log.lines().collect::<Vec<_>>(),
            vec!["Add Cargo.lock", "Add Rust project with tests", "Initial commit"]
        );
        let status = git.capture(&["status", "--porcelain"]).expect("status");
        assert!(status.trim().is_empty(), "{status}");
        assert!(env.bin_dir().join("cat").exists());
        assert!(env.config_dir().join("worktrunk").is_dir());
        assert!(env.repo().join(".config").is_dir());
        assert_eq!(toolchain.calls(), vec!["lockfile", "build", "completions"]);
    }

    #[test]
    fn demo_repo_has_branch_states() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("full", temp.path()).with_repo_name("acme");
        prepare_demo_repo(&env, temp.path(), None, &StubToolchain::default()).expect("prepare");

        let git = Git::new(env.repo());
        let branches = git
            .capture(&["branch", "--format=%(refname:short)"])
            .expect("branches");
        for branch in ["main", "alpha", "beta", "hooks", "docs/readme", "spike/search"] {
            assert!(branches.lines().any(|b| b == branch), "missing {branch}");
        }

        let hooks = fs::read_to_string(env.repo().join(".config/wt.toml")).expect("hooks");
        assert_eq!(hooks, DEFAULT_HOOKS);

        let beta_behind = git
            .capture(&["rev-list", "--count", "beta..main"])
            .expect("rev-list");
        assert_eq!(beta_behind.trim(), "1");

        let alpha = Git::new(env.worktree("alpha"));
        let unpushed = alpha
            .capture(&["rev-list", "--count", "@{upstream}..HEAD"])
            .expect("unpushed");
        assert_eq!(unpushed.trim(), "1");
        let alpha_status = alpha.capture(&["status", "--porcelain"]).expect("status");
        assert!(alpha_status.contains(" M README.md"), "{alpha_status}");
        assert!(alpha_status.contains("?? scratch.rs"), "{alpha_status}");

        let hooks_wt = Git::new(env.worktree("hooks"));
        let hooks_status = hooks_wt.capture(&["status", "--porcelain"]).expect("status");
        assert!(hooks_status.contains("MM src/lib.rs"), "{hooks_status}");
        assert!(
            hooks_wt
                .capture(&["rev-parse", "--abbrev-ref", "hooks@{upstream}"])
                .is_err()
        );

        assert!(env.bin_dir().join("gh").exists());
        assert!(env.bin_dir().join("npm").exists());
    }
}
