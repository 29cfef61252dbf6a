//! Demo recorder for the `wt` CLI.
//!
//! Provisions a throwaway repository and home directory from a demo manifest,
//! then records GIFs, text captures or command snapshots with VHS and fish.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use recorder::core::commands::DEFAULT_PREFIXES;
use recorder::demo::{self, DemoContext};
use recorder::exit_codes;
use recorder::io::env::CargoToolchain;
use recorder::io::manifest::{LoadedManifest, discover_manifests, resolve_manifest};
use recorder::io::process::check_dependencies;
use recorder::io::snapshot::extract_commands_from_tape;
use recorder::io::tape::render_required;
use recorder::io::vhs::{Vhs, theme_replacements};
use recorder::logging;

#[derive(Parser)]
#[command(name = "recorder", version, about = "Record demos of the wt CLI")]
struct Cli {
    /// Product checkout; `Source` paths and `target/debug` resolve against it.
    #[arg(long, global = true, default_value = ".")]
    repo_root: PathBuf,
    /// Directory of demo subdirectories (default: `<repo-root>/demos`).
    #[arg(long, global = true)]
    demos_dir: Option<PathBuf>,
    /// Use this VHS binary instead of building the keypress-overlay fork.
    #[arg(long, global = true)]
    vhs: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List demos with their tapes.
    List,
    /// Provision the demo environment and record GIFs for every theme.
    Record {
        /// Demo name, demo directory or manifest path.
        demo: String,
        /// Also record the text capture.
        #[arg(long)]
        text: bool,
        /// Also record the command snapshot.
        #[arg(long)]
        snapshot: bool,
    },
    /// Provision the demo environment and record the text capture.
    Text { demo: String },
    /// Provision the demo environment and record the command snapshot.
    Snapshot {
        demo: String,
        /// Write here instead of the manifest's snapshot path.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the visible `wt`/`git` commands of a tape.
    Commands {
        tape: PathBuf,
        /// Command prefixes to keep (default: wt, git).
        #[arg(long = "prefix")]
        prefixes: Vec<String>,
    },
    /// Print a demo's tape as VHS would receive it.
    Render {
        demo: String,
        #[arg(long, default_value = "light")]
        theme: String,
    },
    /// Download or build external dependencies.
    Deps {
        #[arg(value_enum)]
        which: Vec<Dependency>,
    },
    /// Remove a demo's environment and scratch files.
    Clean { demo: String },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Dependency {
    Vhs,
    Claude,
    Zellij,
}

fn main() {
    logging::init();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(exit_codes::ERROR);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let repo_root = cli
        .repo_root
        .canonicalize()
        .with_context(|| format!("resolve repo root {}", cli.repo_root.display()))?;
    let demos_dir = cli
        .demos_dir
        .clone()
        .unwrap_or_else(|| repo_root.join("demos"));
    let mut ctx = DemoContext::new(&repo_root);
    if let Some(vhs) = &cli.vhs {
        ctx = ctx.with_vhs(Vhs::new(vhs));
    }

    match cli.command {
        Command::List => cmd_list(&demos_dir),
        Command::Record {
            demo,
            text,
            snapshot,
        } => cmd_record(&resolve_manifest(&demos_dir, &demo)?, &ctx, text, snapshot),
        Command::Text { demo } => cmd_text(&resolve_manifest(&demos_dir, &demo)?, &ctx),
        Command::Snapshot { demo, output } => {
            cmd_snapshot(&resolve_manifest(&demos_dir, &demo)?, &ctx, output.as_deref())
        }
        Command::Commands { tape, prefixes } => cmd_commands(&tape, &repo_root, &prefixes),
        Command::Render { demo, theme } => {
            cmd_render(&resolve_manifest(&demos_dir, &demo)?, &ctx, &theme)
        }
        Command::Deps { which } => cmd_deps(&ctx, &which),
        Command::Clean { demo } => {
            let loaded = resolve_manifest(&demos_dir, &demo)?;
            demo::clean(&loaded)?;
            println!("clean: demo={}", loaded.name());
            Ok(())
        }
    }
}

fn cmd_list(demos_dir: &Path) -> Result<()> {
    for loaded in discover_manifests(demos_dir)? {
        println!("{}\t{}", loaded.name(), loaded.tape_path().display());
    }
    Ok(())
}

fn cmd_record(loaded: &LoadedManifest, ctx: &DemoContext, text: bool, snapshot: bool) -> Result<()> {
    check_dependencies(&["git", "cargo"])?;
    let env = demo::prepare(loaded, ctx, &CargoToolchain)?;
    for gif in demo::record_gifs(loaded, &env, ctx)? {
        println!("gif: {}", gif.display());
    }
    if text && let Some(path) = demo::record_text_output(loaded, &env, ctx)? {
        println!("text: {}", path.display());
    }
    if snapshot {
        check_dependencies(&["fish"])?;
        if let Some(path) = demo::record_snapshot_output(loaded, &env, ctx, None)? {
            println!("snapshot: {}", path.display());
        }
    }
    Ok(())
}

fn cmd_text(loaded: &LoadedManifest, ctx: &DemoContext) -> Result<()> {
    check_dependencies(&["git", "cargo"])?;
    let env = demo::prepare(loaded, ctx, &CargoToolchain)?;
    match demo::record_text_output(loaded, &env, ctx)? {
        Some(path) => println!("text: {}", path.display()),
        None => println!("text: none configured for {}", loaded.name()),
    }
    Ok(())
}

fn cmd_snapshot(loaded: &LoadedManifest, ctx: &DemoContext, output: Option<&Path>) -> Result<()> {
    check_dependencies(&["git", "cargo", "fish"])?;
    let env = demo::prepare(loaded, ctx, &CargoToolchain)?;
    match demo::record_snapshot_output(loaded, &env, ctx, output)? {
        Some(path) => println!("snapshot: {}", path.display()),
        None => println!("snapshot: none configured for {}", loaded.name()),
    }
    Ok(())
}

fn cmd_commands(tape: &Path, repo_root: &Path, prefixes: &[String]) -> Result<()> {
    let prefixes: Vec<&str> = if prefixes.is_empty() {
        DEFAULT_PREFIXES.to_vec()
    } else {
        prefixes.iter().map(String::as_str).collect()
    };
    for command in extract_commands_from_tape(tape, repo_root, &prefixes)? {
        println!("{command}");
    }
    Ok(())
}

fn cmd_render(loaded: &LoadedManifest, ctx: &DemoContext, theme: &str) -> Result<()> {
    let env = demo::demo_env(loaded);
    let base = demo::base_replacements(&env, ctx);
    let replacements = theme_replacements(
        &base,
        theme,
        &loaded.gif_path(theme),
        loaded.manifest.demo.size.size(),
    )?;
    print!("{}", render_required(&loaded.tape_path(), &replacements, &ctx.repo_root)?);
    Ok(())
}

fn cmd_deps(ctx: &DemoContext, which: &[Dependency]) -> Result<()> {
    let all = [Dependency::Vhs, Dependency::Claude, Dependency::Zellij];
    let selected = if which.is_empty() { &all[..] } else { which };
    for dep in selected {
        let (name, path) = match dep {
            Dependency::Vhs => ("vhs", ctx.deps.ensure_vhs_binary()?),
            Dependency::Claude => ("claude", ctx.deps.ensure_claude_binary()?),
            Dependency::Zellij => ("zellij-tab-name", ctx.deps.ensure_zellij_plugin()?),
        };
        println!("{name}: {}", path.display());
    }
    Ok(())
}
