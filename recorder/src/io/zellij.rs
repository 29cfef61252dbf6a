//! Zellij config for multiplexer demos: warm-gold theme, minimal keybinds
//! and the tab-name plugin with its permissions pre-granted.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use minijinja::{Value, context};
use tracing::{debug, instrument};

use super::env::{DemoEnv, write_file};
use super::fixtures::ConfigTemplates;

pub const PLUGIN_FILE: &str = "zellij-tab-name.wasm";

/// Directory holding Zellij's plugin permission cache inside `home`.
pub fn permissions_cache_dir(home: &Path) -> PathBuf {
    if cfg!(target_os = "macos") {
        home.join("Library")
            .join("Caches")
            .join("org.Zellij-Contributors.Zellij")
    } else {
        home.join(".cache").join("zellij")
    }
}

/// Install the plugin from `plugin` and write `config.kdl` plus the
/// permissions cache so no dialog appears during recording.
#[instrument(skip_all, fields(demo = %env.name, default_cwd))]
pub fn setup_zellij_config(
    env: &DemoEnv,
    templates: &ConfigTemplates,
    default_cwd: Option<&str>,
    plugin: &Path,
) -> Result<()> {
    let config_dir = env.config_dir().join("zellij");
    let plugins_dir = config_dir.join("plugins");
    fs::create_dir_all(&plugins_dir)
        .with_context(|| format!("create {}", plugins_dir.display()))?;

    let plugin_dest = plugins_dir.join(PLUGIN_FILE);
    fs::copy(plugin, &plugin_dest)
        .with_context(|| format!("copy {} to {}", plugin.display(), plugin_dest.display()))?;

    let permissions = templates.render(
        "permissions.kdl",
        context! { plugin_path => plugin_dest.display().to_string() },
    )?;
    write_file(
        &permissions_cache_dir(&env.home()).join("permissions.kdl"),
        &permissions,
    )?;

    let default_cwd = default_cwd.map_or(Value::from(()), Value::from);
    let config = templates.render(
        "config.kdl",
        context! {
            plugins_dir => plugins_dir.display().to_string(),
            default_cwd => default_cwd,
        },
    )?;
    write_file(&config_dir.join("config.kdl"), &config)?;

    debug!(config = %config_dir.display(), "zellij config written");
    Ok(())
}
