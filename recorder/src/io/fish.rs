//! Fish shell config for recordings.

use anyhow::Result;
use minijinja::context;
use tracing::instrument;

use super::env::{DemoEnv, write_file};
use super::fixtures::ConfigTemplates;

/// Expansion of the `wsl` abbreviation.
pub fn wsl_command(create: bool) -> &'static str {
    if create {
        "wt switch --execute=claude --create"
    } else {
        "wt switch --execute=claude"
    }
}

/// Write `~/.config/fish/config.fish`.
///
/// Completions are installed by the base repo setup; this config sources
/// them eagerly because VHS does not trigger fish's lazy loading.
#[instrument(skip_all, fields(demo = %env.name, wsl_create))]
pub fn setup_fish_config(env: &DemoEnv, templates: &ConfigTemplates, wsl_create: bool) -> Result<()> {
    let config = templates.render(
        "config.fish",
        context! { wsl_cmd => wsl_command(wsl_create) },
    )?;
    write_file(&env.config_dir().join("fish").join("config.fish"), &config)
}
