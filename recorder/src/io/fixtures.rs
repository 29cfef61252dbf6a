//! Files embedded into demo repositories and home directories.
//!
//! Plain fixtures are copied verbatim. Config templates are rendered with
//! minijinja so the per-demo paths can be filled in.

use anyhow::{Context, Result};
use minijinja::{Environment, Value};

pub const LIB_RS: &str = include_str!("fixtures/lib.rs");
pub const LIB_HOOKS_RS: &str = include_str!("fixtures/lib-hooks.rs");
pub const ALPHA_UTILS_RS: &str = include_str!("fixtures/alpha-utils.rs");
pub const ALPHA_README_MD: &str = include_str!("fixtures/alpha-readme.md");
pub const VALIDATION_RS: &str = include_str!("fixtures/validation.rs");
pub const GH_MOCK_SH: &str = include_str!("fixtures/gh-mock.sh");
pub const BAT_WRAPPER_SH: &str = include_str!("fixtures/bat-wrapper.sh");
pub const STARSHIP_TOML: &str = include_str!("fixtures/starship.toml");

const FISH_CONFIG_TEMPLATE: &str = include_str!("fixtures/config.fish");
const ZELLIJ_CONFIG_TEMPLATE: &str = include_str!("fixtures/config.kdl");
const ZELLIJ_PERMISSIONS_TEMPLATE: &str = include_str!("fixtures/permissions.kdl");

/// Look up a plain fixture by file name, as referenced from demo manifests.
pub fn fixture(name: &str) -> Option<&'static str> {
    let contents = match name {
        "lib.rs" => LIB_RS,
        "lib-hooks.rs" => LIB_HOOKS_RS,
        "alpha-utils.rs" => ALPHA_UTILS_RS,
        "alpha-readme.md" => ALPHA_README_MD,
        "validation.rs" => VALIDATION_RS,
        "gh-mock.sh" => GH_MOCK_SH,
        "starship.toml" => STARSHIP_TOML,
        _ => return None,
    };
    Some(contents)
}

/// Template engine for home-directory config files.
pub struct ConfigTemplates {
    env: Environment<'static>,
}

impl ConfigTemplates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.add_template("config.fish", FISH_CONFIG_TEMPLATE)
            .context("parse fish config template")?;
        env.add_template("config.kdl", ZELLIJ_CONFIG_TEMPLATE)
            .context("parse zellij config template")?;
        env.add_template("permissions.kdl", ZELLIJ_PERMISSIONS_TEMPLATE)
            .context("parse zellij permissions template")?;
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String> {
        let template = self
            .env
            .get_template(name)
            .with_context(|| format!("template {name}"))?;
        template
            .render(ctx)
            .with_context(|| format!("render {name}"))
    }
}
