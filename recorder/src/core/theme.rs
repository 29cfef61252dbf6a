//! Terminal colour themes passed to VHS via `Set Theme`.

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

/// A VHS theme. Field names follow the JSON keys VHS reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: &'static str,
    pub background: &'static str,
    pub foreground: &'static str,
    pub cursor: &'static str,
    pub selection: &'static str,
    pub black: &'static str,
    pub red: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub blue: &'static str,
    pub magenta: &'static str,
    pub cyan: &'static str,
    pub white: &'static str,
    pub bright_black: &'static str,
    pub bright_red: &'static str,
    pub bright_green: &'static str,
    pub bright_yellow: &'static str,
    pub bright_blue: &'static str,
    pub bright_magenta: &'static str,
    pub bright_cyan: &'static str,
    pub bright_white: &'static str,
}

/// Warm light palette shared with the Zellij `warm-gold` theme.
pub const LIGHT: Theme = Theme {
    name: "worktrunk-light",
    background: "#FFFDF8",
    foreground: "#1f2328",
    cursor: "#d97706",
    selection: "#f5e6c8",
    black: "#f5f0e8",
    red: "#d73a49",
    green: "#22863a",
    yellow: "#d29922",
    blue: "#0969da",
    magenta: "#8250df",
    cyan: "#1b7c83",
    white: "#57534e",
    bright_black: "#8c8680",
    bright_red: "#cb2431",
    bright_green: "#28a745",
    bright_yellow: "#b08800",
    bright_blue: "#0550ae",
    bright_magenta: "#6f42c1",
    bright_cyan: "#3192aa",
    bright_white: "#1f2328",
};

pub const DARK: Theme = Theme {
    name: "worktrunk-dark",
    background: "#1c1b19",
    foreground: "#e8e3d9",
    cursor: "#f0b44c",
    selection: "#3d3a33",
    black: "#2a2824",
    red: "#f47067",
    green: "#57ab5a",
    yellow: "#daaa3f",
    blue: "#539bf5",
    magenta: "#b083f0",
    cyan: "#39c5cf",
    white: "#adbac7",
    bright_black: "#636e7b",
    bright_red: "#ff938a",
    bright_green: "#6bc46d",
    bright_yellow: "#eac55f",
    bright_blue: "#6cb6ff",
    bright_magenta: "#dcbdfb",
    bright_cyan: "#56d4dd",
    bright_white: "#cdd9e5",
};

/// Names accepted by [`theme`], in recording order.
pub const THEME_NAMES: &[&str] = &["light", "dark"];

/// Look up a theme by name.
pub fn theme(name: &str) -> Result<&'static Theme> {
    match name {
        "light" => Ok(&LIGHT),
        "dark" => Ok(&DARK),
        other => Err(anyhow!("unknown theme {other} (expected light or dark)")),
    }
}

/// Serialize a theme to the single-line JSON `Set Theme` expects.
pub fn format_for_vhs(theme: &Theme) -> Result<String> {
    serde_json::to_string(theme).context("serialize theme")
}
