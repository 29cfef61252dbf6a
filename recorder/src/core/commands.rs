//! Extraction of the visible shell commands typed by a tape.

use std::sync::LazyLock;

use regex::Regex;

static TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^Type\s+["'](.+)["']"#).expect("type regex"));

/// Prefixes extracted when the caller does not specify any.
pub const DEFAULT_PREFIXES: &[&str] = &["wt", "git"];

/// Return the commands a rendered tape types and submits while visible.
///
/// A command counts when a `Type "..."` line inside a `Show` section is
/// followed by `Enter`, with only blank lines or `Sleep` directives between
/// them, and the command starts with one of `prefixes`. Tapes start hidden.
pub fn extract_commands(rendered: &str, prefixes: &[&str]) -> Vec<String> {
    let lines: Vec<&str> = rendered.split('\n').map(str::trim).collect();
    let mut commands = Vec::new();
    let mut visible = false;

    for (index, line) in lines.iter().enumerate() {
        match *line {
            "Show" => visible = true,
            "Hide" => visible = false,
            _ => {}
        }
        if !visible || !line.starts_with("Type ") {
            continue;
        }
        let Some(caps) = TYPE_RE.captures(line) else {
            continue;
        };
        let command = &caps[1];
        if submitted(&lines[index + 1..])
            && prefixes.iter().any(|prefix| command.starts_with(prefix))
        {
            commands.push(command.to_string());
        }
    }

    commands
}

fn submitted(rest: &[&str]) -> bool {
    rest.iter()
        .find(|line| !line.is_empty() && !line.starts_with("Sleep "))
        .is_some_and(|line| *line == "Enter")
}
