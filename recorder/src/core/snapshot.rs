//! Command snapshots: the fish script that replays a tape's commands, output
//! normalisation, and a line diff for comparing snapshots.

use std::fmt::Write as _;
use std::path::Path;

/// Placeholder substituted for the demo output directory.
pub const DEMO_DIR_PLACEHOLDER: &str = "<DEMO_DIR>";

/// Build a fish script that runs `commands` in `repo` with shell integration.
///
/// Each command is announced as `$ <cmd>` and run with stderr merged into
/// stdout. Commands are separated by a blank line.
pub fn build_snapshot_script(commands: &[String], repo: &Path) -> String {
    let mut lines = vec![
        "# Initialize shell integration".to_string(),
        "wt config shell init fish | source".to_string(),
        "source ~/.config/fish/completions/wt.fish".to_string(),
        format!("cd {}", repo.display()),
        String::new(),
    ];
    for (index, command) in commands.iter().enumerate() {
        lines.push(format!("echo '$ {command}'"));
        lines.push(format!("{command} 2>&1"));
        if index + 1 < commands.len() {
            lines.push("echo ''".to_string());
        }
    }
    lines.join("\n")
}

/// Strip trailing whitespace and replace demo directory paths with a placeholder.
///
/// The canonical path is replaced first since it may contain the literal one
/// (macOS `/private/var` vs `/var`).
pub fn normalize_output(output: &str, out_dir: &Path, out_dir_canonical: &Path) -> String {
    let canonical = out_dir_canonical.display().to_string();
    let literal = out_dir.display().to_string();
    output
        .trim_end()
        .replace(&canonical, DEMO_DIR_PLACEHOLDER)
        .replace(&literal, DEMO_DIR_PLACEHOLDER)
}

/// One line of a line-oriented diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffLine {
    Same(String),
    Removed(String),
    Added(String),
}

/// Minimal line diff (longest common subsequence) from `expected` to `actual`.
pub fn diff_lines(expected: &str, actual: &str) -> Vec<DiffLine> {
    let old: Vec<&str> = expected.lines().collect();
    let new: Vec<&str> = actual.lines().collect();

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut diff = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            diff.push(DiffLine::Same(old[i].to_string()));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            diff.push(DiffLine::Removed(old[i].to_string()));
            i += 1;
        } else {
            diff.push(DiffLine::Added(new[j].to_string()));
            j += 1;
        }
    }
    diff.extend(old[i..].iter().map(|l| DiffLine::Removed(l.to_string())));
    diff.extend(new[j..].iter().map(|l| DiffLine::Added(l.to_string())));
    diff
}

/// True when the diff contains any change.
pub fn has_changes(diff: &[DiffLine]) -> bool {
    diff.iter().any(|line| !matches!(line, DiffLine::Same(_)))
}

/// Render a diff with `-`/`+`/` ` prefixes.
pub fn render_diff(diff: &[DiffLine]) -> String {
    let mut out = String::new();
    for line in diff {
        let _ = match line {
            DiffLine::Same(text) => writeln!(out, " {text}"),
            DiffLine::Removed(text) => writeln!(out, "-{text}"),
            DiffLine::Added(text) => writeln!(out, "+{text}"),
        };
    }
    out
}
