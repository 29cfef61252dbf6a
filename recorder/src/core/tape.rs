//! Tape template rendering.
//!
//! Tapes are VHS scripts with two extensions handled here rather than by VHS:
//! `Source <path>` lines are inlined from disk, and `{{VAR}}` tokens are
//! replaced literally from a replacement map.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::Result;
use regex::{Captures, Regex};

static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Source\s+(.+)$").expect("source regex"));
static OUTPUT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^Output\s+"[^"]+""#).expect("output regex"));
static WIDTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Set Width .*$").expect("width regex"));
static HEIGHT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^Set Height .*$").expect("height regex"));
static DROPPED_SETTINGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Set (?:FontSize|Theme|Padding) .*$\n?").expect("settings regex")
});

/// Ordered `{{KEY}}` → value map.
pub type Replacements = BTreeMap<String, String>;

/// Render template text: inline `Source` directives, then substitute tokens.
///
/// `read_source` receives the directive argument with whitespace and double
/// quotes trimmed. Sourced content is not scanned for further `Source` lines.
pub fn render_str<F>(
    template: &str,
    replacements: &Replacements,
    mut read_source: F,
) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut failure = None;
    let inlined = SOURCE_RE.replace_all(template, |caps: &Captures<'_>| {
        let target = caps[1].trim().trim_matches('"');
        match read_source(target) {
            Ok(contents) => contents,
            Err(err) => {
                if failure.is_none() {
                    failure = Some(err);
                }
                String::new()
            }
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }

    let mut rendered = inlined.into_owned();
    for (key, value) in replacements {
        rendered = substitute(&rendered, key, value);
    }
    Ok(rendered)
}

/// Replace every literal `{{key}}` in `text` with `value`.
pub fn substitute(text: &str, key: &str, value: &str) -> String {
    text.replace(&format!("{{{{{key}}}}}"), value)
}

/// Adapt a rendered tape for plain-text capture.
///
/// Points every `Output` at `output_path`, pins the canvas to 120x120 and
/// drops styling settings that only matter for GIF output.
pub fn rewrite_for_text_output(rendered: &str, output_path: &Path) -> String {
    let output_line = format!("Output \"{}\"", output_path.display());
    let rewritten = OUTPUT_RE.replace_all(rendered, regex::NoExpand(&output_line));
    let rewritten = WIDTH_RE.replace_all(&rewritten, "Set Width 120");
    let rewritten = HEIGHT_RE.replace_all(&rewritten, "Set Height 120");
    DROPPED_SETTINGS_RE.replace_all(&rewritten, "").into_owned()
}
