//! Reading tape templates from disk.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::core::tape::{Replacements, render_str};

/// Render the tape at `template`, resolving `Source` paths against
/// `source_root`.
///
/// A missing template is not an error: the caller skips that recording.
pub fn render_tape(
    template: &Path,
    replacements: &Replacements,
    source_root: &Path,
) -> Result<Option<String>> {
    if !template.exists() {
        warn!(template = %template.display(), "tape not found, skipping VHS recording");
        return Ok(None);
    }
    let text = fs::read_to_string(template)
        .with_context(|| format!("read tape {}", template.display()))?;
    let rendered = render_str(&text, replacements, |source| {
        let path = source_root.join(source);
        fs::read_to_string(&path).with_context(|| format!("read sourced tape {}", path.display()))
    })
    .with_context(|| format!("render {}", template.display()))?;
    Ok(Some(rendered))
}

/// Like [`render_tape`], but a missing template is an error.
pub fn render_required(
    template: &Path,
    replacements: &Replacements,
    source_root: &Path,
) -> Result<String> {
    render_tape(template, replacements, source_root)?
        .with_context(|| format!("Failed to render tape: {}", template.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_template_is_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let rendered = render_tape(
            &temp.path().join("absent.tape"),
            &Replacements::new(),
            temp.path(),
        )
        .expect("render");
        assert!(rendered.is_none());
    }

    #[test]
    fn sources_resolve_against_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let shared = temp.path().join("docs/demos/shared");
        fs::create_dir_all(&shared).expect("mkdir");
        fs::write(shared.join("setup.tape"), "Hide\nType \"cd {{DEMO_REPO}}\"\n").expect("write");
        let template = temp.path().join("demo.tape");
        fs::write(
            &template,
            "Source \"docs/demos/shared/setup.tape\"\nShow\n",
        )
        .expect("write");

        let mut replacements = Replacements::new();
        replacements.insert("DEMO_REPO".into(), "/tmp/acme".into());
        let rendered = render_tape(&template, &replacements, temp.path())
            .expect("render")
            .expect("present");
        assert_eq!(rendered, "Hide\nType \"cd /tmp/acme\"\n\nShow\n");
    }

    #[test]
    fn required_render_reports_missing_template() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = render_required(
            &temp.path().join("gone.tape"),
            &Replacements::new(),
            temp.path(),
        )
        .expect_err("missing");
        assert!(err.to_string().starts_with("Failed to render tape"));
    }
}
