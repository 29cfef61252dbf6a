//! Checkpoint files.
//!
//! Extra or recalibrated checkpoints live in TOML files, one demo per file:
//!
//! ```toml
//! demo = "wt-zellij-omnibus"
//!
//! [[checkpoints]]
//! frame = 200
//! expected = ["Opus", "acme"]
//! forbidden = ["command not found"]
//! ```
//!
//! A file replaces the built-in checkpoints of the demo it names.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;

use recorder::core::checkpoint::{Checkpoint, builtin_checkpoints};

/// Checkpoints for one demo, parsed from a TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CheckpointFile {
    pub demo: String,
    pub checkpoints: Vec<Checkpoint>,
}

impl CheckpointFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read checkpoints {}", path.display()))?;
        Self::parse_str(&contents).with_context(|| format!("checkpoints {}", path.display()))
    }

    pub fn parse_str(contents: &str) -> Result<Self> {
        let file: CheckpointFile = toml::from_str(contents).context("parse checkpoints")?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<()> {
        if self.demo.trim().is_empty() {
            bail!("demo must be non-empty");
        }
        if self.checkpoints.is_empty() {
            bail!("checkpoints must be a non-empty array");
        }
        let mut frames = BTreeSet::new();
        for (index, checkpoint) in self.checkpoints.iter().enumerate() {
            if checkpoint.expected.is_empty() && checkpoint.forbidden.is_empty() {
                bail!("checkpoints[{index}] needs expected or forbidden patterns");
            }
            if checkpoint
                .expected
                .iter()
                .chain(&checkpoint.forbidden)
                .any(|pattern| pattern.trim().is_empty())
            {
                bail!("checkpoints[{index}] has an empty pattern");
            }
            if !frames.insert(checkpoint.frame) {
                bail!("frame {} listed twice", checkpoint.frame);
            }
        }
        Ok(())
    }
}

/// Load every `*.toml` checkpoint file in `dir`, sorted by demo.
///
/// A missing directory yields no files. Two files naming the same demo is an
/// error.
pub fn discover_checkpoint_files(dir: &Path) -> Result<Vec<CheckpointFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("read checkpoints dir {}", dir.display()))?
    {
        let path = entry.context("read checkpoints entry")?.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("toml") {
            paths.push(path);
        }
    }
    let mut files = paths
        .iter()
        .map(|path| CheckpointFile::load(path))
        .collect::<Result<Vec<_>>>()?;
    files.sort_by(|left, right| left.demo.cmp(&right.demo));
    for pair in files.windows(2) {
        if pair[0].demo == pair[1].demo {
            return Err(anyhow!("duplicate checkpoints for demo {}", pair[0].demo));
        }
    }
    Ok(files)
}

/// Built-in checkpoints with the files in `dir` layered on top.
pub fn load_checkpoints(dir: &Path) -> Result<BTreeMap<String, Vec<Checkpoint>>> {
    let mut checkpoints = builtin_checkpoints();
    for file in discover_checkpoint_files(dir)? {
        checkpoints.insert(file.demo, file.checkpoints);
    }
    Ok(checkpoints)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OMNIBUS: &str = r#"
demo = "wt-zellij-omnibus"

[[checkpoints]]
frame = 210
expected = ["Opus"]

[[checkpoints]]
frame = 1800
forbidden = ["CONFLICT"]
"#;

    #[test]
    fn parses_checkpoint_file() {
        let file = CheckpointFile::parse_str(OMNIBUS).expect("parse");
        assert_eq!(file.demo, "wt-zellij-omnibus");
        assert_eq!(
            file.checkpoints,
            vec![
                Checkpoint::new(210, &["Opus"], &[]),
                Checkpoint::new(1800, &[], &["CONFLICT"]),
            ]
        );
    }

    #[test]
    fn rejects_checkpoint_without_patterns() {
        let err = CheckpointFile::parse_str("demo = \"x\"\n[[checkpoints]]\nframe = 1\n")
            .expect_err("no patterns");
        assert!(err.to_string().contains("needs expected or forbidden"));
    }

    #[test]
    fn rejects_repeated_frames() {
        let input = "demo = \"x\"\n[[checkpoints]]\nframe = 5\nexpected = [\"a\"]\n[[checkpoints]]\nframe = 5\nexpected = [\"b\"]\n";
        let err = CheckpointFile::parse_str(input).expect_err("repeated frame");
        assert!(err.to_string().contains("frame 5 listed twice"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let input = "demo = \"x\"\n[[checkpoints]]\nframe = 5\nexpect = [\"a\"]\n";
        assert!(CheckpointFile::parse_str(input).is_err());
    }

    #[test]
    fn files_override_builtin_checkpoints() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("omnibus.toml"), OMNIBUS).expect("write");
        fs::write(
            dir.path().join("wt-list.toml"),
            "demo = \"wt-list\"\n[[checkpoints]]\nframe = 30\nexpected = [\"Branch\"]\n",
        )
        .expect("write");
        fs::write(dir.path().join("README.md"), "ignored").expect("write");

        let checkpoints = load_checkpoints(dir.path()).expect("load");
        let frames: Vec<u32> = checkpoints["wt-zellij-omnibus"]
            .iter()
            .map(|c| c.frame)
            .collect();
        assert_eq!(frames, vec![210, 1800]);
        assert_eq!(checkpoints["wt-list"][0].frame, 30);
    }

    #[test]
    fn duplicate_demos_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.toml"), OMNIBUS).expect("write");
        fs::write(dir.path().join("b.toml"), OMNIBUS).expect("write");
        let err = discover_checkpoint_files(dir.path()).expect_err("duplicate");
        assert!(err.to_string().contains("duplicate checkpoints for demo wt-zellij-omnibus"));
    }

    #[test]
    fn missing_dir_keeps_builtins() {
        let checkpoints = load_checkpoints(Path::new("/nonexistent/checkpoints")).expect("load");
        assert_eq!(checkpoints, builtin_checkpoints());
    }

    #[test]
    fn shipped_checkpoint_files_match_builtins() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/checkpoints");
        assert_eq!(load_checkpoints(&dir).expect("load"), builtin_checkpoints());
    }
}
