//! OCR validation for TUI demos.
//!
//! Multiplexer demos render inside Zellij, which VHS cannot capture as text.
//! Key frames are pulled out of the GIF with `ffmpeg` and read back with
//! `tesseract`; each checkpoint then asserts on the recognised text.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, instrument, warn};

use recorder::core::checkpoint::{Checkpoint, match_text};
use recorder::io::process::{missing_commands, run_command_with_timeout};

/// Tools the real frame reader shells out to.
pub const REQUIRED_TOOLS: &[&str] = &["ffmpeg", "tesseract"];

/// Source of frame images and their text.
pub trait FrameReader {
    /// Required tools that are not installed.
    fn missing_tools(&self) -> Vec<String>;
    /// Write frame `frame` of `gif` to `output`. Returns true on success.
    fn extract_frame(&self, gif: &Path, frame: u32, output: &Path) -> bool;
    /// Recognised text of `image`, empty when OCR fails.
    fn ocr_image(&self, image: &Path) -> String;
}

/// [`FrameReader`] backed by `ffmpeg` and `tesseract`.
#[derive(Debug, Clone, Copy)]
pub struct OcrTools {
    /// Maximum time for a single ffmpeg or tesseract invocation.
    pub timeout: Duration,
    /// Maximum bytes to keep from each tool's stdout/stderr.
    pub output_limit_bytes: usize,
}

impl Default for OcrTools {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            output_limit_bytes: 64 * 1024,
        }
    }
}

impl FrameReader for OcrTools {
    fn missing_tools(&self) -> Vec<String> {
        missing_commands(REQUIRED_TOOLS)
    }

    fn extract_frame(&self, gif: &Path, frame: u32, output: &Path) -> bool {
        let filter = select_filter(frame);
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-loglevel", "error", "-i"])
            .arg(gif)
            .args(["-vf", filter.as_str(), "-vframes", "1", "-update", "1"])
            .arg(output);
        match run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes) {
            Ok(result) => {
                if !result.succeeded() {
                    debug!(
                        frame,
                        stderr = %String::from_utf8_lossy(&result.stderr).trim(),
                        "ffmpeg failed"
                    );
                }
                result.succeeded() && output.exists()
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "ffmpeg did not run");
                false
            }
        }
    }

    fn ocr_image(&self, image: &Path) -> String {
        match self.try_ocr(image) {
            Ok(text) => text,
            Err(err) => {
                debug!(err = %format!("{err:#}"), image = %image.display(), "ocr failed");
                String::new()
            }
        }
    }
}

impl OcrTools {
    fn try_ocr(&self, image: &Path) -> Result<String> {
        // tesseract appends `.txt` to the output base itself
        let output = tempfile::Builder::new()
            .prefix("wt-ocr-")
            .suffix(".txt")
            .tempfile()
            .context("create ocr output file")?
            .into_temp_path();
        let base = output.with_extension("");

        let mut cmd = Command::new("tesseract");
        cmd.arg(image).arg(&base).args(["-l", "eng"]);
        let result = run_command_with_timeout(cmd, self.timeout, self.output_limit_bytes)?;
        if !result.succeeded() {
            anyhow::bail!(
                "tesseract failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            );
        }
        fs::read_to_string(&output).with_context(|| format!("read {}", output.display()))
    }
}

/// ffmpeg filter selecting a single frame by index.
pub fn select_filter(frame: u32) -> String {
    format!("select=eq(n\\,{frame})")
}

/// Outcome of one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointOutcome {
    pub frame: u32,
    pub errors: Vec<String>,
}

impl CheckpointOutcome {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate one checkpoint, writing the frame into `work_dir`.
pub fn validate_checkpoint(
    reader: &dyn FrameReader,
    gif: &Path,
    checkpoint: &Checkpoint,
    work_dir: &Path,
) -> Vec<String> {
    let frame = checkpoint.frame;
    let frame_path = work_dir.join(format!("frame_{frame}.png"));
    if !reader.extract_frame(gif, frame, &frame_path) {
        return vec![format!("Failed to extract frame {frame}")];
    }
    let text = reader.ocr_image(&frame_path);
    if text.is_empty() {
        return vec![format!("OCR failed for frame {frame}")];
    }
    match_text(&text, checkpoint)
}

/// Checks that must pass before any frame is read.
///
/// Returns the demo's checkpoints, or the single error explaining why
/// validation cannot start.
pub fn precheck<'a>(
    reader: &dyn FrameReader,
    demo: &str,
    gif: &Path,
    checkpoints: &'a BTreeMap<String, Vec<Checkpoint>>,
) -> std::result::Result<&'a [Checkpoint], String> {
    let Some(demo_checkpoints) = checkpoints.get(demo) else {
        return Err(format!("No checkpoints defined for demo: {demo}"));
    };
    if !gif.exists() {
        return Err(format!("GIF not found: {}", gif.display()));
    }
    let missing = reader.missing_tools();
    if !missing.is_empty() {
        return Err(format!("Missing required tools: {}", missing.join(", ")));
    }
    Ok(demo_checkpoints)
}

/// Run every checkpoint against `gif` in a scratch directory.
#[instrument(skip_all, fields(gif = %gif.display(), count = checkpoints.len()))]
pub fn run_checkpoints(
    reader: &dyn FrameReader,
    gif: &Path,
    checkpoints: &[Checkpoint],
) -> Result<Vec<CheckpointOutcome>> {
    let work_dir = tempfile::Builder::new()
        .prefix("wt-validate-")
        .tempdir()
        .context("create validation work dir")?;
    let outcomes = checkpoints
        .iter()
        .map(|checkpoint| CheckpointOutcome {
            frame: checkpoint.frame,
            errors: validate_checkpoint(reader, gif, checkpoint, work_dir.path()),
        })
        .collect();
    Ok(outcomes)
}

/// Validate a TUI demo GIF. An empty list means validation passed.
///
/// Each failing frame contributes one `Frame N: e1; e2` entry.
pub fn validate_tui_demo(
    reader: &dyn FrameReader,
    demo: &str,
    gif: &Path,
    checkpoints: &BTreeMap<String, Vec<Checkpoint>>,
) -> Result<Vec<String>> {
    let demo_checkpoints = match precheck(reader, demo, gif, checkpoints) {
        Ok(list) => list,
        Err(error) => return Ok(vec![error]),
    };
    let errors = run_checkpoints(reader, gif, demo_checkpoints)?
        .into_iter()
        .filter(|outcome| !outcome.passed())
        .map(|outcome| format!("Frame {}: {}", outcome.frame, outcome.errors.join("; ")))
        .collect();
    Ok(errors)
}

/// Validate a TUI demo and describe every checkpoint.
///
/// Returns `(passed, message)` where the message lists `✓`/`✗` per frame
/// followed by a summary line.
pub fn validate_tui_demo_verbose(
    reader: &dyn FrameReader,
    demo: &str,
    gif: &Path,
    checkpoints: &BTreeMap<String, Vec<Checkpoint>>,
) -> Result<(bool, String)> {
    let demo_checkpoints = match precheck(reader, demo, gif, checkpoints) {
        Ok(list) => list,
        Err(error) => return Ok((false, error)),
    };
    let outcomes = run_checkpoints(reader, gif, demo_checkpoints)?;
    Ok(describe_outcomes(demo, gif, &outcomes))
}

/// Render outcomes in the verbose format.
pub fn describe_outcomes(demo: &str, gif: &Path, outcomes: &[CheckpointOutcome]) -> (bool, String) {
    let mut lines = vec![format!("Validating {demo}: {}", gif.display())];
    let mut all_passed = true;
    for outcome in outcomes {
        if outcome.passed() {
            lines.push(format!("  ✓ Frame {}", outcome.frame));
        } else {
            all_passed = false;
            lines.push(format!("  ✗ Frame {}", outcome.frame));
            lines.extend(outcome.errors.iter().map(|error| format!("    - {error}")));
        }
    }
    lines.push(if all_passed {
        "✓ All checkpoints passed".to_string()
    } else {
        "✗ Some checkpoints failed".to_string()
    });
    (all_passed, lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use recorder::core::checkpoint::builtin_checkpoints;

    /// Frame reader serving canned OCR text per frame.
    struct CannedFrames {
        missing: Vec<String>,
        text: BTreeMap<u32, String>,
    }

    impl CannedFrames {
        fn new(frames: &[(u32, &str)]) -> Self {
            Self {
                missing: Vec::new(),
                text: frames
                    .iter()
                    .map(|(frame, text)| (*frame, (*text).to_string()))
                    .collect(),
            }
        }
    }

    impl FrameReader for CannedFrames {
        fn missing_tools(&self) -> Vec<String> {
            self.missing.clone()
        }

        fn extract_frame(&self, _gif: &Path, frame: u32, output: &Path) -> bool {
            match self.text.get(&frame) {
                Some(text) => fs::write(output, text).is_ok(),
                None => false,
            }
        }

        fn ocr_image(&self, image: &Path) -> String {
            fs::read_to_string(image).unwrap_or_default()
        }
    }

    fn gif() -> tempfile::NamedTempFile {
        tempfile::Builder::new()
            .suffix(".gif")
            .tempfile()
            .expect("gif")
    }

    #[test]
    fn select_filter_escapes_comma() {
        assert_eq!(select_filter(200), r"select=eq(n\,200)");
    }

    #[test]
    fn passing_frames_yield_no_errors() {
        let gif = gif();
        let reader = CannedFrames::new(&[
            (200, "Opus 4.6 | acme.api > Add a test for the billing flow"),
            (1750, "Branch Status main billing"),
        ]);
        let errors =
            validate_tui_demo(&reader, "wt-zellij-omnibus", gif.path(), &builtin_checkpoints())
                .expect("validate");
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn failing_frames_are_joined_per_frame() {
        let gif = gif();
        let reader = CannedFrames::new(&[
            (200, "opus acme add a test"),
            (1750, "Branch main\nCONFLICT (content): merge conflict"),
        ]);
        let errors =
            validate_tui_demo(&reader, "wt-zellij-omnibus", gif.path(), &builtin_checkpoints())
                .expect("validate");
        assert_eq!(
            errors,
            vec![
                "Frame 1750: Expected pattern not found: 'billing'; Forbidden pattern found: 'CONFLICT'"
            ]
        );
    }

    #[test]
    fn extraction_and_ocr_failures_are_reported() {
        let gif = gif();
        let reader = CannedFrames::new(&[(200, "")]);
        let errors =
            validate_tui_demo(&reader, "wt-zellij-omnibus", gif.path(), &builtin_checkpoints())
                .expect("validate");
        assert_eq!(
            errors,
            vec![
                "Frame 200: OCR failed for frame 200",
                "Frame 1750: Failed to extract frame 1750"
            ]
        );
    }

    #[test]
    fn prechecks_short_circuit() {
        let gif = gif();
        let reader = CannedFrames::new(&[]);
        let checkpoints = builtin_checkpoints();

        let errors = validate_tui_demo(&reader, "wt-list", gif.path(), &checkpoints)
            .expect("validate");
        assert_eq!(errors, vec!["No checkpoints defined for demo: wt-list"]);

        let missing_gif = Path::new("/nonexistent/demo.gif");
        let errors = validate_tui_demo(&reader, "wt-zellij-omnibus", missing_gif, &checkpoints)
            .expect("validate");
        assert_eq!(errors, vec!["GIF not found: /nonexistent/demo.gif"]);

        let reader = CannedFrames {
            missing: vec!["ffmpeg".into(), "tesseract".into()],
            text: BTreeMap::new(),
        };
        let (passed, message) =
            validate_tui_demo_verbose(&reader, "wt-zellij-omnibus", gif.path(), &checkpoints)
                .expect("validate");
        assert!(!passed);
        assert_eq!(message, "Missing required tools: ffmpeg, tesseract");
    }

    #[test]
    fn verbose_output_marks_each_frame() {
        let gif = gif();
        let reader = CannedFrames::new(&[
            (200, "Opus acme Add a test"),
            (1750, "Branch main error: something failed"),
        ]);
        let (passed, message) = validate_tui_demo_verbose(
            &reader,
            "wt-zellij-omnibus",
            gif.path(),
            &builtin_checkpoints(),
        )
        .expect("validate");
        assert!(!passed);
        let lines: Vec<&str> = message.lines().collect();
        assert!(lines[0].starts_with("Validating wt-zellij-omnibus: "));
        assert_eq!(
            &lines[1..],
            &[
                "  ✓ Frame 200",
                "  ✗ Frame 1750",
                "    - Expected pattern not found: 'billing'",
                "    - Forbidden pattern found: 'error:'",
                "    - Forbidden pattern found: 'failed'",
                "✗ Some checkpoints failed",
            ]
        );
    }
}
