//! Driving VHS: GIFs per theme and plain-text captures.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, instrument};

use super::env::{DemoEnv, target_debug, write_file};
use super::fixtures;
use super::process;
use super::tape::{render_required, render_tape};
use crate::core::size::DemoSize;
use crate::core::tape::{Replacements, rewrite_for_text_output};
use crate::core::theme::{format_for_vhs, theme};

/// How to invoke VHS: a program plus any leading arguments before the tape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vhs {
    program: PathBuf,
    leading_args: Vec<OsString>,
}

impl Vhs {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Run `program args... <tape>`; lets a script stand in for VHS.
    pub fn with_args<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Record `tape`, streaming VHS progress to the terminal.
    pub fn record(&self, tape: &Path) -> Result<()> {
        process::run_inherited(
            Command::new(&self.program)
                .args(&self.leading_args)
                .arg(tape),
        )
    }
}

impl Default for Vhs {
    fn default() -> Self {
        Self::new("vhs")
    }
}

/// Absolute form of `path`, resolving symlinks when it exists.
pub fn resolve_path(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Create the output directory and write `starship.toml` into it.
pub fn setup_demo_output(out_dir: &Path) -> Result<PathBuf> {
    let starship = out_dir.join("starship.toml");
    write_file(&starship, fixtures::STARSHIP_TOML)?;
    Ok(starship)
}

/// Variables shared by GIF and text recordings.
///
/// Paths are absolute since VHS runs the tape from its own working directory.
pub fn build_tape_replacements(
    env: &DemoEnv,
    repo_root: &Path,
    real_home: &Path,
    api_key: &str,
) -> Replacements {
    let display = |path: PathBuf| path.display().to_string();
    Replacements::from([
        ("DEMO_REPO".to_string(), display(resolve_path(&env.repo()))),
        ("DEMO_HOME".to_string(), display(resolve_path(&env.home()))),
        ("REAL_HOME".to_string(), display(real_home.to_path_buf())),
        (
            "STARSHIP_CONFIG".to_string(),
            display(resolve_path(&env.out_dir.join("starship.toml"))),
        ),
        (
            "TARGET_DEBUG".to_string(),
            display(resolve_path(&target_debug(repo_root))),
        ),
        ("ANTHROPIC_API_KEY".to_string(), api_key.to_string()),
    ])
}

/// `base` plus the per-recording `OUTPUT_GIF`, `THEME`, `WIDTH`, `HEIGHT`
/// and `FONTSIZE` variables.
pub fn theme_replacements(
    base: &Replacements,
    theme_name: &str,
    output_gif: &Path,
    size: DemoSize,
) -> Result<Replacements> {
    let mut replacements = base.clone();
    replacements.insert("OUTPUT_GIF".into(), output_gif.display().to_string());
    replacements.insert("THEME".into(), format_for_vhs(theme(theme_name)?)?);
    replacements.insert("WIDTH".into(), size.width.to_string());
    replacements.insert("HEIGHT".into(), size.height.to_string());
    replacements.insert("FONTSIZE".into(), size.font_size.to_string());
    Ok(replacements)
}

/// Record one GIF per `(theme, output)` pair.
///
/// A missing template records nothing. The rendered tape is removed after
/// each successful recording.
#[instrument(skip_all, fields(demo = %env.name, template = %template.display()))]
pub fn record_all_themes(
    env: &DemoEnv,
    template: &Path,
    outputs: &[(String, PathBuf)],
    base: &Replacements,
    repo_root: &Path,
    vhs: &Vhs,
    size: DemoSize,
) -> Result<Vec<PathBuf>> {
    let rendered_tape = env.out_dir.join(".rendered.tape");
    let mut recorded = Vec::new();

    for (theme_name, output_gif) in outputs {
        let replacements = theme_replacements(base, theme_name, output_gif, size)?;

        let Some(rendered) = render_tape(template, &replacements, repo_root)? else {
            continue;
        };

        write_file(&rendered_tape, &rendered)?;
        info!(theme = %theme_name, "Recording GIF...");
        vhs.record(&rendered_tape)?;
        remove_if_present(&rendered_tape)?;
        info!(gif = %output_gif.display(), "GIF saved");
        recorded.push(output_gif.clone());
    }
    Ok(recorded)
}

/// Record the tape as plain text into `output_txt`.
///
/// The tape is rewritten to emit `.txt` at a fixed canvas; real prompts and
/// command output end up in the capture.
#[instrument(skip_all, fields(demo = %env.name, tape = %tape.display()))]
pub fn record_text(
    env: &DemoEnv,
    tape: &Path,
    output_txt: &Path,
    replacements: &Replacements,
    repo_root: &Path,
    vhs: &Vhs,
) -> Result<()> {
    let rendered = render_required(tape, replacements, repo_root)?;

    fs::create_dir_all(&env.out_dir)
        .with_context(|| format!("create {}", env.out_dir.display()))?;
    let temp_txt = resolve_path(&env.out_dir).join(".text-output.txt");
    let rendered = rewrite_for_text_output(&rendered, &temp_txt);

    let tape_rendered = resolve_path(&env.out_dir).join(".text-rendered.tape");
    write_file(&tape_rendered, &rendered)?;
    let result = vhs.record(&tape_rendered);
    remove_if_present(&tape_rendered)?;
    result?;

    if !temp_txt.exists() {
        bail!(
            "VHS succeeded but output file not created: {}",
            temp_txt.display()
        );
    }
    if let Some(parent) = output_txt.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::copy(&temp_txt, output_txt)
        .with_context(|| format!("copy {} to {}", temp_txt.display(), output_txt.display()))?;
    fs::remove_file(&temp_txt).with_context(|| format!("remove {}", temp_txt.display()))?;
    debug!(output = %output_txt.display(), "text capture written");
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::size::DOCS;

    // Writes "recorded <tape file name>" to the tape's Output path.
    const FAKE_VHS: &str = r#"out=$(sed -n 's/^Output "\(.*\)"$/\1/p' "$1" | head -n 1)
printf 'recorded %s\n' "$(basename "$1")" > "$out"
"#;

    fn fake_vhs(dir: &Path) -> Vhs {
        let script = dir.join("fake-vhs.sh");
        fs::write(&script, FAKE_VHS).expect("fake vhs");
        Vhs::with_args("sh", [script])
    }

    #[test]
    fn replacements_cover_shared_variables() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("vars", temp.path());
        let replacements =
            build_tape_replacements(&env, temp.path(), Path::new("/home/me"), "sk-test");
        let keys: Vec<&str> = replacements.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "ANTHROPIC_API_KEY",
                "DEMO_HOME",
                "DEMO_REPO",
                "REAL_HOME",
                "STARSHIP_CONFIG",
                "TARGET_DEBUG"
            ]
        );
        assert_eq!(replacements["REAL_HOME"], "/home/me");
        assert!(replacements["DEMO_REPO"].ends_with(".demo-vars/w/worktrunk"));
        assert!(Path::new(&replacements["TARGET_DEBUG"]).is_absolute());
    }

    #[test]
    fn theme_variables_follow_size_preset() {
        let vars = theme_replacements(
            &Replacements::new(),
            "dark",
            Path::new("/out/dark/demo.gif"),
            crate::core::size::SOCIAL,
        )
        .expect("vars");
        assert_eq!(vars["OUTPUT_GIF"], "/out/dark/demo.gif");
        assert_eq!(vars["WIDTH"], "1200");
        assert_eq!(vars["HEIGHT"], "700");
        assert_eq!(vars["FONTSIZE"], "26");
        assert!(vars["THEME"].starts_with('{'));
        assert!(theme_replacements(&Replacements::new(), "sepia", Path::new("x"), DOCS).is_err());
    }

    #[test]
    fn setup_output_writes_starship_config() {
        let temp = tempfile::tempdir().expect("tempdir");
        let out = temp.path().join("out");
        let starship = setup_demo_output(&out).expect("setup");
        assert_eq!(starship, out.join("starship.toml"));
        assert_eq!(
            fs::read_to_string(starship).expect("read"),
            fixtures::STARSHIP_TOML
        );
    }

    #[test]
    fn records_each_theme_and_cleans_rendered_tape() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("gif", temp.path());
        fs::create_dir_all(&env.out_dir).expect("out");
        let template = temp.path().join("demo.tape");
        fs::write(
            &template,
            "Output \"{{OUTPUT_GIF}}\"\nSet FontSize {{FONTSIZE}}\nSet Theme {{THEME}}\n",
        )
        .expect("tape");

        let outputs = vec![
            ("light".to_string(), temp.path().join("light.gif")),
            ("dark".to_string(), temp.path().join("dark.gif")),
        ];
        let recorded = record_all_themes(
            &env,
            &template,
            &outputs,
            &Replacements::new(),
            temp.path(),
            &fake_vhs(temp.path()),
            DOCS,
        )
        .expect("record");

        assert_eq!(recorded.len(), 2);
        for (_, gif) in &outputs {
            let contents = fs::read_to_string(gif).expect("gif");
            assert_eq!(contents, "recorded .rendered.tape\n");
        }
        assert!(!env.out_dir.join(".rendered.tape").exists());
    }

    #[test]
    fn missing_template_records_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("gif", temp.path());
        let recorded = record_all_themes(
            &env,
            &temp.path().join("absent.tape"),
            &[("light".to_string(), temp.path().join("light.gif"))],
            &Replacements::new(),
            temp.path(),
            &Vhs::new("/nonexistent/vhs"),
            DOCS,
        )
        .expect("skip");
        assert!(recorded.is_empty());
    }

    #[test]
    fn text_capture_is_copied_and_temp_files_removed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("text", temp.path().join("out"));
        let tape = temp.path().join("demo.tape");
        fs::write(
            &tape,
            "Output \"demo.gif\"\nSet Width 1600\nSet Padding 20\nType \"wt list\"\n",
        )
        .expect("tape");
        let dest = temp.path().join("captures/demo.txt");

        record_text(
            &env,
            &tape,
            &dest,
            &Replacements::new(),
            temp.path(),
            &fake_vhs(temp.path()),
        )
        .expect("record text");

        assert_eq!(
            fs::read_to_string(&dest).expect("capture"),
            "recorded .text-rendered.tape\n"
        );
        assert!(!env.out_dir.join(".text-output.txt").exists());
        assert!(!env.out_dir.join(".text-rendered.tape").exists());
    }

    #[test]
    fn text_capture_fails_when_vhs_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("text", temp.path().join("out"));
        let tape = temp.path().join("demo.tape");
        fs::write(&tape, "Output \"demo.gif\"\n").expect("tape");

        let err = record_text(
            &env,
            &tape,
            &temp.path().join("demo.txt"),
            &Replacements::new(),
            temp.path(),
            &Vhs::with_args("sh", ["-c", "true"]),
        )
        .expect_err("no output");
        assert!(err.to_string().contains("output file not created"));
        assert!(!env.out_dir.join(".text-rendered.tape").exists());
    }
}
