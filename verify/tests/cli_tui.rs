//! CLI tests for `verify list` and the `verify tui` paths that stop before
//! any frame is extracted, so neither ffmpeg nor tesseract is needed.

use std::fs;
use std::path::Path;
use std::process::Command;

use recorder::exit_codes;
use recorder::test_support::TestEnv;

fn verify(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_verify"));
    cmd.current_dir(root)
        .env("RUST_LOG", "error")
        .arg("--repo-root")
        .arg(root);
    cmd
}

#[test]
fn list_merges_checkpoint_files_over_builtins() {
    let test = TestEnv::new("verify");
    test.write(
        "demos/checkpoints/wt-switch.toml",
        "demo = \"wt-switch\"\n\n[[checkpoints]]\nframe = 90\nexpected = [\"alpha\"]\n\n[[checkpoints]]\nframe = 120\nforbidden = [\"error:\"]\n",
    );

    let output = verify(test.repo_root()).arg("list").output().expect("verify list");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "wt-switch\tframes=90,120\nwt-zellij-omnibus\tframes=200,1750\n"
    );
}

#[test]
fn unknown_demo_fails_validation() {
    let test = TestEnv::new("verify");
    let gif = test.write("demo.gif", "GIF89a");

    let output = verify(test.repo_root())
        .args(["tui", "wt-list"])
        .arg(&gif)
        .output()
        .expect("verify tui");

    assert_eq!(output.status.code(), Some(exit_codes::VALIDATION_FAILED));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "No checkpoints defined for demo: wt-list\n"
    );
}

#[test]
fn missing_gif_is_recorded_in_report() {
    let test = TestEnv::new("verify");
    let gif = test.repo_root().join("out/missing.gif");
    let report = test.repo_root().join("reports/omnibus.json");

    let output = verify(test.repo_root())
        .args(["tui", "wt-zellij-omnibus"])
        .arg(&gif)
        .arg("--report")
        .arg(&report)
        .output()
        .expect("verify tui");

    assert_eq!(output.status.code(), Some(exit_codes::VALIDATION_FAILED));
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).expect("read report")).expect("json");
    assert_eq!(written["demo"], "wt-zellij-omnibus");
    assert_eq!(written["passed"], false);
    assert_eq!(
        written["errors"][0],
        format!("GIF not found: {}", gif.display())
    );
}

#[test]
fn malformed_checkpoint_file_is_an_error() {
    let test = TestEnv::new("verify");
    test.write("demos/checkpoints/bad.toml", "demo = \"x\"\n");

    let output = verify(test.repo_root()).arg("list").output().expect("verify list");

    assert_eq!(output.status.code(), Some(exit_codes::ERROR));
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad.toml"));
}
