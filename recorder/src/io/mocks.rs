//! Mock CLIs installed into the demo home's `~/.local/bin`.
//!
//! Each mock prints the same output every run so recordings and snapshots
//! stay stable. A mock covers every case any demo needs; demos only exercise
//! the branches they use.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use super::env::DemoEnv;
use super::fixtures;

const NPM_MOCK: &str = r#"#!/bin/bash
if [[ "$1" == "install" ]]; then
    echo "added 847 packages in 3.2s"
elif [[ "$1" == "run" && "$2" == "build" ]]; then
    echo "vite v5.4.2 building for production..."
    echo "✓ 142 modules transformed"
    echo "dist/index.js  45.2 kB │ gzip: 14.8 kB"
elif [[ "$1" == "run" && "$2" == "dev" ]]; then
    # Extract port from args if provided (e.g., npm run dev -- --port 3001)
    port=3000
    for arg in "$@"; do
        if [[ "$prev" == "--port" ]]; then
            port="$arg"
        fi
        prev="$arg"
    done
    echo ""
    echo "  VITE v5.4.2  ready in 342 ms"
    echo ""
    echo "  ➜  Local:   http://localhost:$port/"
    echo "  ➜  Network: http://192.168.1.42:$port/"
fi
"#;

const DOCKER_MOCK: &str = r#"#!/bin/bash
if [[ "$1" == "compose" && "$2" == "up" ]]; then
    echo "[+] Running 1/1"
    echo " ✔ Container postgres  Started"
fi
"#;

const FLYCTL_MOCK: &str = r#"#!/bin/bash
if [[ "$1" == "scale" ]]; then
    echo "Scaling app to 0 machines"
fi
"#;

const LLM_MOCK: &str = r#"#!/bin/bash
sleep 0.5
echo "feat(validation): add input validation utilities"
echo ""
echo "Add validation module with is_positive and is_non_empty helpers"
echo "for validating user input. Includes comprehensive test coverage."
"#;

const CARGO_MOCK: &str = r#"#!/bin/bash
if [[ "$1" == "nextest" && "$2" == "run" ]]; then
    sleep 0.3
    echo "    Finished \`test\` profile [unoptimized + debuginfo] target(s) in 0.02s"
    echo "    Starting 2 tests across 1 binary"
    echo "        PASS [   0.001s] acme::tests::test_add"
    echo "        PASS [   0.001s] acme::tests::test_add_zeros"
    echo "------------"
    echo "     Summary [   0.002s] 2 tests run: 2 passed, 0 skipped"
fi
"#;

/// Mock name and script, in installation order.
pub const MOCK_CLIS: &[(&str, &str)] = &[
    ("npm", NPM_MOCK),
    ("docker", DOCKER_MOCK),
    ("flyctl", FLYCTL_MOCK),
    ("llm", LLM_MOCK),
    ("cargo", CARGO_MOCK),
];

/// Install the npm, docker, flyctl, llm and cargo mocks.
pub fn setup_mock_clis(env: &DemoEnv) -> Result<()> {
    for (name, script) in MOCK_CLIS {
        write_executable(&env.bin_dir().join(name), script)?;
    }
    debug!(bin_dir = %env.bin_dir().display(), "mock CLIs installed");
    Ok(())
}

/// Install a `cat` wrapper that highlights TOML files with `bat`.
pub fn install_bat_wrapper(env: &DemoEnv) -> Result<PathBuf> {
    let path = env.bin_dir().join("cat");
    write_executable(&path, fixtures::BAT_WRAPPER_SH)?;
    Ok(path)
}

/// Install the `gh` mock that reports varied CI status per branch.
pub fn install_gh_mock(env: &DemoEnv) -> Result<PathBuf> {
    let path = env.bin_dir().join("gh");
    write_executable(&path, fixtures::GH_MOCK_SH)?;
    Ok(path)
}

/// Write `contents` to `path` (creating parents) and mark it `0755`.
pub fn write_executable(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    set_executable(path)
}

/// Mark `path` as `0755`.
#[cfg(unix)]
pub fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("chmod {}", path.display()))
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
