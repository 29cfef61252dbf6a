//! Assistant configuration for demos that launch `claude` inside the recording.
//!
//! Everything here exists to skip first-run dialogs: onboarding, trust
//! prompts, API key approval and release notes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use tracing::{debug, instrument};

use super::env::{DemoEnv, write_file};

/// Model pinned in `settings.json` so the status line is stable.
pub const DEMO_MODEL: &str = "claude-opus-4-6";

const STATUS_LINE_COMMAND: &str = "wt list statusline --format=claude-code";
const API_KEY_SUFFIX_LEN: usize = 20;

/// Options for [`setup_claude_config`].
#[derive(Debug, Default, Clone)]
pub struct ClaudeSetup<'a> {
    /// Worktree paths to pre-approve for trust.
    pub worktree_paths: &'a [PathBuf],
    /// Tools to pre-approve; empty means the assistant asks.
    pub allowed_tools: &'a [String],
    /// Value of `ANTHROPIC_API_KEY`, if set.
    pub api_key: Option<&'a str>,
}

/// Write `~/.claude.json`, `~/.claude/settings.json` and copy the binary
/// into `~/.local/bin/claude` (its presence marks a native install).
#[instrument(skip_all, fields(demo = %env.name))]
pub fn setup_claude_config(env: &DemoEnv, setup: &ClaudeSetup<'_>, binary: &Path) -> Result<()> {
    let state = claude_json(setup);
    let state_path = env.home().join(".claude.json");
    write_json(&state_path, &state)?;

    let bin_dir = env.bin_dir();
    fs::create_dir_all(&bin_dir).with_context(|| format!("create {}", bin_dir.display()))?;
    let dest = bin_dir.join("claude");
    fs::copy(binary, &dest)
        .with_context(|| format!("copy {} to {}", binary.display(), dest.display()))?;

    let settings_path = env.home().join(".claude").join("settings.json");
    write_json(&settings_path, &settings_json(setup.allowed_tools))?;

    debug!(projects = setup.worktree_paths.len(), "assistant config written");
    Ok(())
}

/// Last characters of the API key, as recorded by an approved custom key.
pub fn api_key_suffix(api_key: Option<&str>) -> Option<String> {
    let key = api_key.filter(|k| !k.is_empty())?;
    let chars: Vec<char> = key.chars().collect();
    let start = chars.len().saturating_sub(API_KEY_SUFFIX_LEN);
    Some(chars[start..].iter().collect())
}

fn claude_json(setup: &ClaudeSetup<'_>) -> Value {
    // Keyed by canonical path; macOS temp dirs sit behind a /var symlink.
    let mut projects = Map::new();
    for path in setup.worktree_paths {
        let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
        projects.insert(
            resolved.display().to_string(),
            json!({ "allowedTools": [], "hasTrustDialogAccepted": true }),
        );
    }

    let approved: Vec<String> = api_key_suffix(setup.api_key).into_iter().collect();

    json!({
        "numStartups": 100,
        "installMethod": "global",
        "theme": "light",
        "firstStartTime": "2025-01-01T00:00:00.000Z",
        "hasCompletedOnboarding": true,
        "hasCompletedClaudeInChromeOnboarding": true,
        "claudeInChromeDefaultEnabled": false,
        "sonnet45MigrationComplete": true,
        "opus45MigrationComplete": true,
        "thinkingMigrationComplete": true,
        "hasShownOpus45Notice": {},
        "hasShownOpus46Notice": {},
        "opusProMigrationComplete": true,
        "opus46FeedSeenCount": 100,
        "sonnet1m45MigrationComplete": true,
        "lastReleaseNotesSeen": "99.0.0",
        "lastOnboardingVersion": "99.0.0",
        "oauthAccount": {
            "displayName": "wt",
            "emailAddress": "demo@example.com",
        },
        "customApiKeyResponses": {
            "approved": approved,
            "rejected": [],
        },
        "officialMarketplaceAutoInstalled": true,
        "effortCalloutDismissed": true,
        "lspRecommendationDisabled": true,
        "tipsHistory": {
            "new-user-warmup": 100,
            "terminal-setup": 100,
            "theme-command": 100,
            "fast-mode-2026-02-01": 100,
            "adaptive-thinking-2026-01-28": 100,
            "prompt-caching-scope-2026-01-05": 100,
            "plan-mode-for-complex-tasks": 100,
            "memory-command": 100,
            "todo-list": 100,
            "stickers-command": 100,
            "status-line": 100,
            "custom-commands": 100,
            "custom-agents": 100,
            "permissions": 100,
            "git-worktrees": 100,
        },
        "projects": projects,
    })
}

fn settings_json(allowed_tools: &[String]) -> Value {
    json!({
        "permissions": { "allow": allowed_tools, "deny": [], "ask": [] },
        "model": DEMO_MODEL,
        "statusLine": {
            "type": "command",
            "command": STATUS_LINE_COMMAND,
        },
    })
}

fn write_json(path: &Path, value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    write_file(path, &text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_suffix_keeps_last_twenty_chars() {
        let key = "sk-ant-REDACTED";
        assert_eq!(
            api_key_suffix(Some(key)).as_deref(),
            Some("abcdefghijKLMNOPQRST")
        );
        assert_eq!(api_key_suffix(Some("short")).as_deref(), Some("short"));
        assert_eq!(api_key_suffix(Some("")), None);
        assert_eq!(api_key_suffix(None), None);
    }

    #[test]
    fn writes_state_settings_and_binary() {
        let temp = tempfile::tempdir().expect("tempdir");
        let env = DemoEnv::new("claude", temp.path());
        let worktree = env.worktree("alpha");
        fs::create_dir_all(&worktree).expect("worktree");
        let binary = temp.path().join("claude-bin");
        fs::write(&binary, "#!/bin/sh\n").expect("binary");

        let worktrees = vec![worktree.clone()];
        let tools = vec!["Bash(cargo test:*)".to_string()];
        let setup = ClaudeSetup {
            worktree_paths: &worktrees,
            allowed_tools: &tools,
            api_key: Some("sk-ant-REDACTED"),
        };
        setup_claude_config(&env, &setup, &binary).expect("setup");

        let state: Value = serde_json::from_str(
            &fs::read_to_string(env.home().join(".claude.json")).expect("read"),
        )
        .expect("json");
        assert_eq!(state["hasCompletedOnboarding"], json!(true));
        let key = fs::canonicalize(&worktree).expect("canonical");
        assert_eq!(
            state["projects"][key.display().to_string()]["hasTrustDialogAccepted"],
            json!(true)
        );
        assert_eq!(
            state["customApiKeyResponses"]["approved"][0]
                .as_str()
                .map(str::len),
            Some(20)
        );

        let settings: Value = serde_json::from_str(
            &fs::read_to_string(env.home().join(".claude/settings.json")).expect("read"),
        )
        .expect("json");
        assert_eq!(settings["model"], json!(DEMO_MODEL));
        assert_eq!(settings["permissions"]["allow"], json!(tools));
        assert_eq!(settings["statusLine"]["command"], json!(STATUS_LINE_COMMAND));
        assert!(env.bin_dir().join("claude").exists());
    }

    #[test]
    fn no_api_key_means_no_approvals() {
        let state = claude_json(&ClaudeSetup::default());
        assert_eq!(state["customApiKeyResponses"]["approved"], json!([]));
        assert_eq!(state["projects"], json!({}));
    }
}
