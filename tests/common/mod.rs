//! Shared test infrastructure for integration tests.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

pub fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// `--lm` value that runs the scripted backend.
pub fn mock_lm_command() -> String {
    format!("sh {}", manifest_dir().join("tests/mock-lm.sh").display())
}

/// Write a config that keeps tests fast: no throttle cooldown, generous quota.
pub fn write_fast_config(dir: &Path, soft_cap: u32, classify: bool, relevance: bool) -> PathBuf {
    let config = serde_json::json!({
        "schema_version": 1,
        "caps": { "hard": 300, "soft": soft_cap },
        "rate_limit": { "calls": 1000, "window_secs": 60, "cooldown_ms": 0 },
        "stages": { "classify": classify, "assess_relevance": relevance },
        "backend": { "kind": "command", "command": mock_lm_command() }
    });
    let path = dir.join("config.json");
    std::fs::write(&path, serde_json::to_string_pretty(&config).expect("serialize config"))
        .expect("write config");
    path
}

/// Run draftloop with `stdin` piped in and a scrubbed environment.
pub fn run_draftloop(args: &[&str], stdin: &str, envs: &[(&str, &str)], home: &Path) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_draftloop"));
    command
        .args(args)
        .env_remove("DRAFTLOOP_LM_COMMAND")
        .env_remove("RUST_LOG")
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        command.env(key, value);
    }
    let mut child = command.spawn().expect("spawn draftloop");
    child
        .stdin
        .take()
        .expect("stdin pipe")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for draftloop")
}

pub fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "draftloop failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("parse JSON report")
}
