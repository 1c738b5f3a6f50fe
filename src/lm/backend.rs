//! Generation backends.
//!
//! A backend performs exactly one request and reports either the reply text
//! or that the upstream throttled it. Retry policy lives in the client.
use anyhow::{anyhow, Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Exit status a command backend uses to signal throttling (`EX_TEMPFAIL`).
pub const THROTTLED_EXIT_CODE: i32 = 75;

/// Outcome of a single generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    Text(String),
    Throttled,
}

pub trait GenerationBackend: Send + Sync {
    /// Send one prompt. Transport failures are errors; throttling is not.
    fn complete(&self, prompt: &str) -> Result<CallOutcome>;

    /// Short label for logs.
    fn label(&self) -> &str;
}

/// Runs a user-configured command with the prompt on stdin.
///
/// The command can be any tool that reads text and writes text (`llm`,
/// `ollama run <model>`, a wrapper script).
#[derive(Debug, Clone)]
pub struct CommandBackend {
    argv: Vec<String>,
}

impl CommandBackend {
    pub fn new(command: &str) -> Result<Self> {
        let argv =
            shell_words::split(command).with_context(|| format!("parse LM command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("LM command is empty"));
        }
        Ok(Self { argv })
    }
}

impl GenerationBackend for CommandBackend {
    fn complete(&self, prompt: &str) -> Result<CallOutcome> {
        let start = Instant::now();
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("spawn LM command: {}", self.argv[0]))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .context("write prompt to LM stdin")?;
        }

        let output = child.wait_with_output().context("wait for LM command")?;
        let elapsed_ms = start.elapsed().as_millis();

        tracing::debug!(
            elapsed_ms,
            exit = ?output.status.code(),
            response_bytes = output.stdout.len(),
            "lm command finished"
        );

        if output.status.code() == Some(THROTTLED_EXIT_CODE) {
            return Ok(CallOutcome::Throttled);
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "LM command failed with status {}: {}",
                output.status,
                stderr.trim()
            ));
        }

        let text = String::from_utf8(output.stdout).context("decode LM stdout as UTF-8")?;
        Ok(CallOutcome::Text(text))
    }

    fn label(&self) -> &str {
        &self.argv[0]
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn command_backend_echoes_stdin() {
        let backend = CommandBackend::new("cat").expect("build backend");
        let outcome = backend.complete("hello there").expect("run cat");
        assert_eq!(outcome, CallOutcome::Text("hello there".to_string()));
    }

    #[test]
    fn exit_75_reports_throttled() {
        let backend = CommandBackend::new("sh -c 'cat >/dev/null; exit 75'").expect("build");
        assert_eq!(backend.complete("x").expect("run"), CallOutcome::Throttled);
    }

    #[test]
    fn other_failures_are_errors() {
        let backend = CommandBackend::new("sh -c 'cat >/dev/null; echo boom >&2; exit 3'")
            .expect("build");
        let err = backend.complete("x").expect_err("non-zero exit");
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(CommandBackend::new("").is_err());
    }
}
