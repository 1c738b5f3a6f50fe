//! Workflow configuration.
//!
//! The config is a single JSON document passed explicitly into the client and
//! the stages; nothing reads ambient globals. Missing fields fall back to the
//! defaults so a config file only needs the values it changes.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Environment override for the generation backend command.
pub const LM_COMMAND_ENV: &str = "DRAFTLOOP_LM_COMMAND";

const CONFIG_DIR_NAME: &str = "draftloop";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkflowConfig {
    pub schema_version: u32,
    pub length: LengthWindow,
    pub punctuation: PunctuationCeiling,
    pub editorial: ScoreThreshold,
    pub relevance: ScoreThreshold,
    pub caps: IterationCaps,
    pub rate_limit: RateLimitConfig,
    pub stages: StageToggles,
    pub backend: BackendConfig,
    pub persona: Persona,
}

/// Inclusive length window, counted in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LengthWindow {
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PunctuationCeiling {
    pub marker: char,
    pub max_count: usize,
}

/// Pass line on an ordinal `1..=scale_max` scale; scores at or above pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ScoreThreshold {
    pub threshold: u32,
    pub scale_max: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IterationCaps {
    /// Past this many stage invocations the run is force-approved.
    pub hard: u32,
    /// Past this many stage invocations the router ends the run.
    pub soft: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    pub calls: u32,
    pub window_secs: u64,
    /// Wait before the single retry of a throttled call.
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct StageToggles {
    pub classify: bool,
    pub assess_relevance: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum BackendConfig {
    /// Local command: prompt on stdin, reply on stdout.
    Command { command: String },
    /// Gemini `generateContent` over HTTPS.
    Gemini {
        endpoint: String,
        model: String,
        api_key_env: String,
        timeout_secs: u64,
    },
}

/// Author profile woven into the writer and editor prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Persona {
    pub name: String,
    pub writing_style: String,
    pub audience: String,
    pub interests: Vec<String>,
    pub post_topics: Vec<String>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        default_config()
    }
}

impl Default for Persona {
    fn default() -> Self {
        Persona {
            name: "Alex Rivera".to_string(),
            writing_style: "Casual and informative, occasionally humorous, enjoys debate."
                .to_string(),
            audience: "Tech professionals, software developers, entrepreneurs".to_string(),
            interests: vec![
                "software development".to_string(),
                "cybersecurity".to_string(),
                "new gadgets".to_string(),
            ],
            post_topics: vec![
                "industry news".to_string(),
                "engineering lessons".to_string(),
                "tooling opinions".to_string(),
            ],
        }
    }
}

/// Build the default config used when no file is present.
pub fn default_config() -> WorkflowConfig {
    WorkflowConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        length: LengthWindow { min: 450, max: 500 },
        punctuation: PunctuationCeiling {
            marker: '?',
            max_count: 1,
        },
        editorial: ScoreThreshold {
            threshold: 4,
            scale_max: 5,
        },
        relevance: ScoreThreshold {
            threshold: 4,
            scale_max: 5,
        },
        caps: IterationCaps {
            hard: 300,
            soft: 30,
        },
        rate_limit: RateLimitConfig {
            calls: 15,
            window_secs: 60,
            cooldown_ms: 60_000,
        },
        stages: StageToggles {
            classify: true,
            assess_relevance: true,
        },
        backend: BackendConfig::Gemini {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 120,
        },
        persona: Persona::default(),
    }
}

/// Default location: `<config dir>/draftloop/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

pub fn load_config(path: &Path) -> Result<WorkflowConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: WorkflowConfig =
        serde_json::from_slice(&bytes).context("parse workflow config JSON")?;
    Ok(config)
}

pub fn write_config(path: &Path, config: &WorkflowConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize workflow config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Resolve the effective config.
///
/// An explicit path must exist. Otherwise the default location is used when
/// present, and the built-in defaults when it is not.
pub fn resolve_config(explicit: Option<&Path>) -> Result<(WorkflowConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load_config(path)?, Some(path.to_path_buf())));
    }
    match default_config_path() {
        Some(path) if path.is_file() => Ok((load_config(&path)?, Some(path))),
        _ => Ok((default_config(), None)),
    }
}

/// Apply backend overrides: the env var first, then the CLI flag.
pub fn apply_lm_override(config: &mut WorkflowConfig, cli_command: Option<&str>) {
    let env_command = env::var(LM_COMMAND_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());
    let command = cli_command
        .map(str::to_string)
        .or(env_command);
    if let Some(command) = command {
        config.backend = BackendConfig::Command { command };
    }
}

/// Validate ranges and the backend before a run starts.
pub fn validate_config(config: &WorkflowConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    let length = config.length;
    if length.min == 0 || length.min > length.max {
        return Err(anyhow!(
            "length window must satisfy 0 < min <= max (got [{}, {}])",
            length.min,
            length.max
        ));
    }
    if config.punctuation.marker.is_whitespace() {
        return Err(anyhow!("punctuation marker must not be whitespace"));
    }
    validate_threshold(&config.editorial, "editorial")?;
    validate_threshold(&config.relevance, "relevance")?;
    if config.caps.hard == 0 || config.caps.soft == 0 {
        return Err(anyhow!("iteration caps must be positive"));
    }
    if config.rate_limit.calls == 0 || config.rate_limit.window_secs == 0 {
        return Err(anyhow!("rate_limit calls and window_secs must be positive"));
    }
    validate_backend(&config.backend)
}

fn validate_threshold(threshold: &ScoreThreshold, label: &str) -> Result<()> {
    if threshold.scale_max == 0 || threshold.threshold > threshold.scale_max {
        return Err(anyhow!(
            "{label} threshold {} must lie within 0..={}",
            threshold.threshold,
            threshold.scale_max
        ));
    }
    Ok(())
}

fn validate_backend(backend: &BackendConfig) -> Result<()> {
    match backend {
        BackendConfig::Command { command } => {
            let argv = shell_words::split(command)
                .with_context(|| format!("parse LM command: {command}"))?;
            let program = argv
                .first()
                .ok_or_else(|| anyhow!("LM command is empty"))?;
            which::which(program)
                .with_context(|| format!("LM command program not found: {program}"))?;
            Ok(())
        }
        BackendConfig::Gemini {
            endpoint,
            model,
            api_key_env,
            timeout_secs,
        } => {
            if endpoint.trim().is_empty() || model.trim().is_empty() {
                return Err(anyhow!("gemini endpoint and model must be non-empty"));
            }
            if api_key_env.trim().is_empty() {
                return Err(anyhow!("gemini api_key_env must be non-empty"));
            }
            if *timeout_secs == 0 {
                return Err(anyhow!("gemini timeout_secs must be positive"));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
