//! Generation client: rate limiting, throttle retry, malformed-reply recovery.
//!
//! # Retry contract
//!
//! - A throttled call (local limiter or upstream) waits the configured cooldown
//!   and is retried exactly once. A second throttle is returned as
//!   [`GenerationError::Throttled`].
//! - A structured reply that cannot be parsed triggers exactly one
//!   regeneration with the parse error and the required shape restated. If that
//!   reply is malformed too, or the regeneration is throttled twice, the
//!   caller receives [`Structured::Degraded`] with the raw text.
//! - Transport failures are never retried; they usually mean a bad backend
//!   configuration.
use super::backend::{CallOutcome, CommandBackend, GenerationBackend};
use super::gemini::GeminiBackend;
use super::rate_limit::RateLimiter;
use super::response::{parse_structured, ResponseShape};
use crate::config::{BackendConfig, WorkflowConfig};
use crate::error::GenerationError;
use crate::templates::{fill, CONFORM_PROMPT_MD};
use crate::util::truncate_string;
use anyhow::Result;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PREVIOUS_RESPONSE_LIMIT: usize = 1000;

/// A structured reply, or the raw text when it could not be parsed twice.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured<T> {
    Parsed(T),
    Degraded { raw: String, reason: String },
}

pub struct GenerationClient {
    backend: Box<dyn GenerationBackend>,
    limiter: Arc<RateLimiter>,
    cooldown: Duration,
}

impl GenerationClient {
    pub fn new(
        backend: Box<dyn GenerationBackend>,
        limiter: Arc<RateLimiter>,
        cooldown: Duration,
    ) -> Self {
        Self {
            backend,
            limiter,
            cooldown,
        }
    }

    /// Build the configured backend around a shared limiter.
    pub fn from_config(config: &WorkflowConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let backend: Box<dyn GenerationBackend> = match &config.backend {
            BackendConfig::Command { command } => Box::new(CommandBackend::new(command)?),
            BackendConfig::Gemini {
                endpoint,
                model,
                api_key_env,
                timeout_secs,
            } => Box::new(GeminiBackend::new(
                endpoint,
                model,
                api_key_env,
                Duration::from_secs(*timeout_secs),
            )?),
        };
        Ok(Self::new(
            backend,
            limiter,
            Duration::from_millis(config.rate_limit.cooldown_ms),
        ))
    }

    /// Free-text generation.
    pub fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        retry_once(self.cooldown, || self.attempt(prompt))
    }

    /// Generation that must return a JSON object of `shape`.
    pub fn generate_structured<T: DeserializeOwned>(
        &self,
        prompt: &str,
        shape: &ResponseShape,
    ) -> Result<Structured<T>, GenerationError> {
        let raw = self.generate(prompt)?;
        let error = match parse_structured::<T>(&raw, shape) {
            Ok(value) => return Ok(Structured::Parsed(value)),
            Err(err) => err,
        };
        tracing::warn!(shape = shape.name, %error, "malformed reply; regenerating once");

        let retry_prompt = build_conform_prompt(prompt, shape, &error.to_string(), &raw);
        let retry_raw = match self.generate(&retry_prompt) {
            Ok(text) => text,
            Err(GenerationError::Throttled { attempts }) => {
                tracing::warn!(
                    shape = shape.name,
                    attempts,
                    "regeneration throttled; degrading to the first reply"
                );
                return Ok(degrade(error, raw));
            }
            Err(err) => return Err(err),
        };
        match parse_structured::<T>(&retry_raw, shape) {
            Ok(value) => {
                tracing::info!(shape = shape.name, "regeneration produced a valid reply");
                Ok(Structured::Parsed(value))
            }
            Err(error) => {
                tracing::warn!(shape = shape.name, %error, "reply still malformed; degrading to raw text");
                Ok(degrade(error, retry_raw))
            }
        }
    }

    fn attempt(&self, prompt: &str) -> Result<CallOutcome> {
        if !self.limiter.try_acquire() {
            tracing::debug!("local rate limit reached");
            return Ok(CallOutcome::Throttled);
        }
        let start = Instant::now();
        let outcome = self.backend.complete(prompt)?;
        tracing::info!(
            backend = self.backend.label(),
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = prompt.len(),
            response_bytes = match &outcome {
                CallOutcome::Text(text) => text.len(),
                CallOutcome::Throttled => 0,
            },
            throttled = matches!(outcome, CallOutcome::Throttled),
            quota_left = self.limiter.remaining(),
            "lm invoke complete"
        );
        Ok(outcome)
    }
}

/// Single deterministic retry on throttling.
pub fn retry_once<F>(cooldown: Duration, mut call: F) -> Result<String, GenerationError>
where
    F: FnMut() -> Result<CallOutcome>,
{
    match call().map_err(GenerationError::Transport)? {
        CallOutcome::Text(text) => return Ok(text),
        CallOutcome::Throttled => {}
    }
    tracing::warn!(
        cooldown_ms = cooldown.as_millis(),
        "generation throttled; waiting before the single retry"
    );
    thread::sleep(cooldown);
    match call().map_err(GenerationError::Transport)? {
        CallOutcome::Text(text) => Ok(text),
        CallOutcome::Throttled => Err(GenerationError::Throttled { attempts: 2 }),
    }
}

/// Degraded result carrying the reply the parse error was raised for.
fn degrade<T>(error: GenerationError, fallback_raw: String) -> Structured<T> {
    let reason = error.to_string();
    let raw = match error {
        GenerationError::Malformed { raw, .. } => raw,
        _ => fallback_raw,
    };
    Structured::Degraded { raw, reason }
}

fn build_conform_prompt(
    original_prompt: &str,
    shape: &ResponseShape,
    error: &str,
    previous_response: &str,
) -> String {
    let mut previous = truncate_string(previous_response, PREVIOUS_RESPONSE_LIMIT);
    if previous.len() < previous_response.len() {
        previous.push_str("...(truncated)");
    }
    fill(
        CONFORM_PROMPT_MD,
        &[
            ("error", error),
            ("previous_response", previous.as_str()),
            ("shape_example", shape.example),
            ("original_prompt", original_prompt),
        ],
    )
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
