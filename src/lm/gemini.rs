//! Gemini `generateContent` backend.
use super::backend::{CallOutcome, GenerationBackend};
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};
use std::env;
use std::time::{Duration, Instant};

pub struct GeminiBackend {
    agent: ureq::Agent,
    url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(endpoint: &str, model: &str, api_key_env: &str, timeout: Duration) -> Result<Self> {
        let api_key = env::var(api_key_env)
            .with_context(|| format!("read Gemini API key from ${api_key_env}"))?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        let url = format!(
            "{}/models/{}:generateContent",
            endpoint.trim_end_matches('/'),
            model
        );
        Ok(Self {
            agent,
            url,
            model: model.to_string(),
            api_key,
        })
    }
}

impl GenerationBackend for GeminiBackend {
    fn complete(&self, prompt: &str) -> Result<CallOutcome> {
        let start = Instant::now();
        let body = request_body(prompt);
        let result = self
            .agent
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body);

        let mut response = match result {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(429)) => return Ok(CallOutcome::Throttled),
            Err(err) => return Err(anyhow!(err).context(format!("POST {}", self.url))),
        };
        let value: Value = response
            .body_mut()
            .read_json()
            .context("decode Gemini response JSON")?;

        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis(),
            model = %self.model,
            "gemini request finished"
        );

        let text = candidate_text(&value).unwrap_or_else(|| {
            tracing::warn!(model = %self.model, "gemini reply carried no candidate text");
            String::new()
        });
        Ok(CallOutcome::Text(text))
    }

    fn label(&self) -> &str {
        &self.model
    }
}

fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ],
        "generationConfig": {
            "temperature": 1.0,
            "topP": 0.95,
            "topK": 64,
            "maxOutputTokens": 8192
        }
    })
}

/// Join the text parts of the first candidate.
fn candidate_text(value: &Value) -> Option<String> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let text = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("");
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_text_joins_parts() {
        let value = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "{\"draft\": " }, { "text": "\"hi\"}" } ] } }
            ]
        });
        assert_eq!(candidate_text(&value).as_deref(), Some("{\"draft\": \"hi\"}"));
    }

    #[test]
    fn candidate_text_missing_candidates() {
        let value = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(candidate_text(&value), None);
    }

    #[test]
    fn request_body_carries_prompt() {
        let body = request_body("write a post");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "write a post");
    }
}
