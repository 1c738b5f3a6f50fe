//! Locating and decoding structured replies.
use crate::error::GenerationError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// The JSON object a prompt asks the service to return.
#[derive(Debug, Clone, Copy)]
pub struct ResponseShape {
    pub name: &'static str,
    pub required_fields: &'static [&'static str],
    /// Literal example restated in the regeneration prompt.
    pub example: &'static str,
}

/// Parse a reply into `T`, reporting what was wrong with it when it fails.
pub fn parse_structured<T: DeserializeOwned>(
    raw: &str,
    shape: &ResponseShape,
) -> Result<T, GenerationError> {
    let malformed = |reason: String| GenerationError::Malformed {
        shape: shape.name,
        reason,
        raw: raw.to_string(),
    };

    let json_text = extract_json(raw);
    if json_text.is_empty() {
        return Err(malformed("empty response".to_string()));
    }
    let value: Value = serde_json::from_str(json_text).map_err(|e| {
        malformed(format!(
            "invalid JSON at line {}, column {}: {e}",
            e.line(),
            e.column()
        ))
    })?;
    let object = value
        .as_object()
        .ok_or_else(|| malformed("expected a JSON object".to_string()))?;
    let missing: Vec<&str> = shape
        .required_fields
        .iter()
        .copied()
        .filter(|field| !object.contains_key(*field))
        .collect();
    if !missing.is_empty() {
        return Err(malformed(format!(
            "missing required field(s): {}",
            missing.join(", ")
        )));
    }
    serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
}

/// Extract JSON from text that might have markdown code fences or prose.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    // Prose around a bare object
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return &text[start..=end];
        }
    }

    text
}

/// Strip fences and surrounding quotes from a reply used as plain text.
pub fn plain_text(raw: &str) -> String {
    let mut text = raw.trim();
    if text.starts_with("```") {
        text = text.trim_start_matches('`');
        text = text.split_once('\n').map(|(_, rest)| rest).unwrap_or(text);
        text = text.trim_end().trim_end_matches('`');
    }
    let text = text.trim();
    let unquoted = text
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text);
    unquoted.trim().to_string()
}
