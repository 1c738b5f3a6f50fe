//! Score extraction from reviewer text.
//!
//! Reviewers do not always honor the requested JSON shape, so the score is
//! recovered by an ordered list of matchers. The first matcher that recognizes
//! the text wins. No match yields [`SCORE_FLOOR`] and a logged
//! [`ScoreParseMiss`].
use crate::error::ScoreParseMiss;
use crate::lm::extract_json;
use crate::util::preview;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::LazyLock;

/// Worst-case score used when nothing matches.
pub const SCORE_FLOOR: u32 = 0;

/// One strategy for reading a numeric score out of free text.
pub trait TextScoreMatcher: Send + Sync {
    fn name(&self) -> &'static str;
    fn match_score(&self, text: &str) -> Option<u32>;
}

/// Reads a numeric field from a JSON object embedded in the text.
pub struct JsonFieldMatcher {
    fields: &'static [&'static str],
}

impl TextScoreMatcher for JsonFieldMatcher {
    fn name(&self) -> &'static str {
        "json_field"
    }

    fn match_score(&self, text: &str) -> Option<u32> {
        let value: Value = serde_json::from_str(extract_json(text)).ok()?;
        self.fields
            .iter()
            .find_map(|field| value.get(*field).and_then(score_from_value))
    }
}

/// Captures the score from the first group of a regex.
pub struct RegexScoreMatcher {
    name: &'static str,
    pattern: Regex,
}

impl RegexScoreMatcher {
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }
}

impl TextScoreMatcher for RegexScoreMatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    fn match_score(&self, text: &str) -> Option<u32> {
        self.pattern.captures_iter(text).find_map(|caps| {
            let score: u32 = caps.get(1)?.as_str().parse().ok()?;
            // Fractions must not exceed their denominator.
            match caps.get(2).and_then(|d| d.as_str().parse::<u32>().ok()) {
                Some(denominator) if score > denominator => None,
                _ => Some(score),
            }
        })
    }
}

static DEFAULT_MATCHERS: LazyLock<Vec<Box<dyn TextScoreMatcher>>> = LazyLock::new(|| {
    vec![
        Box::new(JsonFieldMatcher {
            fields: &["overall_score", "score", "relevance_score"],
        }),
        Box::new(
            RegexScoreMatcher::new("labelled", r"(?i)\bscore\b\s*\**\s*[:=]\s*\**\s*(\d+)")
                .expect("regex for labelled score"),
        ),
        Box::new(
            RegexScoreMatcher::new("score_is", r"(?i)\bscore\s+(?:is|of)\s*\**\s*(\d+)")
                .expect("regex for 'score is' phrasing"),
        ),
        Box::new(
            RegexScoreMatcher::new("fraction", r"\b(\d+)\s*/\s*(\d+)\b")
                .expect("regex for fractional score"),
        ),
    ]
});

/// Matchers in priority order.
pub fn default_matchers() -> &'static [Box<dyn TextScoreMatcher>] {
    &DEFAULT_MATCHERS
}

pub fn extract_score(
    text: &str,
    matchers: &[Box<dyn TextScoreMatcher>],
) -> Result<u32, ScoreParseMiss> {
    for matcher in matchers {
        if let Some(score) = matcher.match_score(text) {
            tracing::debug!(matcher = matcher.name(), score, "score extracted");
            return Ok(score);
        }
    }
    Err(ScoreParseMiss {
        preview: preview(text, 160),
    })
}

/// Like [`extract_score`], but a miss is logged and scored as the floor.
pub fn extract_score_or_floor(text: &str, matchers: &[Box<dyn TextScoreMatcher>]) -> u32 {
    match extract_score(text, matchers) {
        Ok(score) => score,
        Err(miss) => {
            tracing::warn!(%miss, floor = SCORE_FLOOR, "score parse miss");
            SCORE_FLOOR
        }
    }
}

fn score_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Deserialize a score sent as a number or a numeric string.
pub(crate) fn lenient_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    score_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a numeric score, got {value}")))
}
