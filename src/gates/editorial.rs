use super::punctuation::sentence_fragments;
use super::score::{default_matchers, extract_score_or_floor, lenient_score};
use super::GateOutcome;
use crate::config::ScoreThreshold;
use crate::error::GenerationError;
use crate::lm::{extract_json, plain_text, GenerationClient, ResponseShape, Structured};
use serde::Deserialize;
use serde_json::Value;

const KEY_POINT_COUNT: usize = 3;

pub const EDITORIAL_SHAPE: ResponseShape = ResponseShape {
    name: "editorial",
    required_fields: &["feedback", "overall_score"],
    example: r#"{"feedback": "your feedback", "overall_score": 4}"#,
};

#[derive(Debug, Clone, Deserialize)]
pub struct EditorialReply {
    pub feedback: String,
    #[serde(deserialize_with = "lenient_score")]
    pub overall_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorialAssessment {
    pub score: u32,
    /// Reviewer remarks as written, without the gate framing.
    pub feedback: String,
    pub gate: GateOutcome,
    /// True when the score came from the matchers instead of a parsed reply.
    pub degraded: bool,
}

pub fn assess_editorial(
    client: &GenerationClient,
    prompt: &str,
    threshold: ScoreThreshold,
) -> Result<EditorialAssessment, GenerationError> {
    let reply = client.generate_structured::<EditorialReply>(prompt, &EDITORIAL_SHAPE)?;
    Ok(evaluate_editorial(reply, threshold))
}

pub fn evaluate_editorial(
    reply: Structured<EditorialReply>,
    threshold: ScoreThreshold,
) -> EditorialAssessment {
    let (score, feedback, degraded) = match reply {
        Structured::Parsed(reply) => (reply.overall_score, reply.feedback.trim().to_string(), false),
        Structured::Degraded { raw, reason } => {
            tracing::warn!(%reason, "editorial reply degraded; scoring raw text");
            let score = extract_score_or_floor(&raw, default_matchers());
            (score, degraded_feedback(&raw), true)
        }
    };

    let gate = if score >= threshold.threshold {
        GateOutcome::passed()
    } else {
        GateOutcome::failed(format!(
            "Editorial review scored {score}/{max}; at least {min} is required.\n\
Reviewer feedback:\n{feedback}",
            max = threshold.scale_max,
            min = threshold.threshold,
        ))
    };
    tracing::info!(score, pass = gate.pass, degraded, "editorial assessment");
    EditorialAssessment {
        score,
        feedback,
        gate,
        degraded,
    }
}

/// The first sentences of the original draft, which a revision must keep.
pub fn key_points(original: &str) -> String {
    sentence_fragments(original)
        .into_iter()
        .take(KEY_POINT_COUNT)
        .collect::<Vec<_>>()
        .join(" ")
}

fn degraded_feedback(raw: &str) -> String {
    serde_json::from_str::<Value>(extract_json(raw))
        .ok()
        .and_then(|value| {
            value
                .get("feedback")
                .and_then(Value::as_str)
                .map(|text| text.trim().to_string())
        })
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| plain_text(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gates::score::SCORE_FLOOR;

    const THRESHOLD: ScoreThreshold = ScoreThreshold {
        threshold: 4,
        scale_max: 5,
    };

    fn degraded(raw: &str) -> Structured<EditorialReply> {
        Structured::Degraded {
            raw: raw.to_string(),
            reason: "missing required field(s): overall_score".to_string(),
        }
    }

    #[test]
    fn parsed_reply_at_threshold_passes() {
        let reply = Structured::Parsed(EditorialReply {
            feedback: "Strong hook.".to_string(),
            overall_score: 4,
        });
        let assessment = evaluate_editorial(reply, THRESHOLD);
        assert!(assessment.gate.pass);
        assert_eq!(assessment.feedback, "Strong hook.");
        assert!(!assessment.degraded);
    }

    #[test]
    fn failing_score_embeds_reviewer_feedback() {
        let reply = Structured::Parsed(EditorialReply {
            feedback: "The ending is salesy.".to_string(),
            overall_score: 2,
        });
        let assessment = evaluate_editorial(reply, THRESHOLD);
        assert!(!assessment.gate.pass);
        assert!(assessment.gate.detail.contains("scored 2/5"));
        assert!(assessment.gate.detail.contains("The ending is salesy."));
    }

    #[test]
    fn degraded_reply_uses_matchers_and_feedback_field() {
        let assessment = evaluate_editorial(
            degraded(r#"{"feedback": "Tighten the middle. Score: 5"}"#),
            THRESHOLD,
        );
        assert_eq!(assessment.score, 5);
        assert_eq!(assessment.feedback, "Tighten the middle. Score: 5");
        assert!(assessment.degraded);
    }

    #[test]
    fn unscorable_reply_gets_floor_and_fails() {
        let assessment = evaluate_editorial(degraded("Looks okay overall."), THRESHOLD);
        assert_eq!(assessment.score, SCORE_FLOOR);
        assert!(!assessment.gate.pass);
        assert_eq!(assessment.feedback, "Looks okay overall.");
    }

    #[test]
    fn key_points_are_first_three_sentences() {
        let original = "We shipped. It broke! Was it DNS? Of course. The end.";
        assert_eq!(key_points(original), "We shipped. It broke! Was it DNS?");
        assert_eq!(key_points(""), "");
    }
}
