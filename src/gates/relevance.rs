use super::score::{default_matchers, extract_score, lenient_score};
use super::GateOutcome;
use crate::config::ScoreThreshold;
use crate::error::GenerationError;
use crate::lm::{plain_text, GenerationClient, ResponseShape, Structured};
use serde::Deserialize;

pub const RELEVANCE_SHAPE: ResponseShape = ResponseShape {
    name: "relevance",
    required_fields: &["relevance_score"],
    example: r#"{"relevance_score": 4, "relevance_feedback": "optional explanation"}"#,
};

#[derive(Debug, Clone, Deserialize)]
pub struct RelevanceReply {
    #[serde(deserialize_with = "lenient_score")]
    pub relevance_score: u32,
    #[serde(default)]
    pub relevance_feedback: String,
}

/// Relevance verdict. Advisory only: a failing gate adds feedback but never
/// blocks the draft by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceAssessment {
    /// `None` when no score could be read from the reply.
    pub score: Option<u32>,
    pub note: String,
    pub gate: GateOutcome,
}

pub fn assess_relevance(
    client: &GenerationClient,
    prompt: &str,
    threshold: ScoreThreshold,
) -> Result<RelevanceAssessment, GenerationError> {
    let reply = client.generate_structured::<RelevanceReply>(prompt, &RELEVANCE_SHAPE)?;
    Ok(evaluate_relevance(reply, threshold))
}

pub fn evaluate_relevance(
    reply: Structured<RelevanceReply>,
    threshold: ScoreThreshold,
) -> RelevanceAssessment {
    let (score, note) = match reply {
        Structured::Parsed(reply) => (
            Some(reply.relevance_score),
            reply.relevance_feedback.trim().to_string(),
        ),
        Structured::Degraded { raw, reason } => {
            tracing::warn!(%reason, "relevance reply degraded; trying score matchers");
            (extract_score(&raw, default_matchers()).ok(), plain_text(&raw))
        }
    };

    let gate = match score {
        Some(score) if score >= threshold.threshold => GateOutcome::passed(),
        Some(score) => {
            let mut detail = format!(
                "Relevance check: the draft scored {score}/{max}, below the threshold of {min}. \
Keep the draft closer to the themes and narrative of the initial draft.",
                max = threshold.scale_max,
                min = threshold.threshold,
            );
            if !note.is_empty() {
                detail.push_str("\nAssessor notes: ");
                detail.push_str(&note);
            }
            GateOutcome::failed(detail)
        }
        None => GateOutcome::failed(
            "Relevance check: the assessment could not be read. \
Make sure the draft stays faithful to the initial draft.",
        ),
    };
    RelevanceAssessment { score, note, gate }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: ScoreThreshold = ScoreThreshold {
        threshold: 4,
        scale_max: 5,
    };

    fn parsed(score: u32, feedback: &str) -> Structured<RelevanceReply> {
        Structured::Parsed(RelevanceReply {
            relevance_score: score,
            relevance_feedback: feedback.to_string(),
        })
    }

    #[test]
    fn score_at_threshold_passes() {
        let assessment = evaluate_relevance(parsed(4, ""), THRESHOLD);
        assert_eq!(assessment.score, Some(4));
        assert!(assessment.gate.pass);
    }

    #[test]
    fn low_score_carries_assessor_notes() {
        let assessment = evaluate_relevance(parsed(2, "Drops the outage story."), THRESHOLD);
        assert!(!assessment.gate.pass);
        assert!(assessment.gate.detail.contains("scored 2/5"));
        assert!(assessment.gate.detail.contains("Drops the outage story."));
    }

    #[test]
    fn degraded_reply_falls_back_to_matchers() {
        let reply = Structured::Degraded {
            raw: "Relevance score: 5, it keeps the story.".to_string(),
            reason: "invalid JSON".to_string(),
        };
        let assessment = evaluate_relevance(reply, THRESHOLD);
        assert_eq!(assessment.score, Some(5));
        assert!(assessment.gate.pass);
    }

    #[test]
    fn unreadable_reply_is_advisory_failure() {
        let reply = Structured::Degraded {
            raw: "It is fine I guess.".to_string(),
            reason: "empty response".to_string(),
        };
        let assessment = evaluate_relevance(reply, THRESHOLD);
        assert_eq!(assessment.score, None);
        assert!(!assessment.gate.pass);
        assert!(assessment.gate.detail.contains("could not be read"));
    }

    #[test]
    fn string_scores_deserialize() {
        let reply: RelevanceReply =
            serde_json::from_str(r#"{"relevance_score": "3"}"#).expect("reply");
        assert_eq!(reply.relevance_score, 3);
        assert!(reply.relevance_feedback.is_empty());
    }
}
