use super::StageContext;
use crate::error::{GenerationError, WorkflowError};
use crate::gates::{char_count, check_length, check_punctuation, normalize_whitespace};
use crate::lm::{plain_text, ResponseShape, Structured};
use crate::prompts::{writer_prompt, WriterInputs};
use crate::workflow::state::{StateDelta, Status, WorkflowState};
use serde::Deserialize;

pub const DRAFT_SHAPE: ResponseShape = ResponseShape {
    name: "draft",
    required_fields: &["draft"],
    example: r#"{"draft": "your status update"}"#,
};

#[derive(Debug, Deserialize)]
struct DraftReply {
    draft: String,
}

pub(super) fn run(
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    let config = ctx.config;
    let history = state.ledger.render_history(&state.feedback);
    let prompt = writer_prompt(
        config,
        state.content_category,
        &WriterInputs {
            original_draft: &state.source_draft,
            feedback: &state.feedback,
            version_history: &history,
        },
    );

    let raw = match ctx
        .client
        .generate_structured::<DraftReply>(&prompt, &DRAFT_SHAPE)
    {
        Ok(Structured::Parsed(reply)) => reply.draft,
        Ok(Structured::Degraded { raw, reason }) => {
            tracing::warn!(%reason, "draft reply degraded; using raw text as the draft");
            plain_text(&raw)
        }
        Err(GenerationError::Throttled { attempts }) => {
            return Ok(StateDelta::to(Status::Editing).append_feedback(format!(
                "The previous generation attempt was throttled after {attempts} attempts \
and produced no draft. Apply the feedback above to a fresh revision."
            )));
        }
        Err(err) => return Err(err.into()),
    };
    let candidate = normalize_whitespace(raw.trim());

    for gate in [
        check_punctuation(&candidate, config.punctuation),
        check_length(&candidate, config.length),
    ] {
        if !gate.pass {
            tracing::info!(chars = char_count(&candidate), "candidate failed a gate; revising");
            return Ok(StateDelta {
                last_candidate: Some(candidate),
                ..StateDelta::to(Status::Editing).append_feedback(gate.detail)
            });
        }
    }

    let next = if config.stages.assess_relevance {
        Status::AssessingRelevance
    } else {
        Status::Reviewing
    };
    tracing::info!(chars = char_count(&candidate), next = %next, "candidate accepted");
    Ok(StateDelta {
        draft: Some(candidate.clone()),
        version: Some(candidate),
        ..StateDelta::to(next).reset_feedback("")
    })
}
