use super::{reference_draft, StageContext};
use crate::error::{GenerationError, WorkflowError};
use crate::gates::assess_relevance;
use crate::prompts::relevance_prompt;
use crate::workflow::state::{StateDelta, Status, WorkflowState};

/// Advisory only: always advances to review.
pub(super) fn run(
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    let prompt = relevance_prompt(ctx.config, reference_draft(state), &state.draft);
    let assessment = match assess_relevance(ctx.client, &prompt, ctx.config.relevance) {
        Ok(assessment) => assessment,
        Err(GenerationError::Throttled { attempts }) => {
            let note = format!("Relevance check skipped: throttled after {attempts} attempts.");
            tracing::warn!(%note);
            return Ok(StateDelta {
                relevance: Some((None, note.clone())),
                ..StateDelta::to(Status::Reviewing).append_feedback(note)
            });
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(score = ?assessment.score, pass = assessment.gate.pass, "relevance assessed");
    let delta = StateDelta {
        relevance: Some((assessment.score, assessment.note)),
        ..StateDelta::to(Status::Reviewing)
    };
    Ok(if assessment.gate.pass {
        delta
    } else {
        delta.append_feedback(assessment.gate.detail)
    })
}
