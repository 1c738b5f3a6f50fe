use super::{reference_draft, StageContext};
use crate::error::{GenerationError, WorkflowError};
use crate::gates::assess_editorial;
use crate::prompts::editorial_prompt;
use crate::workflow::state::{StateDelta, Status, WorkflowState};

pub(super) fn run(
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    let threshold = ctx.config.editorial;
    let prompt = editorial_prompt(ctx.config, reference_draft(state), &state.draft);
    let assessment = match assess_editorial(ctx.client, &prompt, threshold) {
        Ok(assessment) => assessment,
        Err(GenerationError::Throttled { attempts }) => {
            let note = format!(
                "Editorial review was throttled after {attempts} attempts; the draft was not reviewed."
            );
            tracing::warn!(%note);
            return Ok(StateDelta {
                review_entry: Some(note.clone()),
                ..StateDelta::to(Status::NeedsRevision).append_feedback(note)
            });
        }
        Err(err) => return Err(err.into()),
    };

    if assessment.gate.pass {
        let elapsed = state.elapsed();
        tracing::info!(
            score = assessment.score,
            degraded = assessment.degraded,
            elapsed_ms = ?elapsed.map(|d| d.as_millis()),
            "editor approved the draft"
        );
        return Ok(StateDelta {
            review_entry: Some(assessment.feedback.clone()),
            review_approved_after: elapsed,
            ..StateDelta::to(Status::AwaitingHumanApproval).reset_feedback(assessment.feedback)
        });
    }

    tracing::info!(
        score = assessment.score,
        degraded = assessment.degraded,
        "editor sent the draft back"
    );
    let reason = format!(
        "Editorial score {}/{}: {}",
        assessment.score, threshold.scale_max, assessment.feedback
    );
    Ok(StateDelta {
        review_entry: Some(assessment.feedback),
        rejection_reason: Some(reason),
        ..StateDelta::to(Status::NeedsRevision).append_feedback(assessment.gate.detail)
    })
}
