use super::StageContext;
use crate::error::WorkflowError;
use crate::util::now_epoch_ms;
use crate::workflow::state::{StateDelta, Status, WorkflowState};
use std::time::Instant;

pub(super) fn run(
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    if state.original_draft.is_none() {
        let text = ctx
            .human
            .collect_multiline_text("Enter your draft status update.")?;
        tracing::info!(chars = text.chars().count(), "draft submitted");
        return Ok(StateDelta {
            draft: Some(text.clone()),
            source_draft: Some(text.clone()),
            original_draft: Some(text.clone()),
            version: Some(text),
            started: Some((Instant::now(), now_epoch_ms())),
            ..StateDelta::to(Status::Submitted)
        });
    }

    if !state.feedback.is_empty() {
        ctx.human.notify(&format!("Feedback:\n{}\n", state.feedback))?;
    }
    let text = ctx
        .human
        .collect_multiline_text("Resubmit your draft (leave empty to keep the current one).")?;
    let draft = if text.is_empty() {
        tracing::info!("empty resubmission; keeping current draft");
        None
    } else {
        tracing::info!(chars = text.chars().count(), "draft resubmitted");
        Some(text)
    };
    Ok(StateDelta {
        source_draft: draft.clone(),
        draft,
        ..StateDelta::to(Status::Submitted).reset_feedback("")
    })
}
