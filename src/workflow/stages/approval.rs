use super::StageContext;
use crate::error::WorkflowError;
use crate::gates::char_count;
use crate::workflow::state::{StateDelta, Status, WorkflowState};

const SILENT_REJECTION: &str = "The author rejected the draft without comments. Try a different angle.";

pub(super) fn run(
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    ctx.human.notify(&format!(
        "\nFinal draft ({} characters):\n\n{}\n",
        char_count(&state.draft),
        state.draft
    ))?;
    if ctx.human.collect_yes_no("Approve this draft?")? {
        tracing::info!("author approved the draft");
        return Ok(StateDelta::to(Status::Approved));
    }

    let text = ctx
        .human
        .collect_multiline_text("What should change in the next revision?")?;
    let feedback = if text.is_empty() {
        SILENT_REJECTION.to_string()
    } else {
        text
    };
    tracing::info!("author rejected the draft");
    Ok(StateDelta {
        rejection_reason: Some(feedback.clone()),
        ..StateDelta::to(Status::NeedsRevision).reset_feedback(feedback)
    })
}
