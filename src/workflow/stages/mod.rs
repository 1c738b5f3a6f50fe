//! One function per workflow stage.
//!
//! A stage reads the state, performs at most one external interaction, and
//! returns the changes as a [`StateDelta`]. Throttling that survives the
//! client's retry is turned into feedback here; transport failures and closed
//! human input are fatal.
mod approval;
mod classify;
mod generate;
mod intake;
mod relevance;
mod review;

use super::router::StageKind;
use super::state::{StateDelta, WorkflowState};
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::human::HumanInput;
use crate::lm::GenerationClient;

/// What a stage may use besides the state.
pub struct StageContext<'a> {
    pub config: &'a WorkflowConfig,
    pub client: &'a GenerationClient,
    pub human: &'a mut dyn HumanInput,
}

pub fn run_stage(
    stage: StageKind,
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    match stage {
        StageKind::Intake => intake::run(state, ctx),
        StageKind::Classify => classify::run(state, ctx),
        StageKind::Generate => generate::run(state, ctx),
        StageKind::AssessRelevance => relevance::run(state, ctx),
        StageKind::Review => review::run(state, ctx),
        StageKind::FinalApproval => approval::run(state, ctx),
    }
}

/// The sealed original, or the current draft before intake sealed one.
fn reference_draft(state: &WorkflowState) -> &str {
    state.original_draft.as_deref().unwrap_or(&state.draft)
}
