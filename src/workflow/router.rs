use super::state::{Status, WorkflowState};
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Intake,
    Classify,
    Generate,
    AssessRelevance,
    Review,
    FinalApproval,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Intake => "intake",
            StageKind::Classify => "classify",
            StageKind::Generate => "generate",
            StageKind::AssessRelevance => "assess_relevance",
            StageKind::Review => "review",
            StageKind::FinalApproval => "final_approval",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Approved,
    /// The hard cap forced the status to approved.
    ForcedApproval,
    SoftCapReached,
}

impl Termination {
    pub fn as_str(self) -> &'static str {
        match self {
            Termination::Approved => "approved",
            Termination::ForcedApproval => "forced_approval",
            Termination::SoftCapReached => "soft_cap_reached",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stage(StageKind),
    Terminate(Termination),
}

/// Pick the next stage for `state`.
///
/// An approved state terminates. Otherwise the soft cap is checked before any
/// stage is chosen; past it the run ends without approval.
pub fn route(state: &WorkflowState, config: &WorkflowConfig) -> Result<Route, WorkflowError> {
    let stage = match state.status {
        Status::Approved if state.forced_approval => {
            return Ok(Route::Terminate(Termination::ForcedApproval))
        }
        Status::Approved => return Ok(Route::Terminate(Termination::Approved)),
        _ if state.iteration_count > config.caps.soft => {
            tracing::info!(
                iteration = state.iteration_count,
                soft_cap = config.caps.soft,
                status = %state.status,
                "soft cap exceeded"
            );
            return Ok(Route::Terminate(Termination::SoftCapReached));
        }
        Status::Intake => StageKind::Intake,
        Status::Submitted if config.stages.classify => StageKind::Classify,
        Status::Submitted => StageKind::Generate,
        Status::Classified | Status::Editing | Status::NeedsRevision => StageKind::Generate,
        Status::AssessingRelevance if config.stages.assess_relevance => StageKind::AssessRelevance,
        Status::AssessingRelevance => {
            return Err(WorkflowError::UnhandledStatus {
                status: state.status.to_string(),
                reason: "relevance assessment is disabled".to_string(),
            })
        }
        Status::Reviewing => StageKind::Review,
        Status::AwaitingHumanApproval => StageKind::FinalApproval,
    };
    tracing::debug!(status = %state.status, %stage, "routed");
    Ok(Route::Stage(stage))
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
