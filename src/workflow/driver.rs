use super::router::{route, Route, StageKind, Termination};
use super::stages::{run_stage, StageContext};
use super::state::WorkflowState;
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::human::HumanInput;
use crate::lm::GenerationClient;
use crate::report::RunReport;

/// Outcome of a single driver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Ran(StageKind),
    /// The hard cap was exceeded; the stage body was skipped.
    Forced(StageKind),
    Finished(Termination),
}

/// Owns one run: routes, applies the hard cap, runs stages, merges deltas.
pub struct Workflow<'a> {
    config: &'a WorkflowConfig,
    client: &'a GenerationClient,
    human: &'a mut dyn HumanInput,
    state: WorkflowState,
}

impl<'a> Workflow<'a> {
    pub fn new(
        config: &'a WorkflowConfig,
        client: &'a GenerationClient,
        human: &'a mut dyn HumanInput,
    ) -> Self {
        Self {
            config,
            client,
            human,
            state: WorkflowState::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn step(&mut self) -> Result<Step, WorkflowError> {
        let stage = match route(&self.state, self.config)? {
            Route::Terminate(termination) => return Ok(Step::Finished(termination)),
            Route::Stage(stage) => stage,
        };

        let iteration = self.state.begin_stage();
        if iteration > self.config.caps.hard {
            tracing::warn!(
                iteration,
                hard_cap = self.config.caps.hard,
                %stage,
                "hard cap exceeded; forcing approval"
            );
            self.state.force_approval();
            return Ok(Step::Forced(stage));
        }

        tracing::info!(iteration, %stage, status = %self.state.status, "running stage");
        let mut ctx = StageContext {
            config: self.config,
            client: self.client,
            human: &mut *self.human,
        };
        let delta = run_stage(stage, &self.state, &mut ctx)?;
        self.state.apply(delta);
        tracing::debug!(iteration, status = %self.state.status, "stage merged");
        Ok(Step::Ran(stage))
    }

    pub fn run(mut self) -> Result<RunReport, WorkflowError> {
        let termination = loop {
            if let Step::Finished(termination) = self.step()? {
                break termination;
            }
        };
        tracing::info!(
            termination = termination.as_str(),
            iterations = self.state.iteration_count,
            "workflow finished"
        );
        Ok(RunReport::from_state(&self.state, termination))
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
