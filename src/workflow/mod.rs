//! The refinement loop: state, routing, stages and the driver.
//!
//! The driver asks the router for a route, counts the invocation, applies the
//! hard cap, runs the stage and merges its delta. Data flows between stages
//! only through [`WorkflowState`].
mod driver;
mod router;
mod stages;
mod state;

pub use driver::{Step, Workflow};
pub use router::Termination;
pub use state::{ContentCategory, StateDelta, Status, WorkflowState};
