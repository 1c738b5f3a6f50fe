//! Typed failures for the refinement loop.
//!
//! Recoverable failures (throttling, malformed replies, score-parse misses)
//! are absorbed by the stages and turned into feedback. Only the variants of
//! [`WorkflowError`] and transport failures end a run early.
use thiserror::Error;

/// Failures reported by the generation client.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The backend was still throttled after the single retry.
    #[error("generation throttled after {attempts} attempts")]
    Throttled { attempts: u32 },

    /// The reply could not be parsed into the requested shape.
    #[error("malformed {shape} reply: {reason}")]
    Malformed {
        shape: &'static str,
        reason: String,
        raw: String,
    },

    /// The backend could not be reached or exited abnormally.
    #[error("generation backend failed: {0}")]
    Transport(#[source] anyhow::Error),
}

/// Fatal workflow failures.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("unhandled status '{status}': {reason}")]
    UnhandledStatus { status: String, reason: String },

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// No score matcher recognized the reviewer text.
#[derive(Debug, Error)]
#[error("no score pattern matched reviewer text: {preview:?}")]
pub struct ScoreParseMiss {
    pub preview: String,
}
