//! Quality gates over candidate drafts.
//!
//! Length, punctuation and normalization are pure. The relevance and
//! editorial gates wrap one generation call each; their reply parsing is pure
//! and lives next to them.
mod editorial;
mod length;
mod normalize;
mod punctuation;
mod relevance;
mod score;

pub use editorial::{assess_editorial, key_points};
pub use length::{char_count, check_length};
pub use normalize::normalize_whitespace;
pub use punctuation::check_punctuation;
pub use relevance::assess_relevance;

/// Result of a gate: pass/fail plus feedback the next attempt can act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub pass: bool,
    pub detail: String,
}

impl GateOutcome {
    pub fn passed() -> Self {
        Self {
            pass: true,
            detail: String::new(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            pass: false,
            detail: detail.into(),
        }
    }
}
