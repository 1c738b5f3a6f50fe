use crate::error::WorkflowError;
use crate::ledger::VersionLedger;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Workflow position. Every status has exactly one route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Intake,
    Submitted,
    Classified,
    Editing,
    AssessingRelevance,
    Reviewing,
    NeedsRevision,
    AwaitingHumanApproval,
    Approved,
}

impl Status {
    pub const ALL: [Status; 9] = [
        Status::Intake,
        Status::Submitted,
        Status::Classified,
        Status::Editing,
        Status::AssessingRelevance,
        Status::Reviewing,
        Status::NeedsRevision,
        Status::AwaitingHumanApproval,
        Status::Approved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Intake => "intake",
            Status::Submitted => "submitted",
            Status::Classified => "classified",
            Status::Editing => "editing",
            Status::AssessingRelevance => "assessing_relevance",
            Status::Reviewing => "reviewing",
            Status::NeedsRevision => "needs_revision",
            Status::AwaitingHumanApproval => "awaiting_human_approval",
            Status::Approved => "approved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| WorkflowError::UnhandledStatus {
                status: s.to_string(),
                reason: "not a known workflow status".to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    IndustryNews,
    Personal,
}

impl ContentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::IndustryNews => "industry_news",
            ContentCategory::Personal => "personal",
        }
    }

    /// Lenient match on classifier output (`industry_news`, `Industry News`).
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "industry_news" => Some(ContentCategory::IndustryNews),
            "personal" => Some(ContentCategory::Personal),
            _ => None,
        }
    }
}

/// Everything one run knows. Stages change it only through
/// [`WorkflowState::apply`]; the driver owns the iteration count.
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub draft: String,
    pub original_draft: Option<String>,
    /// Latest human submission; what the writer rewrites.
    pub source_draft: String,
    pub ledger: VersionLedger,
    pub review_history: Vec<String>,
    pub status: Status,
    pub feedback: String,
    pub iteration_count: u32,
    pub content_category: Option<ContentCategory>,
    pub relevance_score: Option<u32>,
    pub relevance_note: String,
    pub started_at: Option<Instant>,
    pub started_at_epoch_ms: Option<u64>,
    pub review_approved_after: Option<Duration>,
    pub last_candidate: Option<String>,
    pub forced_approval: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FeedbackUpdate {
    #[default]
    Keep,
    /// Add to the current revision cycle.
    Append(String),
    /// Start a new revision cycle.
    Reset(String),
}

/// Changes a stage asks the driver to merge.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub status: Status,
    pub draft: Option<String>,
    /// Ignored once an original is sealed.
    pub original_draft: Option<String>,
    pub source_draft: Option<String>,
    pub version: Option<String>,
    /// Rejection reason for the latest version.
    pub rejection_reason: Option<String>,
    pub review_entry: Option<String>,
    pub feedback: FeedbackUpdate,
    pub content_category: Option<ContentCategory>,
    pub relevance: Option<(Option<u32>, String)>,
    pub started: Option<(Instant, u64)>,
    pub review_approved_after: Option<Duration>,
    pub last_candidate: Option<String>,
}

impl StateDelta {
    pub fn to(status: Status) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn append_feedback(mut self, text: impl Into<String>) -> Self {
        self.feedback = FeedbackUpdate::Append(text.into());
        self
    }

    pub fn reset_feedback(mut self, text: impl Into<String>) -> Self {
        self.feedback = FeedbackUpdate::Reset(text.into());
        self
    }
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one stage invocation and return the new count.
    pub fn begin_stage(&mut self) -> u32 {
        self.iteration_count += 1;
        self.iteration_count
    }

    pub fn force_approval(&mut self) {
        self.status = Status::Approved;
        self.forced_approval = true;
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|started| started.elapsed())
    }

    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(original) = delta.original_draft {
            if self.original_draft.is_none() {
                self.original_draft = Some(original);
            } else {
                tracing::debug!("original draft already sealed; keeping it");
            }
        }
        if let Some(draft) = delta.draft {
            self.draft = draft;
        }
        if let Some(source) = delta.source_draft {
            self.source_draft = source;
        }
        if let Some(version) = delta.version {
            self.ledger.push(version);
        }
        if let Some(reason) = delta.rejection_reason {
            self.ledger.add_reason_to_latest(reason);
        }
        if let Some(entry) = delta.review_entry {
            self.review_history.push(entry);
        }
        match delta.feedback {
            FeedbackUpdate::Keep => {}
            FeedbackUpdate::Append(text) => append_paragraph(&mut self.feedback, &text),
            FeedbackUpdate::Reset(text) => self.feedback = text,
        }
        if let Some(category) = delta.content_category {
            self.content_category = Some(category);
        }
        if let Some((score, note)) = delta.relevance {
            self.relevance_score = score;
            self.relevance_note = note;
        }
        if let Some((instant, epoch_ms)) = delta.started {
            if self.started_at.is_none() {
                self.started_at = Some(instant);
                self.started_at_epoch_ms = Some(epoch_ms);
            }
        }
        if let Some(elapsed) = delta.review_approved_after {
            self.review_approved_after = Some(elapsed);
        }
        if let Some(candidate) = delta.last_candidate {
            self.last_candidate = Some(candidate);
        }
        self.status = delta.status;
    }
}

fn append_paragraph(target: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push_str("\n\n");
    }
    target.push_str(text);
}
