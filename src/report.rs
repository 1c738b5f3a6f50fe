//! Run summary printed at the end of a workflow.
use crate::gates::char_count;
use crate::ledger::VersionLedger;
use crate::util::format_duration;
use crate::workflow::{ContentCategory, Status, Termination, WorkflowState};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_draft: String,
    pub final_length: usize,
    pub status: Status,
    pub termination: Termination,
    pub iteration_count: u32,
    pub versions: VersionLedger,
    pub review_history: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at_epoch_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_approved_after_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_elapsed_ms: Option<u64>,
    pub relevance_score: Option<u32>,
    pub relevance_note: String,
    pub content_category: Option<ContentCategory>,
}

impl RunReport {
    pub fn from_state(state: &WorkflowState, termination: Termination) -> Self {
        Self {
            final_draft: state.draft.clone(),
            final_length: char_count(&state.draft),
            status: state.status,
            termination,
            iteration_count: state.iteration_count,
            versions: state.ledger.clone(),
            review_history: state.review_history.clone(),
            started_at_epoch_ms: state.started_at_epoch_ms,
            review_approved_after_ms: state.review_approved_after.map(millis),
            total_elapsed_ms: state.elapsed().map(millis),
            relevance_score: state.relevance_score,
            relevance_note: state.relevance_note.clone(),
            content_category: state.content_category,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Termination: {}\n", self.termination.as_str()));
        out.push_str(&format!("Status: {}\n", self.status));
        out.push_str(&format!("Iterations: {}\n", self.iteration_count));
        if let Some(category) = self.content_category {
            out.push_str(&format!("Category: {}\n", category.as_str()));
        }
        if let Some(score) = self.relevance_score {
            out.push_str(&format!("Relevance score: {score}\n"));
        }
        if !self.relevance_note.is_empty() {
            out.push_str(&format!("Relevance note: {}\n", self.relevance_note));
        }
        if let Some(ms) = self.review_approved_after_ms {
            out.push_str(&format!(
                "Editor approved after: {}\n",
                format_duration(Duration::from_millis(ms))
            ));
        }
        if let Some(ms) = self.total_elapsed_ms {
            out.push_str(&format!("Total time: {}\n", format_duration(Duration::from_millis(ms))));
        }
        out.push_str(&format!("Versions: {}\n", self.versions.len()));
        if !self.review_history.is_empty() {
            out.push_str("\nReview history:\n");
            for (index, entry) in self.review_history.iter().enumerate() {
                out.push_str(&format!("{}. {}\n", index + 1, entry));
            }
        }
        out.push_str(&format!("\nFinal draft ({} characters):\n\n", self.final_length));
        out.push_str(&format!("{}\n", self.final_draft));
        out
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::StateDelta;

    fn approved_state() -> WorkflowState {
        let mut state = WorkflowState::new();
        state.apply(StateDelta {
            draft: Some("orig".to_string()),
            original_draft: Some("orig".to_string()),
            version: Some("orig".to_string()),
            ..StateDelta::to(Status::Submitted)
        });
        state.apply(StateDelta {
            draft: Some("polished".to_string()),
            version: Some("polished".to_string()),
            review_entry: Some("Great hook.".to_string()),
            review_approved_after: Some(Duration::from_millis(1500)),
            ..StateDelta::to(Status::Approved)
        });
        state.iteration_count = 4;
        state
    }

    #[test]
    fn report_serializes_termination_and_versions() {
        let report = RunReport::from_state(&approved_state(), Termination::Approved);
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["termination"], "approved");
        assert_eq!(value["status"], "approved");
        assert_eq!(value["iteration_count"], 4);
        assert_eq!(value["final_length"], 8);
        assert_eq!(value["versions"][1]["text"], "polished");
        assert_eq!(value["review_approved_after_ms"], 1500);
        assert!(value.get("total_elapsed_ms").is_none());
    }

    #[test]
    fn text_report_lists_reviews_and_draft() {
        let text = RunReport::from_state(&approved_state(), Termination::Approved).render_text();
        assert!(text.contains("Termination: approved"));
        assert!(text.contains("1. Great hook."));
        assert!(text.contains("Editor approved after: 0m 1.50s"));
        assert!(text.ends_with("polished\n"));
    }
}
