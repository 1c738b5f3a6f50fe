//! Append-only record of drafts that passed generation.
//!
//! Index 0 holds the human's original draft. Later entries are generated
//! versions together with the reasons they were sent back. The rendered
//! history is fed to the writer so it does not repeat rejected attempts.
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionEntry {
    pub text: String,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionLedger {
    entries: Vec<VersionEntry>,
}

impl VersionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    pub fn texts(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a version and return its index.
    pub fn push(&mut self, text: impl Into<String>) -> usize {
        self.entries.push(VersionEntry {
            text: text.into(),
            reasons: Vec::new(),
        });
        self.entries.len() - 1
    }

    /// Record why the latest version was rejected. No-op on an empty ledger.
    pub fn add_reason_to_latest(&mut self, reason: impl Into<String>) -> bool {
        match self.entries.last_mut() {
            Some(entry) => {
                entry.reasons.push(reason.into());
                true
            }
            None => false,
        }
    }

    /// Generated versions with their rejection reasons, oldest first.
    ///
    /// The original draft is skipped. A latest version with no recorded reason
    /// is explained by `current_feedback`.
    pub fn render_history(&self, current_feedback: &str) -> String {
        let last = self.entries.len().saturating_sub(1);
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .map(|(index, entry)| {
                let reason = if !entry.reasons.is_empty() {
                    entry.reasons.join("\n")
                } else if index == last && !current_feedback.trim().is_empty() {
                    current_feedback.trim().to_string()
                } else {
                    "No reason recorded.".to_string()
                };
                format!(
                    "## Version {index}:\n{}\n**Reason for Rejection:** {reason}",
                    entry.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
