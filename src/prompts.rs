//! Prompt rendering for the generation stages.
//!
//! Templates live under `prompts/` and are filled in a single placeholder
//! pass.
use crate::config::WorkflowConfig;
use crate::gates::key_points;
use crate::templates::{
    fill, CLASSIFY_PROMPT_MD, EDITORIAL_PROMPT_MD, RELEVANCE_PROMPT_MD, WRITER_PERSONAL_PROMPT_MD,
    WRITER_PROFILE_PROMPT_MD,
};
use crate::workflow::ContentCategory;

const NO_FEEDBACK: &str = "None yet.";
const NO_HISTORY: &str = "No previous versions.";

/// What the writer sees besides the config.
#[derive(Debug, Clone, Copy)]
pub struct WriterInputs<'a> {
    pub original_draft: &'a str,
    pub feedback: &'a str,
    pub version_history: &'a str,
}

pub fn classify_prompt(draft: &str) -> String {
    fill(CLASSIFY_PROMPT_MD, &[("draft", draft)])
}

/// Writer prompt. `personal` drafts get the short edit variant; everything
/// else, including unclassified drafts, gets the persona-driven one.
pub fn writer_prompt(
    config: &WorkflowConfig,
    category: Option<ContentCategory>,
    inputs: &WriterInputs<'_>,
) -> String {
    let template = match category {
        Some(ContentCategory::Personal) => WRITER_PERSONAL_PROMPT_MD,
        Some(ContentCategory::IndustryNews) | None => WRITER_PROFILE_PROMPT_MD,
    };
    let persona = &config.persona;
    let interests = persona.interests.join(", ");
    let post_topics = persona.post_topics.join(", ");
    let min_chars = config.length.min.to_string();
    let max_chars = config.length.max.to_string();
    let marker = config.punctuation.marker.to_string();
    let max_marker = config.punctuation.max_count.to_string();
    fill(
        template,
        &[
            ("persona_name", persona.name.as_str()),
            ("writing_style", persona.writing_style.as_str()),
            ("audience", persona.audience.as_str()),
            ("interests", interests.as_str()),
            ("post_topics", post_topics.as_str()),
            ("min_chars", min_chars.as_str()),
            ("max_chars", max_chars.as_str()),
            ("marker", marker.as_str()),
            ("max_marker", max_marker.as_str()),
            ("feedback", or_placeholder(inputs.feedback, NO_FEEDBACK)),
            (
                "version_history",
                or_placeholder(inputs.version_history, NO_HISTORY),
            ),
            ("original_draft", inputs.original_draft),
        ],
    )
}

pub fn relevance_prompt(config: &WorkflowConfig, original: &str, draft: &str) -> String {
    let scale_max = config.relevance.scale_max.to_string();
    let threshold = config.relevance.threshold.to_string();
    fill(
        RELEVANCE_PROMPT_MD,
        &[
            ("scale_max", scale_max.as_str()),
            ("threshold", threshold.as_str()),
            ("original_draft", original),
            ("draft", draft),
        ],
    )
}

pub fn editorial_prompt(config: &WorkflowConfig, original: &str, draft: &str) -> String {
    let persona = &config.persona;
    let points = key_points(original);
    let interests = persona.interests.join(", ");
    let scale_max = config.editorial.scale_max.to_string();
    let marker = config.punctuation.marker.to_string();
    let max_marker = config.punctuation.max_count.to_string();
    fill(
        EDITORIAL_PROMPT_MD,
        &[
            ("persona_name", persona.name.as_str()),
            ("writing_style", persona.writing_style.as_str()),
            ("audience", persona.audience.as_str()),
            ("interests", interests.as_str()),
            ("scale_max", scale_max.as_str()),
            ("marker", marker.as_str()),
            ("max_marker", max_marker.as_str()),
            ("key_points", or_placeholder(&points, "None provided.")),
            ("original_draft", original),
            ("draft", draft),
        ],
    )
}

fn or_placeholder<'a>(text: &'a str, placeholder: &'a str) -> &'a str {
    if text.trim().is_empty() {
        placeholder
    } else {
        text
    }
}
