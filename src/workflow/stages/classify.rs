use super::StageContext;
use crate::error::{GenerationError, WorkflowError};
use crate::lm::{plain_text, ResponseShape, Structured};
use crate::prompts::classify_prompt;
use crate::util::preview;
use crate::workflow::state::{ContentCategory, StateDelta, Status, WorkflowState};
use serde::Deserialize;

pub const CLASSIFY_SHAPE: ResponseShape = ResponseShape {
    name: "classify",
    required_fields: &["content_type"],
    example: r#"{"content_type": "industry_news"}"#,
};

#[derive(Debug, Deserialize)]
struct ClassifyReply {
    content_type: String,
}

pub(super) fn run(
    state: &WorkflowState,
    ctx: &mut StageContext<'_>,
) -> Result<StateDelta, WorkflowError> {
    let prompt = classify_prompt(&state.draft);
    let label = match ctx
        .client
        .generate_structured::<ClassifyReply>(&prompt, &CLASSIFY_SHAPE)
    {
        Ok(Structured::Parsed(reply)) => reply.content_type,
        Ok(Structured::Degraded { raw, reason }) => {
            tracing::warn!(%reason, "classification reply degraded; trying raw label");
            plain_text(&raw)
        }
        Err(GenerationError::Throttled { attempts }) => {
            return Ok(back_to_intake(format!(
                "Classification was throttled after {attempts} attempts. \
Please resubmit the draft to try again."
            )));
        }
        Err(err) => return Err(err.into()),
    };

    match ContentCategory::parse(&label) {
        Some(category) => {
            tracing::info!(category = category.as_str(), "draft classified");
            Ok(StateDelta {
                content_category: Some(category),
                ..StateDelta::to(Status::Classified)
            })
        }
        None => Ok(back_to_intake(format!(
            "The draft could not be classified (got {:?}). Expected industry_news or personal. \
Please clarify the draft and resubmit.",
            preview(&label, 80)
        ))),
    }
}

fn back_to_intake(feedback: String) -> StateDelta {
    tracing::warn!(%feedback, "classification failed; returning to intake");
    StateDelta::to(Status::Intake).append_feedback(feedback)
}
