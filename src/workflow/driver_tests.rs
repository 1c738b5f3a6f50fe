use super::*;
use crate::config::{default_config, WorkflowConfig};
use crate::human::Console;
use crate::lm::testing::{text, CallOutcome, FnBackend, GenerationBackend, ScriptedBackend};
use crate::lm::RateLimiter;
use crate::workflow::{ContentCategory, Status};
use serde_json::json;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type TestConsole = Console<Cursor<Vec<u8>>, Vec<u8>>;

fn console(input: &str) -> TestConsole {
    Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

fn client(backend: impl GenerationBackend + 'static) -> GenerationClient {
    GenerationClient::new(
        Box::new(backend),
        Arc::new(RateLimiter::new(1000, Duration::from_secs(60))),
        Duration::ZERO,
    )
}

fn minimal_config() -> WorkflowConfig {
    let mut config = default_config();
    config.stages.classify = false;
    config.stages.assess_relevance = false;
    config
}

/// 475 characters, no question marks.
fn good_draft() -> String {
    format!("{}.", "word ".repeat(95).trim_end())
}

fn draft_reply(draft: &str) -> CallOutcome {
    text(&json!({ "draft": draft }).to_string())
}

fn editorial_reply(score: u32, feedback: &str) -> CallOutcome {
    text(&json!({ "feedback": feedback, "overall_score": score }).to_string())
}

/// Answers every task with a passing reply.
fn happy_backend() -> FnBackend<impl Fn(&str) -> CallOutcome + Send + Sync> {
    FnBackend::new(|prompt: &str| {
        if prompt.starts_with("# Task: classify") {
            text(r#"{"content_type": "industry_news"}"#)
        } else if prompt.starts_with("# Task: generate") {
            draft_reply(&good_draft())
        } else if prompt.starts_with("# Task: relevance") {
            text(r#"{"relevance_score": 5, "relevance_feedback": "Faithful."}"#)
        } else if prompt.starts_with("# Task: editorial") {
            editorial_reply(5, "Strong hook and clear call to action.")
        } else {
            text("unexpected prompt")
        }
    })
}

fn generate_prompts(prompts: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    prompts
        .lock()
        .expect("prompts lock")
        .iter()
        .filter(|p| p.starts_with("# Task: generate"))
        .cloned()
        .collect()
}

#[test]
fn first_pass_approval_takes_four_stages_without_optional_stages() {
    let config = minimal_config();
    let client = client(happy_backend());
    let mut human = console("We moved CI to ARM runners.\n//done\nyes\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.iteration_count, 4);
    assert_eq!(report.status, Status::Approved);
    assert_eq!(report.termination, Termination::Approved);
    assert_eq!(report.final_draft, good_draft());
    assert_eq!(
        report.versions.texts(),
        vec!["We moved CI to ARM runners.", good_draft().as_str()]
    );
    assert_eq!(report.review_history.len(), 1);
    assert!(report.review_approved_after_ms.is_some());
}

#[test]
fn default_stages_classify_and_assess_relevance() {
    let config = default_config();
    let client = client(happy_backend());
    let mut human = console("We moved CI to ARM runners.\n//done\ny\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.iteration_count, 6);
    assert_eq!(report.content_category, Some(ContentCategory::IndustryNews));
    assert_eq!(report.relevance_score, Some(5));
    assert_eq!(report.relevance_note, "Faithful.");
}

#[test]
fn hard_cap_forces_approval_regardless_of_gates() {
    let mut config = minimal_config();
    config.caps.hard = 3;
    config.caps.soft = 3;
    let client = client(FnBackend::new(|_: &str| draft_reply("far too short")));
    let mut human = console("original\n//done\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.status, Status::Approved);
    assert_eq!(report.termination, Termination::ForcedApproval);
    assert_eq!(report.iteration_count, 4);
    assert!(!report.versions.is_empty());
}

#[test]
fn soft_cap_ends_run_without_approval() {
    let mut config = minimal_config();
    config.caps.soft = 2;
    let client = client(FnBackend::new(|_: &str| draft_reply("far too short")));
    let mut human = console("original\n//done\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.termination, Termination::SoftCapReached);
    assert_eq!(report.status, Status::Editing);
    assert_eq!(report.iteration_count, 3);
}

#[test]
fn each_step_counts_once_and_versions_only_grow() {
    let config = minimal_config();
    let calls = AtomicUsize::new(0);
    let client = client(FnBackend::new(move |prompt: &str| {
        if prompt.starts_with("# Task: editorial") {
            // Reject the first review only.
            let score = if calls.fetch_add(1, Ordering::SeqCst) == 0 { 2 } else { 5 };
            editorial_reply(score, "Needs a sharper hook.")
        } else {
            draft_reply(&good_draft())
        }
    }));
    let mut human = console("original\n//done\nyes\n");
    let mut workflow = Workflow::new(&config, &client, &mut human);

    let mut previous_count = 0;
    let mut previous_versions: Vec<String> = Vec::new();
    loop {
        let step = workflow.step().expect("step");
        let state = workflow.state();
        match step {
            Step::Finished(termination) => {
                assert_eq!(termination, Termination::Approved);
                assert_eq!(state.iteration_count, previous_count);
                break;
            }
            Step::Ran(_) | Step::Forced(_) => {
                assert_eq!(state.iteration_count, previous_count + 1);
            }
        }
        let versions: Vec<String> = state.ledger.texts().iter().map(|t| t.to_string()).collect();
        assert!(versions.starts_with(&previous_versions));
        previous_count = state.iteration_count;
        previous_versions = versions;
    }
    assert_eq!(previous_count, 6);
    assert_eq!(previous_versions.len(), 3);
    let rejected = &workflow.state().ledger.entries()[1];
    assert!(rejected.reasons[0].contains("Needs a sharper hook."));
}

#[test]
fn gate_failures_accumulate_until_a_draft_fits() {
    let config = minimal_config();
    let generation = AtomicUsize::new(0);
    let backend = FnBackend::new(move |prompt: &str| {
        if prompt.starts_with("# Task: editorial") {
            return editorial_reply(4, "Good.");
        }
        match generation.fetch_add(1, Ordering::SeqCst) {
            0 => draft_reply("Why now? Why us? Because it matters."),
            1 => draft_reply(&"x".repeat(520)),
            _ => draft_reply(&good_draft()),
        }
    });
    let prompts = backend.prompts();
    let client = client(backend);
    let mut human = console("original\n//done\nyes\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.termination, Termination::Approved);
    assert!((450..=500).contains(&report.final_length));
    assert!(report.final_draft.matches('?').count() <= config.punctuation.max_count);
    // Rejected candidates never enter the ledger.
    assert_eq!(report.versions.len(), 2);

    let writes = generate_prompts(&prompts);
    assert_eq!(writes.len(), 3);
    assert!(writes[1].contains("contains 2 '?' characters"));
    assert!(writes[2].contains("contains 2 '?' characters"));
    assert!(writes[2].contains("20 characters too long"));
}

#[test]
fn throttled_review_becomes_feedback() {
    let config = minimal_config();
    let reviews = AtomicUsize::new(0);
    let client = client(FnBackend::new(move |prompt: &str| {
        if prompt.starts_with("# Task: editorial") {
            if reviews.fetch_add(1, Ordering::SeqCst) < 2 {
                return CallOutcome::Throttled;
            }
            return editorial_reply(5, "Ship it.");
        }
        draft_reply(&good_draft())
    }));
    let mut human = console("original\n//done\nyes\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.termination, Termination::Approved);
    assert_eq!(report.iteration_count, 6);
    assert!(report.review_history[0].contains("throttled after 2 attempts"));
    assert_eq!(report.review_history[1], "Ship it.");
}

#[test]
fn unknown_category_returns_to_intake_and_keeps_original() {
    let config = default_config();
    let classifications = AtomicUsize::new(0);
    let backend = FnBackend::new(move |prompt: &str| {
        if prompt.starts_with("# Task: classify") {
            return if classifications.fetch_add(1, Ordering::SeqCst) == 0 {
                text(r#"{"content_type": "recipe"}"#)
            } else {
                text(r#"{"content_type": "personal"}"#)
            };
        }
        if prompt.starts_with("# Task: relevance") {
            return text(r#"{"relevance_score": 4}"#);
        }
        if prompt.starts_with("# Task: editorial") {
            return editorial_reply(5, "Warm and honest.");
        }
        draft_reply(&good_draft())
    });
    let prompts = backend.prompts();
    let client = client(backend);
    let mut human = console("first take\n//done\nsecond take\n//done\nyes\n");
    let mut workflow = Workflow::new(&config, &client, &mut human);
    for _ in 0..2 {
        workflow.step().expect("step");
    }
    assert_eq!(workflow.state().status, Status::Intake);
    assert!(workflow.state().feedback.contains("could not be classified"));

    workflow.step().expect("re-intake");
    assert_eq!(workflow.state().draft, "second take");
    assert_eq!(workflow.state().original_draft.as_deref(), Some("first take"));
    assert_eq!(workflow.state().ledger.texts(), vec!["first take"]);

    let report = workflow.run().expect("run");
    assert_eq!(report.termination, Termination::Approved);
    assert_eq!(report.iteration_count, 8);
    assert_eq!(report.content_category, Some(ContentCategory::Personal));

    // The writer rewrites the resubmission; reviewers still compare against the first take.
    let writes = generate_prompts(&prompts);
    assert!(writes[0].contains("second take"));
    assert!(!writes[0].contains("first take"));
    let reviews: Vec<String> = prompts
        .lock()
        .expect("prompts lock")
        .iter()
        .filter(|p| p.starts_with("# Task: editorial"))
        .cloned()
        .collect();
    assert!(reviews[0].contains("first take"));
}

#[test]
fn human_rejection_starts_a_new_revision_cycle() {
    let config = minimal_config();
    let backend = FnBackend::new(|prompt: &str| {
        if prompt.starts_with("# Task: editorial") {
            editorial_reply(5, "Looks good.")
        } else {
            draft_reply(&good_draft())
        }
    });
    let prompts = backend.prompts();
    let client = client(backend);
    let mut human = console("original\n//done\nno\nMake it funnier.\n//done\nyes\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");

    assert_eq!(report.iteration_count, 7);
    assert_eq!(report.versions.entries()[1].reasons, vec!["Make it funnier.".to_string()]);
    let writes = generate_prompts(&prompts);
    assert_eq!(writes.len(), 2);
    assert!(writes[1].contains("Make it funnier."));
}

#[test]
fn malformed_draft_reply_falls_back_to_raw_text() {
    let config = minimal_config();
    let client = client(FnBackend::new(|prompt: &str| {
        if prompt.starts_with("# Task: editorial") {
            editorial_reply(5, "Fine.")
        } else {
            // Never JSON, even when asked to conform.
            text(&good_draft())
        }
    }));
    let mut human = console("original\n//done\nyes\n");
    let report = Workflow::new(&config, &client, &mut human)
        .run()
        .expect("run");
    assert_eq!(report.final_draft, good_draft());
}

#[test]
fn transport_failure_ends_the_run() {
    let config = minimal_config();
    let client = client(ScriptedBackend::new(Vec::new()));
    let mut human = console("original\n//done\n");
    let err = Workflow::new(&config, &client, &mut human)
        .run()
        .expect_err("transport");
    assert!(matches!(
        err,
        WorkflowError::Generation(crate::error::GenerationError::Transport(_))
    ));
}

#[test]
fn closed_input_during_approval_is_fatal() {
    let config = minimal_config();
    let client = client(happy_backend());
    let mut human = console("original\n//done\n");
    let err = Workflow::new(&config, &client, &mut human)
        .run()
        .expect_err("closed input");
    assert!(err.to_string().contains("input closed"));
}

#[test]
fn soft_cap_below_hard_cap_wins() {
    let mut config = minimal_config();
    config.caps.soft = 2;
    config.caps.hard = 3;
    let client = client(FnBackend::new(|_: &str| draft_reply("far too short")));
    let mut human = console("original\n//done\n");
    let mut workflow = Workflow::new(&config, &client, &mut human);
    let mut forced = false;
    let termination = loop {
        match workflow.step().expect("step") {
            Step::Finished(termination) => break termination,
            Step::Forced(_) => forced = true,
            Step::Ran(_) => {}
        }
    };

    assert!(!forced);
    assert!(!workflow.state().forced_approval);
    assert_eq!(termination, Termination::SoftCapReached);
    assert_eq!(workflow.state().status, Status::Editing);
    assert_eq!(workflow.state().iteration_count, 3);
}
