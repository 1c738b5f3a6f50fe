//! Canned backends for unit tests.
pub use super::backend::{CallOutcome, GenerationBackend};
use anyhow::{anyhow, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays a fixed queue of outcomes and records every prompt.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<CallOutcome>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<CallOutcome>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl GenerationBackend for ScriptedBackend {
    fn complete(&self, prompt: &str) -> Result<CallOutcome> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .ok_or_else(|| anyhow!("scripted backend exhausted"))
    }

    fn label(&self) -> &str {
        "scripted"
    }
}

/// Answers each prompt with a closure, so replies can depend on the task.
pub struct FnBackend<F> {
    respond: F,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl<F> FnBackend<F>
where
    F: Fn(&str) -> CallOutcome + Send + Sync,
{
    pub fn new(respond: F) -> Self {
        Self {
            respond,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl<F> GenerationBackend for FnBackend<F>
where
    F: Fn(&str) -> CallOutcome + Send + Sync,
{
    fn complete(&self, prompt: &str) -> Result<CallOutcome> {
        self.prompts.lock().expect("prompts lock").push(prompt.to_string());
        Ok((self.respond)(prompt))
    }

    fn label(&self) -> &str {
        "fn"
    }
}

pub fn text(reply: &str) -> CallOutcome {
    CallOutcome::Text(reply.to_string())
}
