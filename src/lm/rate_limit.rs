//! Process-wide fixed-window rate limiter for generation calls.
//!
//! One limiter is shared (through `Arc`) by every stage and every workflow run
//! in the process. The window state sits behind a `Mutex` so all callers see a
//! single counter.
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct RateLimiter {
    calls: u32,
    window: Duration,
    state: Mutex<WindowState>,
}

#[derive(Debug)]
struct WindowState {
    started: Instant,
    used: u32,
}

impl RateLimiter {
    pub fn new(calls: u32, window: Duration) -> Self {
        Self {
            calls,
            window,
            state: Mutex::new(WindowState {
                started: Instant::now(),
                used: 0,
            }),
        }
    }

    /// Claim one call in the current window. `false` means throttled.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(state.started) >= self.window {
            state.started = now;
            state.used = 0;
        }
        if state.used >= self.calls {
            return false;
        }
        state.used += 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_at(Instant::now())
    }

    /// Calls left in the window that contains `now`.
    pub fn remaining_at(&self, now: Instant) -> u32 {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if now.saturating_duration_since(state.started) >= self.window {
            return self.calls;
        }
        self.calls.saturating_sub(state.used)
    }
}
