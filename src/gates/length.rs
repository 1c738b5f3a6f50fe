use super::GateOutcome;
use crate::config::LengthWindow;

/// Where a count falls relative to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthDelta {
    Within,
    Short(usize),
    Long(usize),
}

/// Length in Unicode scalar values, the unit the window is expressed in.
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

pub fn length_delta(count: usize, window: LengthWindow) -> LengthDelta {
    if count < window.min {
        LengthDelta::Short(window.min - count)
    } else if count > window.max {
        LengthDelta::Long(count - window.max)
    } else {
        LengthDelta::Within
    }
}

/// Inclusive window check with revision hints on either side.
pub fn check_length(text: &str, window: LengthWindow) -> GateOutcome {
    let count = char_count(text);
    match length_delta(count, window) {
        LengthDelta::Within => GateOutcome::passed(),
        LengthDelta::Short(deficit) => GateOutcome::failed(format!(
            "The draft is {deficit} characters too short. The current character count is {count}. \
Aim for a length between {min} and {max} characters.\n\
To help you revise, consider expanding these areas:\n\
- Provide more context or background on the topic.\n\
- Add a concrete detail or example that supports the main point.\n\
- Strengthen the closing prompt so it invites a reply.",
            min = window.min,
            max = window.max,
        )),
        LengthDelta::Long(excess) => GateOutcome::failed(format!(
            "The draft is {excess} characters too long. The current character count is {count}. \
Aim for a length between {min} and {max} characters.\n\
To help you revise, consider condensing these areas:\n\
- Trim redundant words and repeated ideas.\n\
- Use shorter phrasing or common abbreviations.\n\
- Cut back to the single most important point.",
            min = window.min,
            max = window.max,
        )),
    }
}
