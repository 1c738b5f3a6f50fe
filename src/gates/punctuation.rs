use super::GateOutcome;
use crate::config::PunctuationCeiling;

const SENTENCE_TERMINALS: [char; 3] = ['.', '?', '!'];

/// Ceiling on occurrences of a single marker character.
pub fn check_punctuation(text: &str, ceiling: PunctuationCeiling) -> GateOutcome {
    let marker = ceiling.marker;
    let count = text.matches(marker).count();
    if count <= ceiling.max_count {
        return GateOutcome::passed();
    }
    let excess = count - ceiling.max_count;
    let listed = marker_fragments(text, marker)
        .iter()
        .map(|fragment| format!("- {fragment}"))
        .collect::<Vec<_>>()
        .join("\n");
    GateOutcome::failed(format!(
        "The draft contains {count} '{marker}' characters, exceeding the limit of {limit} by {excess}.\n\
The following sentences contain '{marker}':\n\
{listed}\n\
To help you revise, remove or combine these, or rephrase some as statements. \
Keep at most {limit}.",
        limit = ceiling.max_count,
    ))
}

/// Sentence fragments containing `marker`, verbatim and trimmed.
pub fn marker_fragments(text: &str, marker: char) -> Vec<String> {
    sentence_fragments(text)
        .into_iter()
        .filter(|fragment| fragment.contains(marker))
        .map(str::to_string)
        .collect()
}

/// Split after each run of sentence-terminal punctuation, keeping it.
pub(super) fn sentence_fragments(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        if !SENTENCE_TERMINALS.contains(&ch) {
            continue;
        }
        let mut end = idx + ch.len_utf8();
        while let Some(&(next_idx, next)) = chars.peek() {
            if !SENTENCE_TERMINALS.contains(&next) {
                break;
            }
            end = next_idx + next.len_utf8();
            chars.next();
        }
        push_fragment(&mut fragments, &text[start..end]);
        start = end;
    }
    push_fragment(&mut fragments, &text[start..]);
    fragments
}

fn push_fragment<'a>(fragments: &mut Vec<&'a str>, fragment: &'a str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        fragments.push(trimmed);
    }
}
