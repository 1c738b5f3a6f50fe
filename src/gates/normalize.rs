use regex::Regex;
use std::sync::LazyLock;

static SPACED_PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([.,?!;:]) {2,}").expect("regex for doubled spaces after punctuation")
});

/// Collapse runs of spaces after punctuation to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    SPACED_PUNCTUATION.replace_all(text, "$1 ").into_owned()
}
