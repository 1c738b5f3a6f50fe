use regex::{Captures, Regex};
use std::sync::LazyLock;

pub const CLASSIFY_PROMPT_MD: &str = include_str!("../prompts/classify.md");
pub const WRITER_PROFILE_PROMPT_MD: &str = include_str!("../prompts/writer_profile.md");
pub const WRITER_PERSONAL_PROMPT_MD: &str = include_str!("../prompts/writer_personal.md");
pub const RELEVANCE_PROMPT_MD: &str = include_str!("../prompts/relevance.md");
pub const EDITORIAL_PROMPT_MD: &str = include_str!("../prompts/editorial.md");
pub const CONFORM_PROMPT_MD: &str = include_str!("../prompts/conform.md");

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("regex for template placeholders"));

/// Fill `{name}` placeholders in one pass.
///
/// Substituted values are never scanned again, so braces in a draft or a
/// model reply stay literal. Unknown placeholders are left as written.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map_or_else(|| caps[0].to_string(), |(_, value)| (*value).to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_does_not_expand_placeholders_inside_values() {
        let filled = fill(
            "A: {a}\nB: {b}",
            &[("a", "literal {b} here"), ("b", "second")],
        );
        assert_eq!(filled, "A: literal {b} here\nB: second");
    }

    #[test]
    fn fill_keeps_unknown_placeholders_and_json_examples() {
        let filled = fill(r#"{missing} {"draft": "x"} {a}"#, &[("a", "1")]);
        assert_eq!(filled, r#"{missing} {"draft": "x"} 1"#);
    }
}
