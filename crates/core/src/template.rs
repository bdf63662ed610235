//! `{{name}}` placeholder rendering.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::value::Variables;

/// Regex pattern matching `{{ name }}` placeholders, whitespace tolerated.
pub const PLACEHOLDER_PATTERN: &str = r"\{\{\s*(\w+)\s*\}\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Substitute every placeholder with the stringified variable, or with the
/// empty string when the variable is unset.
pub fn render(text: &str, variables: &Variables) -> String {
    PLACEHOLDER_RE
        .replace_all(text, |caps: &Captures<'_>| {
            variables
                .get(&caps[1])
                .map(ToString::to_string)
                .unwrap_or_default()
        })
        .into_owned()
}
