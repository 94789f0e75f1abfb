//! Extraction of structured signals from free-text model responses

use regex::Regex;
use std::sync::OnceLock;

pub const START_MARKER: &str = "<START>";
pub const END_MARKER: &str = "<END>";

fn delimited_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let pattern = format!(
            "(?s){}(.*?){}",
            regex::escape(START_MARKER),
            regex::escape(END_MARKER)
        );
        Regex::new(&pattern).expect("delimiter pattern is valid")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("number pattern is valid"))
}

/// Every segment enclosed by a `<START>`/`<END>` pair, verbatim and in order.
///
/// Returns an empty list when no complete pair is present.
pub fn extract_delimited(text: &str) -> Vec<String> {
    delimited_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Wrap text in the marker pair understood by [`extract_delimited`].
pub fn wrap_delimited(text: &str) -> String {
    format!("{}{}{}", START_MARKER, text, END_MARKER)
}

/// Recover the rank assigned to `target` from a ranking response.
///
/// Locates the last occurrence of the target item and returns every integer
/// that precedes it. The final element is the rank given to the target (the
/// list numbering right before the item name); earlier elements carry no
/// meaning. Empty when the target is absent or nothing numeric precedes it.
pub fn extract_rank(response: &str, target: &str) -> Vec<usize> {
    let response = normalize(response);
    let target = normalize(target)
        .replace("&amp;", "&")
        .replace("&reg;", "®");
    let target = target.trim();
    if target.is_empty() {
        return Vec::new();
    }

    let Some(index) = response.rfind(target) else {
        return Vec::new();
    };

    let numbers: Vec<&str> = number_re()
        .find_iter(response[..index].trim())
        .map(|m| m.as_str())
        .collect();

    // An unreadable rank next to the target must not fall back to an earlier number.
    if numbers.last().is_some_and(|n| n.parse::<usize>().is_err()) {
        return Vec::new();
    }

    numbers.iter().filter_map(|n| n.parse::<usize>().ok()).collect()
}

fn normalize(text: &str) -> String {
    text.replace('\u{a0}', " ")
}
