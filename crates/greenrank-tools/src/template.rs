//! Placeholder substitution for request templates

use regex::{Captures, Regex};
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"))
}

/// Fill `{name}` placeholders in a single pass.
///
/// Inserted values are never rescanned, so a value that itself contains
/// `{prompt}` reaches the model verbatim. Placeholders without a binding
/// are left as written.
pub fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    placeholder_re()
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_every_binding() {
        let filled = fill_template("{a} then {b} then {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x then y then x");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let filled = fill_template(
            "prompt={prompt} case={error_case}",
            &[("prompt", "RANK"), ("error_case", "typed {prompt} in search")],
        );
        assert_eq!(filled, "prompt=RANK case=typed {prompt} in search");
    }

    #[test]
    fn test_unbound_placeholder_kept() {
        assert_eq!(fill_template("keep {other}", &[("prompt", "x")]), "keep {other}");
    }
}
