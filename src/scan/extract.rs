//! Token extraction from file contents.
//!
//! Extraction knows nothing about file types. One regex pass splits the
//! text into candidates on quotes, angle brackets, backticks, backslashes
//! and whitespace, then each candidate is checked against the class token
//! grammar. False positives are harmless: a word that happens to look like
//! a class is simply unresolved later.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, UcssError};

static CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^<>"'`\s\\]*[^<>"'`\s\\:]"#).expect("valid regex"));

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[a-z0-9@][a-z0-9@-]*:)*!?-?[a-z][a-z0-9.-]*(?:/[0-9]+|-\[[^\s\[\]]+\])?$",
    )
    .expect("valid regex")
});

/// Longest candidate considered a class token.
const MAX_TOKEN_LEN: usize = 256;

/// Pulls class tokens out of text.
#[derive(Debug, Clone, Default)]
pub enum Extractor {
    /// Scan the whole text.
    #[default]
    Default,
    /// Scan only what a custom regex matches: capture group 1 if the
    /// pattern has one, otherwise the whole match.
    Custom(Regex),
}

impl Extractor {
    /// Compile a custom extractor pattern.
    pub fn custom(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Extractor::Custom)
            .map_err(|e| UcssError::Config {
                message: format!("invalid extract pattern '{}': {}", pattern, e),
                help: Some("`extract` is a regular expression; capture group 1 is scanned".into()),
            })
    }

    /// Extract the unique tokens in `text`.
    pub fn extract(&self, text: &str) -> BTreeSet<String> {
        let mut tokens = BTreeSet::new();
        self.extract_into(text, &mut tokens);
        tokens
    }

    /// Extract tokens into an existing set.
    pub fn extract_into(&self, text: &str, tokens: &mut BTreeSet<String>) {
        match self {
            Extractor::Default => extract_candidates(text, tokens),
            Extractor::Custom(regex) => {
                for captures in regex.captures_iter(text) {
                    if let Some(m) = captures.get(1).or_else(|| captures.get(0)) {
                        extract_candidates(m.as_str(), tokens);
                    }
                }
            }
        }
    }
}

fn extract_candidates(text: &str, tokens: &mut BTreeSet<String>) {
    for candidate in CANDIDATE.find_iter(text) {
        let candidate = candidate.as_str();
        if is_token(candidate) && !tokens.contains(candidate) {
            tokens.insert(candidate.to_string());
        }
    }
}

/// Whether a string has the shape of a class token.
pub fn is_token(candidate: &str) -> bool {
    candidate.len() <= MAX_TOKEN_LEN && TOKEN.is_match(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        Extractor::Default.extract(text).into_iter().collect()
    }

    #[test]
    fn test_extract_from_html() {
        let found = tokens(r#"<div class="px-4 md:text-lg">Hi</div>"#);
        assert!(found.contains(&"px-4".to_string()));
        assert!(found.contains(&"md:text-lg".to_string()));
        assert!(!found.iter().any(|t| t.starts_with("class")));
    }

    #[test]
    fn test_extract_is_file_type_independent() {
        let rust = tokens(r#"html! { div(class = "flex items-center") }"#);
        let jsx = tokens("<a className={`flex items-center`} />");
        for t in ["flex", "items-center"] {
            assert!(rust.contains(&t.to_string()));
            assert!(jsx.contains(&t.to_string()));
        }
    }

    #[test]
    fn test_extract_special_forms() {
        let found =
            tokens(r#"<p class="w-1/2 -mt-4 !p-2 bg-[#1da1f2] hover:text-[color:var(--x)]">"#);
        for t in [
            "w-1/2",
            "-mt-4",
            "!p-2",
            "bg-[#1da1f2]",
            "hover:text-[color:var(--x)]",
        ] {
            assert!(found.contains(&t.to_string()), "missing {}", t);
        }
    }

    #[test]
    fn test_extract_from_escaped_string_literal() {
        let found =
            tokens(r#"assert_eq!(event, "\n<p class=\"text-red-800\">Error: error</p>\n")"#);
        assert!(found.contains(&"text-red-800".to_string()));
        assert!(!found.iter().any(|t| t.contains('\\')));
    }

    #[test]
    fn test_filter_rejects_non_tokens() {
        assert!(!is_token("Hello"));
        assert!(!is_token("md:"));
        assert!(!is_token("a=b"));
        assert!(!is_token("{p-4}"));
        assert!(!is_token("p-[3px"));
        assert!(!is_token(&"a".repeat(MAX_TOKEN_LEN + 1)));
        assert!(is_token("2xl:p-4"));
    }

    #[test]
    fn test_extract_dedups() {
        assert_eq!(tokens("p-4 p-4 p-4"), vec!["p-4"]);
    }

    #[test]
    fn test_custom_extractor_uses_capture_group() {
        let extractor = Extractor::custom(r#"tw\("([^"]*)"\)"#).unwrap();
        let found: Vec<String> = extractor
            .extract(r#"let a = tw("p-4 flex"); let b = "m-2";"#)
            .into_iter()
            .collect();
        assert_eq!(found, vec!["flex", "p-4"]);
    }

    #[test]
    fn test_custom_extractor_without_group() {
        let extractor = Extractor::custom(r"p-\d+").unwrap();
        let found: Vec<String> = extractor.extract("xx p-4 m-2").into_iter().collect();
        assert_eq!(found, vec!["p-4"]);
    }

    #[test]
    fn test_invalid_custom_pattern() {
        assert!(matches!(
            Extractor::custom("(unclosed"),
            Err(UcssError::Config { .. })
        ));
    }
}
