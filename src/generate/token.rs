//! Class token parsing and selector escaping.

/// A class token split into its parts.
///
/// `md:hover:!-mt-4` parses to variants `["md", "hover"]`, important,
/// negative, core `mt-4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedToken<'a> {
    pub variants: Vec<&'a str>,
    pub important: bool,
    pub negative: bool,
    pub core: &'a str,
}

impl<'a> ParsedToken<'a> {
    /// Parse a token, or `None` if it does not fit the class grammar.
    pub fn parse(token: &'a str) -> Option<Self> {
        let mut parts = split_variants(token)?;
        let utility = parts.pop()?;

        if parts.iter().any(|v| v.is_empty()) {
            return None;
        }

        let (important, utility) = match utility.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, utility),
        };
        let (negative, core) = match utility.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, utility),
        };

        if !core.starts_with(|c: char| c.is_ascii_lowercase()) {
            return None;
        }

        Some(Self {
            variants: parts,
            important,
            negative,
            core,
        })
    }
}

/// Split on `:` outside of brackets, so `bg-[color:red]` stays whole.
fn split_variants(token: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in token.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            ':' if depth == 0 => {
                parts.push(&token[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    if depth != 0 {
        return None;
    }
    parts.push(&token[start..]);
    Some(parts)
}

/// Candidate `(prefix, value)` splits of a utility core, longest prefix first.
///
/// `border-t-2` yields `("border-t-2", None)`, `("border-t", Some("2"))`,
/// `("border", Some("t-2"))`. A bracketed value is never split internally.
pub fn split_candidates(core: &str) -> Vec<(&str, Option<&str>)> {
    if core.ends_with(']') {
        return match core.find("-[") {
            Some(i) => vec![(&core[..i], Some(&core[i + 1..]))],
            None => Vec::new(),
        };
    }

    let mut candidates = vec![(core, None)];
    candidates.extend(
        core.match_indices('-')
            .map(|(i, _)| i)
            .rev()
            .filter(|&i| i > 0 && i + 1 < core.len())
            .map(|i| (&core[..i], Some(&core[i + 1..]))),
    );
    candidates
}

/// Escape a token for use as a class selector (`md:p-4` -> `md\:p-4`).
pub fn escape_selector(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() * 2);

    for (i, ch) in token.chars().enumerate() {
        if i == 0 && ch.is_ascii_digit() {
            escaped.push_str(&format!("\\3{} ", ch));
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            escaped.push(ch);
        } else {
            escaped.push('\\');
            escaped.push(ch);
        }
    }

    escaped
}
