//! Arbitrary value validation (`p-[3px]`, `bg-[#1da1f2]`).
//!
//! Bracketed values are copied into the stylesheet, so they go through a
//! small allow-list grammar instead of being passed through: a bounded
//! character set, balanced parentheses, and a fixed set of CSS functions.
//! Underscores stand for spaces (`grid-cols-[1fr_2fr]`).

/// Longest accepted arbitrary value, after underscore expansion.
pub const MAX_ARBITRARY_LEN: usize = 128;

const FUNCTIONS: &[&str] = &[
    "calc",
    "min",
    "max",
    "clamp",
    "var",
    "env",
    "rgb",
    "rgba",
    "hsl",
    "hsla",
    "minmax",
    "repeat",
    "fit-content",
];

const COLOR_FUNCTIONS: &[&str] = &["rgb(", "rgba(", "hsl(", "hsla("];

const AMBIGUOUS_FUNCTIONS: &[&str] = &["var(", "calc(", "min(", "max(", "clamp(", "env("];

const UNITS: &[&str] = &[
    "px", "rem", "em", "%", "vh", "vw", "vmin", "vmax", "dvh", "dvw", "svh", "svw", "ch", "ex",
    "fr", "deg", "turn", "ms", "s", "pt", "cm", "mm", "in",
];

/// What an arbitrary value looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitraryKind {
    Color,
    Length,
    Number,
    /// `var()`, `calc()` and friends: could be anything.
    Ambiguous,
    /// Keywords and compound values (`auto`, `1 / 2`).
    Other,
}

/// A validated arbitrary value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitraryValue {
    pub value: String,
    pub kind: ArbitraryKind,
}

/// Validate the text between the brackets.
///
/// An optional type hint (`color:`, `length:`, `number:`, `percentage:`,
/// `any:`) pins the kind for values that cannot be sniffed, such as
/// `text-[color:var(--accent)]`.
pub fn parse_arbitrary(raw: &str) -> Option<ArbitraryValue> {
    let (hint, body) = match raw.split_once(':') {
        Some((hint, body)) => (Some(hint_kind(hint)?), body),
        None => (None, raw),
    };

    let value = body.replace('_', " ");
    let value = value.trim();
    if value.is_empty() || value.len() > MAX_ARBITRARY_LEN {
        return None;
    }
    if !value.chars().all(is_allowed_char) || !functions_allowed(value) {
        return None;
    }

    let kind = hint.unwrap_or_else(|| classify(value));
    Some(ArbitraryValue {
        value: value.to_string(),
        kind,
    })
}

fn hint_kind(hint: &str) -> Option<ArbitraryKind> {
    match hint {
        "color" => Some(ArbitraryKind::Color),
        "length" | "percentage" => Some(ArbitraryKind::Length),
        "number" => Some(ArbitraryKind::Number),
        "any" => Some(ArbitraryKind::Other),
        _ => None,
    }
}

fn is_allowed_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, ' ' | '#' | '.' | '%' | '-' | '+' | '*' | '/' | '(' | ')' | ',')
}

/// Parentheses must balance and every function name must be allow-listed.
fn functions_allowed(value: &str) -> bool {
    let mut depth = 0usize;
    let mut name_start = 0;

    for (i, ch) in value.char_indices() {
        match ch {
            '(' => {
                let name = value[name_start..i].trim_start_matches(['-', '+', '*', '/', ' ']);
                if !name.is_empty() && !FUNCTIONS.contains(&name.to_ascii_lowercase().as_str()) {
                    return false;
                }
                depth += 1;
                name_start = i + 1;
            }
            ')' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
                name_start = i + 1;
            }
            c if c.is_ascii_alphabetic() || c == '-' => {}
            _ => name_start = i + 1,
        }
    }

    depth == 0
}

fn classify(value: &str) -> ArbitraryKind {
    let lower = value.to_ascii_lowercase();

    if is_hex_color(&lower)
        || lower == "transparent"
        || lower == "currentcolor"
        || COLOR_FUNCTIONS.iter().any(|f| lower.starts_with(f))
    {
        return ArbitraryKind::Color;
    }

    if AMBIGUOUS_FUNCTIONS.iter().any(|f| lower.starts_with(f)) {
        return ArbitraryKind::Ambiguous;
    }

    match split_number(&lower) {
        Some((_, "")) => ArbitraryKind::Number,
        Some((_, unit)) if UNITS.contains(&unit) => ArbitraryKind::Length,
        _ => ArbitraryKind::Other,
    }
}

fn is_hex_color(value: &str) -> bool {
    value.strip_prefix('#').is_some_and(|hex| {
        matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Split `-1.5rem` into (`-1.5`, `rem`).
fn split_number(value: &str) -> Option<(&str, &str)> {
    let digits_start = usize::from(value.starts_with(['-', '+']));
    let end = value[digits_start..]
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .map_or(value.len(), |i| i + digits_start);

    let number = &value[..end];
    if number[digits_start..].is_empty() || number[digits_start..].parse::<f64>().is_err() {
        return None;
    }
    Some((number, &value[end..]))
}
