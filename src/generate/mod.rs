//! Class token -> CSS rule generation.
//!
//! Generation is a pure function of the token, the resolved [`Theme`] and
//! the [`Grammar`]. A token that does not fit the grammar, names an unknown
//! variant, or resolves to no value is [`Generated::Unresolved`].
//!
//! # Example
//!
//! ```ignore
//! let grammar = Grammar::builtin();
//! let Generated::Rule(rule) = generate("md:text-lg", &theme, &grammar) else {
//!     unreachable!()
//! };
//! assert_eq!(rule.selector, ".md\\:text-lg");
//! assert_eq!(rule.at_rules, vec!["@media (min-width: 768px)"]);
//! ```

mod grammar;
mod token;
mod value;
mod variant;

use serde::Serialize;

use crate::assemble::Layer;
use crate::theme::{Theme, DEFAULT_KEY};

pub use grammar::{Grammar, StaticMatch, StaticRule, Target, Transform, UtilityDef, ValueKind};
pub use token::{escape_selector, split_candidates, ParsedToken};
pub use value::{parse_arbitrary, ArbitraryKind, ArbitraryValue, MAX_ARBITRARY_LEN};
pub use variant::{apply_selector_variants, resolve_variant, Variant};

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Which kind of variants a rule carries. Rules without variants come
/// first so that variant rules override them in the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VariantTier {
    None,
    Selector,
    AtRule,
}

/// Cascade position of a rule. Compared field by field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleOrder {
    pub layer: Layer,
    pub tier: VariantTier,
    pub at_rule_ranks: Vec<u32>,
    pub variant_count: usize,
    pub utility_rank: u32,
}

/// A generated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityRule {
    /// The class token the rule was generated from.
    pub token: String,
    /// Full selector, escaped, with selector variants applied.
    pub selector: String,
    pub declarations: Vec<Declaration>,
    /// Wrapping at-rules, outermost first.
    pub at_rules: Vec<String>,
    pub order: RuleOrder,
}

impl UtilityRule {
    pub fn layer(&self) -> Layer {
        self.order.layer
    }
}

/// Outcome of generating one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generated {
    Rule(UtilityRule),
    Unresolved,
}

impl Generated {
    pub fn into_rule(self) -> Option<UtilityRule> {
        match self {
            Generated::Rule(rule) => Some(rule),
            Generated::Unresolved => None,
        }
    }
}

/// Generate the rule for one class token.
pub fn generate(token: &str, theme: &Theme, grammar: &Grammar) -> Generated {
    match generate_rule(token, theme, grammar) {
        Some(rule) => Generated::Rule(rule),
        None => Generated::Unresolved,
    }
}

fn generate_rule(token: &str, theme: &Theme, grammar: &Grammar) -> Option<UtilityRule> {
    let parsed = ParsedToken::parse(token)?;

    let variants = parsed
        .variants
        .iter()
        .map(|name| resolve_variant(name, theme, grammar.dark_mode()))
        .collect::<Option<Vec<_>>>()?;

    let (mut declarations, layer, utility_rank) = resolve_core(&parsed, theme, grammar)?;

    if parsed.important {
        for declaration in &mut declarations {
            declaration.value.push_str(" !important");
        }
    }

    let (at_rules, at_rule_ranks): (Vec<String>, Vec<u32>) = variants
        .iter()
        .filter_map(|variant| match variant {
            Variant::AtRule { rule, rank } => Some((rule.clone(), *rank)),
            _ => None,
        })
        .unzip();

    let tier = if !at_rules.is_empty() {
        VariantTier::AtRule
    } else if !variants.is_empty() {
        VariantTier::Selector
    } else {
        VariantTier::None
    };

    let class_selector = format!(".{}", escape_selector(token));

    Some(UtilityRule {
        token: token.to_string(),
        selector: apply_selector_variants(&class_selector, &variants),
        declarations,
        at_rules,
        order: RuleOrder {
            layer,
            tier,
            at_rule_ranks,
            variant_count: variants.len(),
            utility_rank,
        },
    })
}

/// Resolve the core utility to declarations, its layer and its grammar rank.
fn resolve_core(
    parsed: &ParsedToken<'_>,
    theme: &Theme,
    grammar: &Grammar,
) -> Option<(Vec<Declaration>, Layer, u32)> {
    if !parsed.negative {
        if let Some(found) = grammar.static_rule(parsed.core) {
            return Some((found.declarations, found.layer, found.rank));
        }
    }

    split_candidates(parsed.core)
        .into_iter()
        .find_map(|(prefix, value)| {
            let (rank, def) = grammar.utility(prefix)?;
            if (parsed.negative && !def.negative) || value == Some(DEFAULT_KEY) {
                return None;
            }
            let key = value.unwrap_or(DEFAULT_KEY);
            let declarations = resolve_value(def, key, parsed.negative, theme)?;
            Some((declarations, Layer::Utilities, rank))
        })
}

/// Try each target of a utility in order; the first that yields a value wins.
fn resolve_value(
    def: &UtilityDef,
    key: &str,
    negative: bool,
    theme: &Theme,
) -> Option<Vec<Declaration>> {
    if let Some(inner) = key.strip_prefix('[').and_then(|k| k.strip_suffix(']')) {
        let arbitrary = parse_arbitrary(inner)?;
        let target = def
            .targets
            .iter()
            .find(|t| t.accepts.admits(arbitrary.kind, &arbitrary.value))?;
        let value = finish_value(arbitrary.value, negative)?;
        return Some(target.declarations(&value));
    }

    def.targets.iter().find_map(|target| {
        let value = theme
            .lookup(&target.axes, key)
            .or_else(|| target.values.get(key).map(String::as_str))
            .map(str::to_string)
            .or_else(|| target.transform.apply(key))?;
        let value = finish_value(value, negative)?;
        Some(target.declarations(&value))
    })
}

fn finish_value(value: String, negative: bool) -> Option<String> {
    if negative {
        negate(&value)
    } else {
        Some(value)
    }
}

/// Negate a CSS value: `1rem` -> `-1rem`, `-2px` -> `2px`, zero stays as
/// is, functions are wrapped in `calc(.. * -1)`. Keywords cannot be negated.
fn negate(value: &str) -> Option<String> {
    if is_zero(value) {
        return Some(value.to_string());
    }
    if let Some(rest) = value.strip_prefix('-') {
        return Some(rest.to_string());
    }
    if value.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Some(format!("-{}", value));
    }
    if value.contains('(') {
        return Some(format!("calc({} * -1)", value));
    }
    None
}

/// `0`, `0px`, `0.0rem`, ...
fn is_zero(value: &str) -> bool {
    value.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        && value
            .trim_start_matches(['0', '.'])
            .chars()
            .next()
            .map_or(true, |c| c.is_ascii_alphabetic() || c == '%')
}
