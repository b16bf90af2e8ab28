//! Stylesheet assembly: dedup, cascade ordering and serialization.
//!
//! Rules are sorted by their [`RuleOrder`] and then by selector, so the
//! output depends only on the set of rules and never on the order in which
//! they were generated. Consecutive rules with the same at-rule chain are
//! written into one shared block.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::generate::{Declaration, RuleOrder, UtilityRule, VariantTier};

/// Cascade layer. Later layers override earlier ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Base,
    Components,
    #[default]
    Utilities,
}

/// Serialization options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssembleOptions {
    pub minify: bool,
    pub preflight: bool,
}

/// Reset rules emitted in the base layer when preflight is on.
const PREFLIGHT: &[(&str, &[(&str, &str)])] = &[
    (
        "*, ::before, ::after",
        &[
            ("box-sizing", "border-box"),
            ("border-width", "0"),
            ("border-style", "solid"),
            ("border-color", "currentColor"),
        ],
    ),
    (
        "html",
        &[
            ("line-height", "1.5"),
            ("-webkit-text-size-adjust", "100%"),
            ("tab-size", "4"),
        ],
    ),
    ("body", &[("margin", "0"), ("line-height", "inherit")]),
    (
        "h1, h2, h3, h4, h5, h6",
        &[("font-size", "inherit"), ("font-weight", "inherit")],
    ),
    ("a", &[("color", "inherit"), ("text-decoration", "inherit")]),
    (
        "blockquote, dl, dd, h1, h2, h3, h4, h5, h6, hr, figure, p, pre",
        &[("margin", "0")],
    ),
    ("ol, ul", &[("list-style", "none"), ("margin", "0"), ("padding", "0")]),
    (
        "img, svg, video, canvas, audio, iframe, embed, object",
        &[("display", "block"), ("vertical-align", "middle")],
    ),
    ("img, video", &[("max-width", "100%"), ("height", "auto")]),
    (
        "button, input, optgroup, select, textarea",
        &[
            ("font-family", "inherit"),
            ("font-size", "100%"),
            ("line-height", "inherit"),
            ("color", "inherit"),
            ("margin", "0"),
            ("padding", "0"),
        ],
    ),
];

/// The base reset layer as rules.
pub fn preflight_rules() -> Vec<UtilityRule> {
    PREFLIGHT
        .iter()
        .enumerate()
        .map(|(i, (selector, declarations))| UtilityRule {
            token: String::new(),
            selector: selector.to_string(),
            declarations: declarations
                .iter()
                .map(|(property, value)| Declaration::new(*property, *value))
                .collect(),
            at_rules: Vec::new(),
            order: RuleOrder {
                layer: Layer::Base,
                tier: VariantTier::None,
                at_rule_ranks: Vec::new(),
                variant_count: 0,
                utility_rank: i as u32,
            },
        })
        .collect()
}

/// An ordered, deduplicated set of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stylesheet {
    rules: Vec<UtilityRule>,
}

impl Stylesheet {
    /// Build a stylesheet from rules in any order.
    ///
    /// A rule whose selector and at-rule chain repeat an earlier rule is
    /// dropped; the first in cascade order is kept.
    pub fn from_rules(rules: impl IntoIterator<Item = UtilityRule>) -> Self {
        let mut rules: Vec<UtilityRule> = rules.into_iter().collect();
        rules.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.selector.cmp(&b.selector))
        });

        let mut seen = BTreeSet::new();
        rules.retain(|rule| seen.insert((rule.selector.clone(), rule.at_rules.clone())));

        Self { rules }
    }

    pub fn rules(&self) -> &[UtilityRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serialize to CSS text.
    pub fn to_css(&self, minify: bool) -> String {
        let mut out = String::new();

        for (i, group) in self.groups().iter().enumerate() {
            if !minify && i > 0 {
                out.push('\n');
            }
            write_group(&mut out, group, minify);
        }

        out
    }

    /// Split into runs of consecutive rules sharing an at-rule chain.
    fn groups(&self) -> Vec<&[UtilityRule]> {
        let mut groups = Vec::new();
        let mut start = 0;

        for i in 1..=self.rules.len() {
            if i == self.rules.len() || self.rules[i].at_rules != self.rules[start].at_rules {
                groups.push(&self.rules[start..i]);
                start = i;
            }
        }

        groups
    }
}

/// Order, dedup and serialize rules in one step.
pub fn assemble(rules: impl IntoIterator<Item = UtilityRule>, options: AssembleOptions) -> String {
    let rules: Vec<UtilityRule> = if options.preflight {
        preflight_rules().into_iter().chain(rules).collect()
    } else {
        rules.into_iter().collect()
    };
    Stylesheet::from_rules(rules).to_css(options.minify)
}

fn write_group(out: &mut String, group: &[UtilityRule], minify: bool) {
    let Some(first) = group.first() else {
        return;
    };
    let chain = &first.at_rules;

    for (depth, at_rule) in chain.iter().enumerate() {
        if minify {
            let _ = write!(out, "{}{{", at_rule);
        } else {
            let _ = writeln!(out, "{}{} {{", indent(depth), at_rule);
        }
    }

    for (i, rule) in group.iter().enumerate() {
        if !minify && i > 0 {
            out.push('\n');
        }
        write_rule(out, rule, chain.len(), minify);
    }

    for depth in (0..chain.len()).rev() {
        if minify {
            out.push('}');
        } else {
            let _ = writeln!(out, "{}}}", indent(depth));
        }
    }
}

fn write_rule(out: &mut String, rule: &UtilityRule, depth: usize, minify: bool) {
    if minify {
        let body: Vec<String> = rule
            .declarations
            .iter()
            .map(|d| format!("{}:{}", d.property, d.value))
            .collect();
        let _ = write!(out, "{}{{{}}}", rule.selector, body.join(";"));
        return;
    }

    let pad = indent(depth);
    let _ = writeln!(out, "{}{} {{", pad, rule.selector);
    for declaration in &rule.declarations {
        let _ = writeln!(
            out,
            "{}  {}: {};",
            pad, declaration.property, declaration.value
        );
    }
    let _ = writeln!(out, "{}}}", pad);
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate, Grammar};
    use crate::theme::default_theme;
    use pretty_assertions::assert_eq;

    fn rules(tokens: &[&str]) -> Vec<UtilityRule> {
        let grammar = Grammar::builtin();
        tokens
            .iter()
            .filter_map(|t| generate(t, default_theme(), &grammar).into_rule())
            .collect()
    }

    #[test]
    fn test_two_rule_example() {
        let css = assemble(rules(&["px-4", "md:text-lg"]), AssembleOptions::default());
        assert_eq!(
            css,
            ".px-4 {
  padding-left: 1rem;
  padding-right: 1rem;
}

@media (min-width: 768px) {
  .md\\:text-lg {
    font-size: 1.125rem;
  }
}
"
        );
    }

    #[test]
    fn test_minified() {
        let options = AssembleOptions {
            minify: true,
            ..Default::default()
        };
        let css = assemble(rules(&["md:text-lg", "px-4"]), options);
        assert_eq!(
            css,
            ".px-4{padding-left:1rem;padding-right:1rem}@media (min-width: 768px){.md\\:text-lg{font-size:1.125rem}}"
        );
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let tokens = ["p-4", "hover:bg-red-500", "lg:p-2", "md:p-2", "flex", "px-2"];
        let mut reversed = tokens;
        reversed.reverse();

        let a = assemble(rules(&tokens), AssembleOptions::default());
        let b = assemble(rules(&reversed), AssembleOptions::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_cascade_order() {
        let tokens = ["lg:p-2", "md:p-2", "hover:p-4", "px-2", "p-4"];
        let sheet = Stylesheet::from_rules(rules(&tokens));
        let selectors: Vec<&str> = sheet.rules().iter().map(|r| r.selector.as_str()).collect();
        assert_eq!(
            selectors,
            vec![".p-4", ".px-2", ".hover\\:p-4:hover", ".md\\:p-2", ".lg\\:p-2"]
        );
    }

    #[test]
    fn test_dedup() {
        let sheet = Stylesheet::from_rules(rules(&["p-4", "p-4", "p-4"]));
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn test_shared_at_rule_block() {
        let css = assemble(rules(&["md:p-2", "md:m-2"]), AssembleOptions::default());
        assert_eq!(css.matches("@media").count(), 1);
    }

    #[test]
    fn test_nested_at_rules() {
        let css = assemble(rules(&["print:md:p-2"]), AssembleOptions::default());
        assert_eq!(
            css,
            "@media print {
  @media (min-width: 768px) {
    .print\\:md\\:p-2 {
      padding: 0.5rem;
    }
  }
}
"
        );
    }

    #[test]
    fn test_preflight_comes_first() {
        let options = AssembleOptions {
            preflight: true,
            ..Default::default()
        };
        let css = assemble(rules(&["p-4"]), options);
        assert!(css.starts_with("*, ::before, ::after {"));
        assert!(css.trim_end().ends_with(".p-4 {\n  padding: 1rem;\n}"));
    }

    #[test]
    fn test_components_before_utilities() {
        let mut component = rules(&["p-4"]).remove(0);
        component.selector = ".btn".to_string();
        component.order.layer = Layer::Components;
        component.order.utility_rank = 999;

        let sheet = Stylesheet::from_rules(rules(&["p-4"]).into_iter().chain([component]));
        assert_eq!(sheet.rules()[0].selector, ".btn");
    }

    #[test]
    fn test_empty() {
        assert_eq!(assemble(Vec::new(), AssembleOptions::default()), "");
    }
}
