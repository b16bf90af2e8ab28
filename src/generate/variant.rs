//! Variant prefixes (`md:`, `hover:`, `dark:`, `group-hover:`, ...).
//!
//! At-rule variants always wrap the rule from the outside and nest among
//! themselves in token order. Selector variants are applied to the
//! selector in token order, with pseudo-elements moved to the end where
//! CSS requires them. `md:hover:p-4` and `hover:md:p-4` therefore nest the
//! same way: `@media (min-width: 768px) { .<token>:hover { ... } }`.

use phf::phf_map;

use crate::config::DarkMode;
use crate::theme::Theme;

/// Rank offset for non-responsive at-rules, so they sort after breakpoints.
const AT_RULE_RANK_BASE: u32 = 1000;

static PSEUDO_CLASSES: phf::Map<&'static str, &'static str> = phf_map! {
    "hover" => ":hover",
    "focus" => ":focus",
    "focus-within" => ":focus-within",
    "focus-visible" => ":focus-visible",
    "active" => ":active",
    "visited" => ":visited",
    "target" => ":target",
    "disabled" => ":disabled",
    "enabled" => ":enabled",
    "checked" => ":checked",
    "required" => ":required",
    "invalid" => ":invalid",
    "read-only" => ":read-only",
    "empty" => ":empty",
    "first" => ":first-child",
    "last" => ":last-child",
    "only" => ":only-child",
    "odd" => ":nth-child(odd)",
    "even" => ":nth-child(even)",
    "first-of-type" => ":first-of-type",
    "last-of-type" => ":last-of-type",
    "placeholder-shown" => ":placeholder-shown",
};

static PSEUDO_ELEMENTS: phf::Map<&'static str, &'static str> = phf_map! {
    "before" => "::before",
    "after" => "::after",
    "placeholder" => "::placeholder",
    "selection" => "::selection",
    "marker" => "::marker",
    "file" => "::file-selector-button",
    "first-letter" => "::first-letter",
    "first-line" => "::first-line",
};

static AT_RULES: phf::Map<&'static str, (&'static str, u32)> = phf_map! {
    "print" => ("@media print", 1),
    "motion-safe" => ("@media (prefers-reduced-motion: no-preference)", 2),
    "motion-reduce" => ("@media (prefers-reduced-motion: reduce)", 3),
    "portrait" => ("@media (orientation: portrait)", 4),
    "landscape" => ("@media (orientation: landscape)", 5),
    "contrast-more" => ("@media (prefers-contrast: more)", 6),
};

const DARK_MEDIA: &str = "@media (prefers-color-scheme: dark)";

/// A resolved variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// Wraps the rule in an at-rule. `rank` orders breakpoints before
    /// other media features.
    AtRule { rule: String, rank: u32 },
    /// Appended to the selector (`:hover`).
    PseudoClass(&'static str),
    /// Appended after all pseudo-classes (`::before`).
    PseudoElement(&'static str),
    /// Prepended to the selector (`.group:hover `, `.dark `).
    Prefix(String),
}

impl Variant {
    pub fn is_at_rule(&self) -> bool {
        matches!(self, Variant::AtRule { .. })
    }
}

/// Resolve a variant name, or `None` if it is unknown.
pub fn resolve_variant(name: &str, theme: &Theme, dark_mode: DarkMode) -> Option<Variant> {
    if let Some(screen) = theme.screen(name) {
        return Some(Variant::AtRule {
            rule: format!("@media (min-width: {})", screen.min_width),
            rank: screen.rank,
        });
    }

    if name == "dark" {
        return Some(match dark_mode {
            DarkMode::Media => Variant::AtRule {
                rule: DARK_MEDIA.to_string(),
                rank: AT_RULE_RANK_BASE,
            },
            DarkMode::Class => Variant::Prefix(".dark ".to_string()),
        });
    }

    if let Some(&(rule, rank)) = AT_RULES.get(name) {
        return Some(Variant::AtRule {
            rule: rule.to_string(),
            rank: AT_RULE_RANK_BASE + rank,
        });
    }

    if let Some(pseudo) = PSEUDO_CLASSES.get(name) {
        return Some(Variant::PseudoClass(pseudo));
    }

    if let Some(element) = PSEUDO_ELEMENTS.get(name) {
        return Some(Variant::PseudoElement(element));
    }

    if let Some(state) = name.strip_prefix("group-") {
        let pseudo = PSEUDO_CLASSES.get(state)?;
        return Some(Variant::Prefix(format!(".group{} ", pseudo)));
    }

    if let Some(state) = name.strip_prefix("peer-") {
        let pseudo = PSEUDO_CLASSES.get(state)?;
        return Some(Variant::Prefix(format!(".peer{} ~ ", pseudo)));
    }

    None
}

/// Build the final selector from an escaped class and its variants.
pub fn apply_selector_variants(class_selector: &str, variants: &[Variant]) -> String {
    let mut prefix = String::new();
    let mut pseudo_classes = String::new();
    let mut pseudo_elements = String::new();

    for variant in variants {
        match variant {
            Variant::Prefix(p) => prefix.push_str(p),
            Variant::PseudoClass(c) => pseudo_classes.push_str(c),
            Variant::PseudoElement(e) => pseudo_elements.push_str(e),
            Variant::AtRule { .. } => {}
        }
    }

    format!("{}{}{}{}", prefix, class_selector, pseudo_classes, pseudo_elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::default_theme;

    fn resolve(name: &str) -> Option<Variant> {
        resolve_variant(name, default_theme(), DarkMode::Media)
    }

    #[test]
    fn test_breakpoints() {
        assert_eq!(
            resolve("md"),
            Some(Variant::AtRule {
                rule: "@media (min-width: 768px)".to_string(),
                rank: 2,
            })
        );
        let Some(Variant::AtRule { rank: lg, .. }) = resolve("lg") else {
            panic!("lg should resolve");
        };
        assert!(lg > 2);
    }

    #[test]
    fn test_pseudo_classes() {
        assert_eq!(resolve("hover"), Some(Variant::PseudoClass(":hover")));
        assert_eq!(resolve("odd"), Some(Variant::PseudoClass(":nth-child(odd)")));
    }

    #[test]
    fn test_dark_mode_strategies() {
        assert!(resolve("dark").unwrap().is_at_rule());
        assert_eq!(
            resolve_variant("dark", default_theme(), DarkMode::Class),
            Some(Variant::Prefix(".dark ".to_string()))
        );
    }

    #[test]
    fn test_group_and_peer() {
        assert_eq!(
            resolve("group-hover"),
            Some(Variant::Prefix(".group:hover ".to_string()))
        );
        assert_eq!(
            resolve("peer-checked"),
            Some(Variant::Prefix(".peer:checked ~ ".to_string()))
        );
        assert!(resolve("group-bogus").is_none());
    }

    #[test]
    fn test_unknown_variant() {
        assert!(resolve("sideways").is_none());
    }

    #[test]
    fn test_custom_screen_variant() {
        let mut theme = Theme::new();
        theme.insert("screens", "tablet", "640px");
        assert!(resolve_variant("tablet", &theme, DarkMode::Media).is_some());
        assert!(resolve_variant("md", &theme, DarkMode::Media).is_none());
    }

    #[test]
    fn test_apply_selector_variants_order() {
        let variants = vec![
            Variant::PseudoElement("::before"),
            Variant::PseudoClass(":hover"),
            Variant::Prefix(".group:focus ".to_string()),
            Variant::PseudoClass(":first-child"),
        ];
        assert_eq!(
            apply_selector_variants(".x", &variants),
            ".group:focus .x:hover:first-child::before"
        );
    }
}
