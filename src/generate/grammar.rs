//! The utility grammar: which class names exist and what they emit.
//!
//! Two tables drive generation:
//!
//! - **static utilities** map an exact class name to fixed declarations
//!   (`flex` -> `display: flex`);
//! - **functional utilities** map a prefix to one or more targets that
//!   draw a value from the theme (`px-4` -> `padding-left/right: 1rem`).
//!
//! The built-in tables are process-wide and never mutated. A [`Grammar`]
//! borrows them and layers plugin registrations on top; a later
//! registration for the same name shadows the earlier one.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use phf::phf_map;
use serde::Deserialize;

use crate::assemble::Layer;
use crate::config::DarkMode;
use crate::theme::Scale;

use super::value::ArbitraryKind;
use super::Declaration;

/// The kind of value a target accepts from a bracketed arbitrary value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    #[default]
    Any,
    Length,
    Color,
    Number,
}

impl ValueKind {
    /// Whether an arbitrary value of `kind` fits this target.
    pub fn admits(self, kind: ArbitraryKind, value: &str) -> bool {
        match self {
            ValueKind::Any => true,
            ValueKind::Length => match kind {
                ArbitraryKind::Length | ArbitraryKind::Ambiguous => true,
                ArbitraryKind::Number => value == "0",
                _ => false,
            },
            ValueKind::Color => matches!(kind, ArbitraryKind::Color | ArbitraryKind::Ambiguous),
            ValueKind::Number => matches!(kind, ArbitraryKind::Number | ArbitraryKind::Ambiguous),
        }
    }
}

/// Fallback applied to a value key the theme does not define.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Transform {
    #[default]
    None,
    /// `1/2` -> `50%`
    Fraction,
    /// `3` -> `repeat(3, minmax(0, 1fr))`
    GridRepeat,
    /// `2` -> `span 2 / span 2`
    Span,
}

impl Transform {
    pub fn apply(self, key: &str) -> Option<String> {
        match self {
            Transform::None => None,
            Transform::Fraction => {
                let (num, den) = key.split_once('/')?;
                let num: u32 = num.parse().ok()?;
                let den: u32 = den.parse().ok()?;
                if den == 0 {
                    return None;
                }
                Some(format!("{}%", format_percent(f64::from(num) * 100.0 / f64::from(den))))
            }
            Transform::GridRepeat => {
                let n = positive_int(key)?;
                Some(format!("repeat({}, minmax(0, 1fr))", n))
            }
            Transform::Span => {
                let n = positive_int(key)?;
                Some(format!("span {} / span {}", n, n))
            }
        }
    }
}

fn positive_int(key: &str) -> Option<u32> {
    key.parse::<u32>().ok().filter(|n| (1..=99).contains(n))
}

fn format_percent(value: f64) -> String {
    let formatted = format!("{:.6}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// One way a functional utility can resolve its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Theme axes searched in order.
    pub axes: Vec<String>,
    /// Values used when no axis has the key.
    pub values: Scale,
    /// Properties that all receive the resolved value.
    pub properties: Vec<String>,
    pub accepts: ValueKind,
    pub transform: Transform,
    /// Fixed declarations emitted before the properties.
    pub extra: Vec<Declaration>,
}

impl Target {
    pub fn new(axes: &[&str], properties: &[&str], accepts: ValueKind) -> Self {
        Self {
            axes: axes.iter().map(|s| s.to_string()).collect(),
            values: Scale::new(),
            properties: properties.iter().map(|s| s.to_string()).collect(),
            accepts,
            transform: Transform::None,
            extra: Vec::new(),
        }
    }

    /// Declarations for a resolved value.
    pub fn declarations(&self, value: &str) -> Vec<Declaration> {
        self.extra
            .iter()
            .cloned()
            .chain(
                self.properties
                    .iter()
                    .map(|property| Declaration::new(property.clone(), value)),
            )
            .collect()
    }
}

/// A functional utility: a prefix plus the targets it tries, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityDef {
    pub prefix: String,
    pub targets: Vec<Target>,
    /// Whether `-prefix-value` is accepted.
    pub negative: bool,
}

impl UtilityDef {
    pub fn new(prefix: impl Into<String>, target: Target) -> Self {
        Self {
            prefix: prefix.into(),
            targets: vec![target],
            negative: false,
        }
    }

    /// Add a fallback target.
    pub fn or(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn negatable(mut self) -> Self {
        self.negative = true;
        self
    }

    /// Set the transform of the most recently added target.
    fn transform(mut self, transform: Transform) -> Self {
        if let Some(target) = self.targets.last_mut() {
            target.transform = transform;
        }
        self
    }

    /// Add inline values to the most recently added target.
    fn values(mut self, values: &[(&str, &str)]) -> Self {
        if let Some(target) = self.targets.last_mut() {
            target
                .values
                .extend(values.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        }
        self
    }
}

/// A class name mapped to fixed declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRule {
    pub name: String,
    pub declarations: Vec<Declaration>,
    pub layer: Layer,
}

/// A static utility found during lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMatch {
    pub declarations: Vec<Declaration>,
    pub layer: Layer,
    pub rank: u32,
}

type Decls = &'static [(&'static str, &'static str)];

static STATIC_UTILITIES: phf::Map<&'static str, Decls> = phf_map! {
    "block" => &[("display", "block")],
    "inline-block" => &[("display", "inline-block")],
    "inline" => &[("display", "inline")],
    "flex" => &[("display", "flex")],
    "inline-flex" => &[("display", "inline-flex")],
    "grid" => &[("display", "grid")],
    "inline-grid" => &[("display", "inline-grid")],
    "table" => &[("display", "table")],
    "contents" => &[("display", "contents")],
    "hidden" => &[("display", "none")],
    "static" => &[("position", "static")],
    "fixed" => &[("position", "fixed")],
    "absolute" => &[("position", "absolute")],
    "relative" => &[("position", "relative")],
    "sticky" => &[("position", "sticky")],
    "visible" => &[("visibility", "visible")],
    "invisible" => &[("visibility", "hidden")],
    "flex-row" => &[("flex-direction", "row")],
    "flex-row-reverse" => &[("flex-direction", "row-reverse")],
    "flex-col" => &[("flex-direction", "column")],
    "flex-col-reverse" => &[("flex-direction", "column-reverse")],
    "flex-wrap" => &[("flex-wrap", "wrap")],
    "flex-nowrap" => &[("flex-wrap", "nowrap")],
    "flex-1" => &[("flex", "1 1 0%")],
    "flex-auto" => &[("flex", "1 1 auto")],
    "flex-none" => &[("flex", "none")],
    "grow" => &[("flex-grow", "1")],
    "grow-0" => &[("flex-grow", "0")],
    "shrink" => &[("flex-shrink", "1")],
    "shrink-0" => &[("flex-shrink", "0")],
    "items-start" => &[("align-items", "flex-start")],
    "items-end" => &[("align-items", "flex-end")],
    "items-center" => &[("align-items", "center")],
    "items-baseline" => &[("align-items", "baseline")],
    "items-stretch" => &[("align-items", "stretch")],
    "justify-start" => &[("justify-content", "flex-start")],
    "justify-end" => &[("justify-content", "flex-end")],
    "justify-center" => &[("justify-content", "center")],
    "justify-between" => &[("justify-content", "space-between")],
    "justify-around" => &[("justify-content", "space-around")],
    "justify-evenly" => &[("justify-content", "space-evenly")],
    "self-auto" => &[("align-self", "auto")],
    "self-center" => &[("align-self", "center")],
    "overflow-auto" => &[("overflow", "auto")],
    "overflow-hidden" => &[("overflow", "hidden")],
    "overflow-visible" => &[("overflow", "visible")],
    "overflow-scroll" => &[("overflow", "scroll")],
    "overflow-x-auto" => &[("overflow-x", "auto")],
    "overflow-y-auto" => &[("overflow-y", "auto")],
    "italic" => &[("font-style", "italic")],
    "not-italic" => &[("font-style", "normal")],
    "underline" => &[("text-decoration-line", "underline")],
    "line-through" => &[("text-decoration-line", "line-through")],
    "no-underline" => &[("text-decoration-line", "none")],
    "uppercase" => &[("text-transform", "uppercase")],
    "lowercase" => &[("text-transform", "lowercase")],
    "capitalize" => &[("text-transform", "capitalize")],
    "normal-case" => &[("text-transform", "none")],
    "text-left" => &[("text-align", "left")],
    "text-center" => &[("text-align", "center")],
    "text-right" => &[("text-align", "right")],
    "text-justify" => &[("text-align", "justify")],
    "truncate" => &[
        ("overflow", "hidden"),
        ("text-overflow", "ellipsis"),
        ("white-space", "nowrap"),
    ],
    "whitespace-normal" => &[("white-space", "normal")],
    "whitespace-nowrap" => &[("white-space", "nowrap")],
    "whitespace-pre" => &[("white-space", "pre")],
    "break-words" => &[("overflow-wrap", "break-word")],
    "break-all" => &[("word-break", "break-all")],
    "antialiased" => &[
        ("-webkit-font-smoothing", "antialiased"),
        ("-moz-osx-font-smoothing", "grayscale"),
    ],
    "list-none" => &[("list-style-type", "none")],
    "list-disc" => &[("list-style-type", "disc")],
    "border-solid" => &[("border-style", "solid")],
    "border-dashed" => &[("border-style", "dashed")],
    "border-dotted" => &[("border-style", "dotted")],
    "border-none" => &[("border-style", "none")],
    "cursor-pointer" => &[("cursor", "pointer")],
    "cursor-default" => &[("cursor", "default")],
    "cursor-not-allowed" => &[("cursor", "not-allowed")],
    "select-none" => &[("user-select", "none")],
    "select-all" => &[("user-select", "all")],
    "pointer-events-none" => &[("pointer-events", "none")],
    "pointer-events-auto" => &[("pointer-events", "auto")],
    "object-cover" => &[("object-fit", "cover")],
    "object-contain" => &[("object-fit", "contain")],
    "transition" => &[
        (
            "transition-property",
            "color, background-color, border-color, text-decoration-color, fill, stroke, opacity, box-shadow, transform",
        ),
        ("transition-timing-function", "cubic-bezier(0.4, 0, 0.2, 1)"),
        ("transition-duration", "150ms"),
    ],
    "transition-none" => &[("transition-property", "none")],
    "sr-only" => &[
        ("position", "absolute"),
        ("width", "1px"),
        ("height", "1px"),
        ("padding", "0"),
        ("margin", "-1px"),
        ("overflow", "hidden"),
        ("clip", "rect(0, 0, 0, 0)"),
        ("white-space", "nowrap"),
        ("border-width", "0"),
    ],
};

use ValueKind::{Any, Color, Length, Number};

const SPACING: &[&str] = &["spacing"];
const INSET_AXES: &[&str] = &["inset", "spacing"];
const AUTO: &[(&str, &str)] = &[("auto", "auto")];

fn spacing(prefix: &str, properties: &[&str]) -> UtilityDef {
    UtilityDef::new(prefix, Target::new(SPACING, properties, Length))
}

fn inset(prefix: &str, properties: &[&str]) -> UtilityDef {
    UtilityDef::new(prefix, Target::new(INSET_AXES, properties, Length))
        .transform(Transform::Fraction)
        .negatable()
}

fn margin(prefix: &str, properties: &[&str]) -> UtilityDef {
    spacing(prefix, properties).values(AUTO).negatable()
}

fn border_width(prefix: &str, properties: &[&str]) -> UtilityDef {
    UtilityDef::new(prefix, Target::new(&["borderWidth"], properties, Length))
}

fn radius(prefix: &str, properties: &[&str]) -> UtilityDef {
    UtilityDef::new(prefix, Target::new(&["borderRadius"], properties, Length))
}

/// Functional utilities in cascade order: a later entry wins over an
/// earlier one when both apply to an element (`px-2` over `p-4`).
static BUILTIN_UTILITIES: Lazy<Vec<UtilityDef>> = Lazy::new(|| {
    vec![
        inset("inset", &["inset"]),
        inset("inset-x", &["left", "right"]),
        inset("inset-y", &["top", "bottom"]),
        inset("top", &["top"]),
        inset("right", &["right"]),
        inset("bottom", &["bottom"]),
        inset("left", &["left"]),
        UtilityDef::new("z", Target::new(&["zIndex"], &["z-index"], Number)).negatable(),
        UtilityDef::new(
            "grid-cols",
            Target::new(&["gridTemplateColumns"], &["grid-template-columns"], Any),
        )
        .transform(Transform::GridRepeat),
        UtilityDef::new("col-span", Target::new(&["gridColumn"], &["grid-column"], Any))
            .transform(Transform::Span),
        margin("m", &["margin"]),
        margin("mx", &["margin-left", "margin-right"]),
        margin("my", &["margin-top", "margin-bottom"]),
        margin("mt", &["margin-top"]),
        margin("mr", &["margin-right"]),
        margin("mb", &["margin-bottom"]),
        margin("ml", &["margin-left"]),
        UtilityDef::new("w", Target::new(&["width", "spacing"], &["width"], Length))
            .transform(Transform::Fraction),
        UtilityDef::new("min-w", Target::new(&["minWidth"], &["min-width"], Length)),
        UtilityDef::new("max-w", Target::new(&["maxWidth"], &["max-width"], Length)),
        UtilityDef::new("h", Target::new(&["height", "spacing"], &["height"], Length))
            .transform(Transform::Fraction),
        UtilityDef::new("min-h", Target::new(&["minHeight"], &["min-height"], Length)),
        UtilityDef::new("basis", Target::new(SPACING, &["flex-basis"], Length))
            .values(&[("auto", "auto"), ("full", "100%")])
            .transform(Transform::Fraction),
        spacing("gap", &["gap"]),
        spacing("gap-x", &["column-gap"]),
        spacing("gap-y", &["row-gap"]),
        radius("rounded", &["border-radius"]),
        radius("rounded-t", &["border-top-left-radius", "border-top-right-radius"]),
        radius("rounded-r", &["border-top-right-radius", "border-bottom-right-radius"]),
        radius("rounded-b", &["border-bottom-right-radius", "border-bottom-left-radius"]),
        radius("rounded-l", &["border-top-left-radius", "border-bottom-left-radius"]),
        border_width("border", &["border-width"])
            .or(Target::new(&["colors"], &["border-color"], Color)),
        border_width("border-x", &["border-left-width", "border-right-width"]),
        border_width("border-y", &["border-top-width", "border-bottom-width"]),
        border_width("border-t", &["border-top-width"]),
        border_width("border-r", &["border-right-width"]),
        border_width("border-b", &["border-bottom-width"]),
        border_width("border-l", &["border-left-width"]),
        UtilityDef::new("bg", Target::new(&["colors"], &["background-color"], Color)),
        UtilityDef::new("fill", Target::new(&["colors"], &["fill"], Color)),
        UtilityDef::new("stroke", Target::new(&["colors"], &["stroke"], Color)),
        spacing("p", &["padding"]),
        spacing("px", &["padding-left", "padding-right"]),
        spacing("py", &["padding-top", "padding-bottom"]),
        spacing("pt", &["padding-top"]),
        spacing("pr", &["padding-right"]),
        spacing("pb", &["padding-bottom"]),
        spacing("pl", &["padding-left"]),
        UtilityDef::new("font", Target::new(&["fontFamily"], &["font-family"], Any))
            .or(Target::new(&["fontWeight"], &["font-weight"], Number)),
        UtilityDef::new("text", Target::new(&["fontSize"], &["font-size"], Length))
            .or(Target::new(&["colors"], &["color"], Color)),
        UtilityDef::new("leading", Target::new(&["lineHeight"], &["line-height"], Any)),
        UtilityDef::new(
            "tracking",
            Target::new(&["letterSpacing"], &["letter-spacing"], Length),
        )
        .negatable(),
        UtilityDef::new("opacity", Target::new(&["opacity"], &["opacity"], Number)),
        UtilityDef::new("shadow", Target::new(&["boxShadow"], &["box-shadow"], Any)),
        UtilityDef::new(
            "duration",
            Target::new(&["transitionDuration"], &["transition-duration"], Length),
        ),
    ]
});

struct Ranked<T> {
    rank: u32,
    item: T,
}

/// Utility lookup tables for one build.
pub struct Grammar {
    utilities: BTreeMap<String, Ranked<Cow<'static, UtilityDef>>>,
    statics: BTreeMap<String, Ranked<StaticRule>>,
    /// Static names hidden by a later functional registration.
    masked_statics: BTreeSet<String>,
    next_rank: u32,
    dark_mode: DarkMode,
}

impl Grammar {
    /// The built-in grammar.
    pub fn builtin() -> Self {
        let mut grammar = Self {
            utilities: BTreeMap::new(),
            statics: BTreeMap::new(),
            masked_statics: BTreeSet::new(),
            next_rank: 1,
            dark_mode: DarkMode::default(),
        };
        for def in BUILTIN_UTILITIES.iter() {
            grammar.insert_utility(Cow::Borrowed(def));
        }
        grammar
    }

    pub fn with_dark_mode(mut self, dark_mode: DarkMode) -> Self {
        self.dark_mode = dark_mode;
        self
    }

    pub fn dark_mode(&self) -> DarkMode {
        self.dark_mode
    }

    /// Register a functional utility, shadowing any existing prefix and
    /// any static utility whose whole name equals the prefix.
    pub fn register(&mut self, def: UtilityDef) {
        self.statics.remove(&def.prefix);
        self.masked_statics.insert(def.prefix.clone());
        self.insert_utility(Cow::Owned(def));
    }

    /// Register a static utility, shadowing any existing one of that name.
    pub fn register_static(&mut self, rule: StaticRule) {
        self.masked_statics.remove(&rule.name);
        let rank = self.rank_for_static(&rule.name);
        self.statics
            .insert(rule.name.clone(), Ranked { rank, item: rule });
    }

    /// Shadowed entries keep their position in the cascade.
    fn insert_utility(&mut self, def: Cow<'static, UtilityDef>) {
        let rank = match self.utilities.get(&def.prefix) {
            Some(existing) => existing.rank,
            None => self.bump_rank(),
        };
        self.utilities
            .insert(def.prefix.clone(), Ranked { rank, item: def });
    }

    fn rank_for_static(&mut self, name: &str) -> u32 {
        match self.statics.get(name) {
            Some(existing) => existing.rank,
            None => self.bump_rank(),
        }
    }

    fn bump_rank(&mut self) -> u32 {
        let rank = self.next_rank;
        self.next_rank += 1;
        rank
    }

    /// Look up a functional utility by prefix.
    pub fn utility(&self, prefix: &str) -> Option<(u32, &UtilityDef)> {
        self.utilities
            .get(prefix)
            .map(|entry| (entry.rank, entry.item.as_ref()))
    }

    /// Look up a static utility. Plugin rules shadow built-ins.
    pub fn static_rule(&self, name: &str) -> Option<StaticMatch> {
        if let Some(entry) = self.statics.get(name) {
            return Some(StaticMatch {
                declarations: entry.item.declarations.clone(),
                layer: entry.item.layer,
                rank: entry.rank,
            });
        }
        if self.masked_statics.contains(name) {
            return None;
        }

        STATIC_UTILITIES.get(name).map(|decls| StaticMatch {
            declarations: decls
                .iter()
                .map(|(property, value)| Declaration::new(*property, *value))
                .collect(),
            layer: Layer::Utilities,
            rank: 0,
        })
    }

    /// Number of functional utilities.
    pub fn utility_count(&self) -> usize {
        self.utilities.len()
    }
}

impl Default for Grammar {
    fn default() -> Self {
        Self::builtin()
    }
}
