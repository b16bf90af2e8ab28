//! Plugin pipeline.
//!
//! Plugins contribute to a build before any token is generated. Each one
//! is one of three kinds:
//!
//! - **grammar**: adds or overrides functional utilities;
//! - **static**: maps exact class names to fixed declarations;
//! - **theme**: rewrites the resolved theme.
//!
//! Plugins run in declared order and a later contribution shadows an
//! earlier one with the same name (including built-ins). Every plugin is
//! validated when it is constructed, so a pipeline that was built without
//! error cannot fail halfway through except on a theme alias whose source
//! axis does not exist.
//!
//! # Example
//!
//! ```ignore
//! let pipeline = Pipeline::from_refs(&config.plugins)?;
//! let (theme, grammar) = pipeline.apply(theme, Grammar::builtin())?;
//! ```

mod bundled;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::{PluginRef, PluginSpec, Scalar, ThemeOpSpec, UtilitySpec};
use crate::error::{Result, UcssError};
use crate::generate::{Declaration, Grammar, StaticRule, Target, Transform, UtilityDef};
use crate::theme::{scale_from_value, Scale, Theme};

pub use bundled::{bundled, BUNDLED_PLUGINS};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*(?:-[a-z0-9]+)*$").expect("valid regex"));

static PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-{0,2}[a-z][a-z0-9]*(?:-[a-z0-9]+)*$").expect("valid regex"));

/// A single theme rewrite step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeOp {
    /// Set one value, creating the axis if needed.
    Set {
        axis: String,
        key: String,
        value: String,
    },
    /// Copy an existing axis under a new name.
    Alias { from: String, to: String },
    /// Merge entries into an axis.
    Extend { axis: String, scale: Scale },
}

/// What a plugin contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginKind {
    Grammar(Vec<UtilityDef>),
    Static(Vec<StaticRule>),
    Theme(Vec<ThemeOp>),
}

/// A validated plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plugin {
    pub name: String,
    pub kind: PluginKind,
}

impl Plugin {
    /// Resolve a config reference: a bundled name or an inline definition.
    pub fn from_ref(plugin: &PluginRef) -> Result<Self> {
        match plugin {
            PluginRef::Bundled(name) => bundled(name).ok_or_else(|| UcssError::Config {
                message: format!("unknown plugin '{}'", name),
                help: Some(format!("Bundled plugins: {}", BUNDLED_PLUGINS.join(", "))),
            }),
            PluginRef::Inline(spec) => Self::from_spec(spec),
        }
    }

    /// Validate an inline plugin definition.
    pub fn from_spec(spec: &PluginSpec) -> Result<Self> {
        let name = spec.name();
        if name.trim().is_empty() {
            return Err(UcssError::config("inline plugins need a non-empty name"));
        }

        let kind = match spec {
            PluginSpec::Grammar { utilities, .. } => PluginKind::Grammar(
                utilities
                    .iter()
                    .map(|utility| utility_from_spec(name, utility))
                    .collect::<Result<_>>()?,
            ),
            PluginSpec::Static { layer, rules, .. } => PluginKind::Static(
                rules
                    .iter()
                    .map(|(class, declarations)| {
                        check_identifier(name, "class name", class)?;
                        if declarations.is_empty() {
                            return Err(UcssError::plugin(
                                name,
                                format!("rule '{}' has no declarations", class),
                            ));
                        }
                        Ok(StaticRule {
                            name: class.clone(),
                            declarations: declarations_from_spec(name, declarations)?,
                            layer: *layer,
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
            PluginSpec::Theme { ops, .. } => PluginKind::Theme(
                ops.iter()
                    .map(|op| theme_op_from_spec(name, op))
                    .collect::<Result<_>>()?,
            ),
        };

        Ok(Self {
            name: name.to_string(),
            kind,
        })
    }

    /// Apply this plugin's contribution.
    pub fn apply(&self, theme: &mut Theme, grammar: &mut Grammar) -> Result<()> {
        match &self.kind {
            PluginKind::Grammar(utilities) => {
                for def in utilities {
                    grammar.register(def.clone());
                }
            }
            PluginKind::Static(rules) => {
                for rule in rules {
                    grammar.register_static(rule.clone());
                }
            }
            PluginKind::Theme(ops) => {
                for op in ops {
                    self.apply_theme_op(theme, op)?;
                }
            }
        }
        Ok(())
    }

    fn apply_theme_op(&self, theme: &mut Theme, op: &ThemeOp) -> Result<()> {
        match op {
            ThemeOp::Set { axis, key, value } => theme.insert(axis, key.clone(), value.clone()),
            ThemeOp::Alias { from, to } => {
                let scale = theme.axis(from).cloned().ok_or_else(|| UcssError::Plugin {
                    plugin: self.name.clone(),
                    message: format!("cannot alias missing theme axis '{}'", from),
                    help: Some(format!(
                        "Known axes: {}",
                        theme.axis_names().collect::<Vec<_>>().join(", ")
                    )),
                })?;
                theme.set_axis(to.clone(), scale);
            }
            ThemeOp::Extend { axis, scale } => theme.extend_axis(axis, scale.clone()),
        }
        Ok(())
    }
}

/// Ordered list of plugins for one build.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    plugins: Vec<Plugin>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from config references, validating each plugin.
    pub fn from_refs(refs: &[PluginRef]) -> Result<Self> {
        let plugins = refs.iter().map(Plugin::from_ref).collect::<Result<_>>()?;
        Ok(Self { plugins })
    }

    pub fn push(&mut self, plugin: Plugin) {
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every plugin in order.
    pub fn apply(&self, mut theme: Theme, mut grammar: Grammar) -> Result<(Theme, Grammar)> {
        for plugin in &self.plugins {
            debug!(plugin = %plugin.name, "applying plugin");
            plugin.apply(&mut theme, &mut grammar)?;
        }
        Ok((theme, grammar))
    }
}

fn utility_from_spec(plugin: &str, spec: &UtilitySpec) -> Result<UtilityDef> {
    check_identifier(plugin, "utility prefix", &spec.prefix)?;

    if spec.properties.is_empty() {
        return Err(UcssError::plugin(
            plugin,
            format!("utility '{}' has no properties", spec.prefix),
        ));
    }
    for property in &spec.properties {
        check_property(plugin, property)?;
    }

    let values = match &spec.values {
        Some(value) => {
            scale_from_value(&spec.prefix, value).map_err(|e| to_plugin_error(plugin, e))?
        }
        None => Scale::new(),
    };

    if spec.axes.is_empty() && values.is_empty() && spec.transform == Transform::None {
        return Err(UcssError::Plugin {
            plugin: plugin.to_string(),
            message: format!("utility '{}' has no value source", spec.prefix),
            help: Some("Give it `axes`, `values` or a `transform`".to_string()),
        });
    }

    let axes: Vec<&str> = spec.axes.iter().map(String::as_str).collect();
    let properties: Vec<&str> = spec.properties.iter().map(String::as_str).collect();
    let mut target = Target::new(&axes, &properties, spec.accepts);
    target.values = values;
    target.transform = spec.transform;
    target.extra = declarations_from_spec(plugin, &spec.extra)?;

    let def = UtilityDef::new(spec.prefix.clone(), target);
    Ok(if spec.negative { def.negatable() } else { def })
}

fn theme_op_from_spec(plugin: &str, spec: &ThemeOpSpec) -> Result<ThemeOp> {
    Ok(match spec {
        ThemeOpSpec::Set { axis, key, value } => {
            check_value(plugin, &key.0, &value.0)?;
            ThemeOp::Set {
                axis: axis.clone(),
                key: key.0.clone(),
                value: value.0.clone(),
            }
        }
        ThemeOpSpec::Alias { from, to } => ThemeOp::Alias {
            from: from.clone(),
            to: to.clone(),
        },
        ThemeOpSpec::Extend { axis, values } => ThemeOp::Extend {
            axis: axis.clone(),
            scale: scale_from_value(axis, values).map_err(|e| to_plugin_error(plugin, e))?,
        },
    })
}

fn declarations_from_spec<'a>(
    plugin: &str,
    declarations: impl IntoIterator<Item = (&'a String, &'a Scalar)>,
) -> Result<Vec<Declaration>> {
    declarations
        .into_iter()
        .map(|(property, value)| {
            check_property(plugin, property)?;
            check_value(plugin, property, &value.0)?;
            Ok(Declaration::new(property.clone(), value.0.clone()))
        })
        .collect()
}

fn check_identifier(plugin: &str, what: &str, name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(UcssError::plugin(
            plugin,
            format!("invalid {} '{}'", what, name),
        ))
    }
}

fn check_property(plugin: &str, property: &str) -> Result<()> {
    if PROPERTY.is_match(property) {
        Ok(())
    } else {
        Err(UcssError::plugin(
            plugin,
            format!("invalid CSS property '{}'", property),
        ))
    }
}

/// Values are emitted verbatim, so nothing that could end the block.
fn check_value(plugin: &str, name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() || value.contains(['{', '}', ';', '\n']) {
        Err(UcssError::plugin(
            plugin,
            format!("invalid value for '{}': '{}'", name, value),
        ))
    } else {
        Ok(())
    }
}

fn to_plugin_error(plugin: &str, err: UcssError) -> UcssError {
    match err {
        UcssError::Config { message, help } => UcssError::Plugin {
            plugin: plugin.to_string(),
            message,
            help,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::Layer;
    use crate::config::Config;
    use crate::generate::{generate, Generated};
    use crate::theme::default_theme;

    fn pipeline(yaml: &str) -> Result<Pipeline> {
        let config = Config::parse(yaml)?;
        Pipeline::from_refs(&config.plugins)
    }

    fn applied(yaml: &str) -> (Theme, Grammar) {
        pipeline(yaml)
            .unwrap()
            .apply(default_theme().clone(), Grammar::builtin())
            .unwrap()
    }

    fn declarations(token: &str, theme: &Theme, grammar: &Grammar) -> Vec<Declaration> {
        match generate(token, theme, grammar) {
            Generated::Rule(rule) => rule.declarations,
            Generated::Unresolved => panic!("{} should resolve", token),
        }
    }

    #[test]
    fn test_grammar_plugin_adds_utility() {
        let (theme, grammar) = applied(
            r#"
plugins:
  - name: tabs
    kind: grammar
    utilities:
      - prefix: tab
        properties: [tab-size]
        values: {2: 2, 4: 4}
        type: number
"#,
        );
        assert_eq!(
            declarations("tab-4", &theme, &grammar),
            vec![Declaration::new("tab-size", "4")]
        );
        assert_eq!(generate("tab-3", &theme, &grammar), Generated::Unresolved);
    }

    #[test]
    fn test_grammar_plugin_overrides_builtin() {
        let (theme, grammar) = applied(
            r#"
plugins:
  - name: logical
    kind: grammar
    utilities:
      - prefix: px
        axes: [spacing]
        properties: [padding-inline]
"#,
        );
        assert_eq!(
            declarations("px-4", &theme, &grammar),
            vec![Declaration::new("padding-inline", "1rem")]
        );
    }

    #[test]
    fn test_grammar_plugin_overrides_builtin_static() {
        let (theme, grammar) = applied(
            r#"
plugins:
  - name: visibility
    kind: grammar
    utilities:
      - prefix: hidden
        properties: [visibility]
        values: {DEFAULT: hidden}
"#,
        );
        assert_eq!(
            declarations("hidden", &theme, &grammar),
            vec![Declaration::new("visibility", "hidden")]
        );
        assert_eq!(
            declarations("flex", &theme, &grammar),
            vec![Declaration::new("display", "flex")]
        );
    }

    #[test]
    fn test_later_plugin_wins() {
        let (theme, grammar) = applied(
            r#"
plugins:
  - name: first
    kind: static
    rules:
      btn: { padding: 1rem }
  - name: second
    kind: static
    rules:
      btn: { padding: 2rem }
"#,
        );
        assert_eq!(
            declarations("btn", &theme, &grammar),
            vec![Declaration::new("padding", "2rem")]
        );
    }

    #[test]
    fn test_static_plugin_layer() {
        let (theme, grammar) = applied(
            r#"
plugins:
  - name: buttons
    kind: static
    layer: components
    rules:
      btn:
        padding: 0.5rem 1rem
        border-radius: 0.25rem
"#,
        );
        let Generated::Rule(rule) = generate("hover:btn", &theme, &grammar) else {
            panic!("btn should resolve");
        };
        assert_eq!(rule.layer(), Layer::Components);
        assert_eq!(rule.declarations.len(), 2);
        assert_eq!(rule.declarations[0].property, "padding");
    }

    #[test]
    fn test_theme_plugin_ops() {
        let (theme, grammar) = applied(
            r##"
plugins:
  - name: brand
    kind: theme
    ops:
      - { op: set, axis: colors, key: brand, value: "#0f766e" }
      - { op: alias, from: spacing, to: tabSize }
      - op: extend
        axis: colors
        values: { accent: { DEFAULT: "#f59e0b", dark: "#b45309" } }
"##,
        );
        assert_eq!(theme.get("colors", "brand"), Some("#0f766e"));
        assert_eq!(theme.get("colors", "accent"), Some("#f59e0b"));
        assert_eq!(theme.get("colors", "accent-dark"), Some("#b45309"));
        assert_eq!(theme.get("tabSize", "4"), Some("1rem"));
        assert_eq!(
            declarations("bg-brand", &theme, &grammar),
            vec![Declaration::new("background-color", "#0f766e")]
        );
    }

    #[test]
    fn test_alias_missing_axis_names_plugin() {
        let pipeline = pipeline(
            r#"
plugins:
  - name: broken
    kind: theme
    ops:
      - { op: alias, from: nope, to: other }
"#,
        )
        .unwrap();
        let err = pipeline
            .apply(default_theme().clone(), Grammar::builtin())
            .err()
            .unwrap();
        assert!(matches!(err, UcssError::Plugin { plugin, .. } if plugin == "broken"));
    }

    #[test]
    fn test_utility_without_value_source_is_rejected() {
        let err = pipeline(
            r#"
plugins:
  - name: empty
    kind: grammar
    utilities:
      - prefix: tab
        properties: [tab-size]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, UcssError::Plugin { plugin, .. } if plugin == "empty"));
    }

    #[test]
    fn test_unsafe_declaration_value_is_rejected() {
        let err = pipeline(
            r#"
plugins:
  - name: evil
    kind: static
    rules:
      btn: { color: "red;} body {color: blue" }
"#,
        )
        .unwrap_err();
        assert!(matches!(err, UcssError::Plugin { plugin, .. } if plugin == "evil"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        assert!(pipeline(
            "plugins:\n  - { name: x, kind: static, rules: { 'Btn': { color: red } } }"
        )
        .is_err());
        assert!(pipeline(
            "plugins:\n  - { name: x, kind: static, rules: { btn: { 'col or': red } } }"
        )
        .is_err());
    }

    #[test]
    fn test_unknown_bundled_plugin_is_config_error() {
        let err = pipeline("plugins: [forms]").unwrap_err();
        assert!(matches!(err, UcssError::Config { .. }));
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        let (theme, grammar) = Pipeline::new()
            .apply(default_theme().clone(), Grammar::builtin())
            .unwrap();
        assert_eq!(&theme, default_theme());
        assert_eq!(grammar.utility_count(), Grammar::builtin().utility_count());
    }
}
