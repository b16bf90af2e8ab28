//! Project configuration (`ucss.yaml`) parsing.
//!
//! The config declares which files to scan, how the theme extends or
//! replaces the built-in scales, and which plugins run. JSON is accepted
//! as well, since every JSON document is valid YAML.
//!
//! ```yaml
//! content:
//!   - "./src/**/*.rs"
//!   - "./templates/**/*.{html,html.j2}"
//! theme:
//!   extend:
//!     colors:
//!       brand: "#0f766e"
//! plugins:
//!   - aspect-ratio
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::assemble::Layer;
use crate::error::{Result, UcssError};
use crate::generate::{Transform, ValueKind};

/// Config file names looked up in the project root, in order.
pub const CONFIG_FILENAMES: &[&str] = &["ucss.yaml", "ucss.yml", "ucss.json"];

/// Project configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    /// Files (or inline snippets) to scan for class names.
    pub content: Vec<ContentEntry>,

    /// Glob patterns removed from every content source.
    pub exclude: Vec<String>,

    /// Theme overrides and extensions.
    pub theme: ThemeConfig,

    /// Plugins, applied in declaration order.
    pub plugins: Vec<PluginRef>,

    /// How the `dark:` variant is expressed.
    pub dark_mode: DarkMode,

    /// Emit the base reset layer before components and utilities.
    pub preflight: bool,

    /// Emit compact CSS without whitespace.
    pub minify: bool,
}

/// One entry of the `content` list.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ContentEntry {
    /// A single glob pattern relative to the project root.
    Glob(String),

    /// Several patterns sharing an optional custom extractor regex.
    Files {
        files: Vec<String>,
        #[serde(default)]
        extract: Option<String>,
    },

    /// Inline content scanned as if it were a file.
    Raw {
        raw: String,
        #[serde(default)]
        extension: Option<String>,
    },
}

/// The `theme` section.
///
/// Axes directly under `theme` replace the built-in axis; axes under
/// `theme.extend` are merged into it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub extend: BTreeMap<String, Value>,

    #[serde(flatten)]
    pub axes: BTreeMap<String, Value>,
}

/// Strategy for the `dark:` variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DarkMode {
    /// `@media (prefers-color-scheme: dark)`
    #[default]
    Media,
    /// `.dark` ancestor class
    Class,
}

/// A plugin reference: a bundled plugin name or an inline definition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PluginRef {
    Bundled(String),
    Inline(PluginSpec),
}

/// Inline plugin definition, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PluginSpec {
    /// Adds or overrides functional utilities (`tab-2`, `tab-4`, ...).
    Grammar {
        name: String,
        utilities: Vec<UtilitySpec>,
    },

    /// Maps exact class names to fixed declarations.
    Static {
        name: String,
        #[serde(default)]
        layer: Layer,
        rules: IndexMap<String, IndexMap<String, Scalar>>,
    },

    /// Rewrites the resolved theme before generation.
    Theme { name: String, ops: Vec<ThemeOpSpec> },
}

impl PluginSpec {
    /// The plugin's declared name.
    pub fn name(&self) -> &str {
        match self {
            PluginSpec::Grammar { name, .. }
            | PluginSpec::Static { name, .. }
            | PluginSpec::Theme { name, .. } => name,
        }
    }
}

/// A functional utility contributed by a grammar plugin.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UtilitySpec {
    pub prefix: String,
    pub properties: Vec<String>,
    #[serde(default)]
    pub axes: Vec<String>,
    #[serde(default)]
    pub values: Option<Value>,
    #[serde(default, rename = "type")]
    pub accepts: ValueKind,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub negative: bool,
    #[serde(default)]
    pub extra: IndexMap<String, Scalar>,
}

/// A theme transform step, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ThemeOpSpec {
    Set { axis: String, key: Scalar, value: Scalar },
    Alias { from: String, to: String },
    Extend { axis: String, values: Value },
}

/// A YAML scalar read as text, so `2`, `"2"` and `true` all work as keys
/// and values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Scalar(s)),
            Value::Number(n) => Ok(Scalar(n.to_string())),
            Value::Bool(b) => Ok(Scalar(b.to_string())),
            _ => Err(D::Error::custom("expected a string or number")),
        }
    }
}

impl Config {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| UcssError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to read config: {}", e),
        })?;

        Self::parse(&content)
    }

    /// Parse config from a YAML (or JSON) string.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| UcssError::Config {
            message: format!("Invalid config: {}", e),
            help: Some(
                "Top-level keys are content, exclude, theme, plugins, darkMode, preflight, minify"
                    .to_string(),
            ),
        })
    }

    /// Find the config file in a project root.
    pub fn find(root: &Path) -> Option<PathBuf> {
        CONFIG_FILENAMES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
    }

    /// Load the project's config, or the default config if there is none.
    pub fn discover(root: &Path) -> Result<(Self, Option<PathBuf>)> {
        match Self::find(root) {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tailwind_style_config() {
        let yaml = r#"
content:
  - './src/**/*.rs'
  - "./templates/**/*.{html,html.j2}"
  - "./public/**/*.{html,js,css}"
theme:
  extend: {}
plugins: []
"#;
        let config = Config::parse(yaml).unwrap();

        assert_eq!(config.content.len(), 3);
        assert_eq!(
            config.content[0],
            ContentEntry::Glob("./src/**/*.rs".to_string())
        );
        assert!(config.theme.extend.is_empty());
        assert!(config.theme.axes.is_empty());
        assert!(config.plugins.is_empty());
        assert_eq!(config.dark_mode, DarkMode::Media);
        assert!(!config.preflight);
    }

    #[test]
    fn test_parse_json_config() {
        let json = r#"{"content": ["*.html"], "theme": {"extend": {"spacing": {"18": "4.5rem"}}}}"#;
        let config = Config::parse(json).unwrap();

        assert_eq!(config.content, vec![ContentEntry::Glob("*.html".to_string())]);
        assert!(config.theme.extend.contains_key("spacing"));
    }

    #[test]
    fn test_parse_content_variants() {
        let yaml = r#"
content:
  - files: ["src/**/*.vue"]
    extract: 'class="([^"]*)"'
  - raw: '<div class="p-4">'
    extension: html
"#;
        let config = Config::parse(yaml).unwrap();

        assert!(matches!(
            &config.content[0],
            ContentEntry::Files { files, extract: Some(_) } if files.len() == 1
        ));
        assert!(matches!(
            &config.content[1],
            ContentEntry::Raw { extension: Some(ext), .. } if ext == "html"
        ));
    }

    #[test]
    fn test_bare_theme_axes_separate_from_extend() {
        let yaml = r##"
theme:
  spacing:
    2: 0.5rem
  extend:
    colors:
      brand: "#123456"
"##;
        let config = Config::parse(yaml).unwrap();

        assert!(config.theme.axes.contains_key("spacing"));
        assert!(!config.theme.axes.contains_key("extend"));
        assert!(config.theme.extend.contains_key("colors"));
    }

    #[test]
    fn test_unknown_top_level_key_is_fatal() {
        let err = Config::parse("contnet: ['*.html']").unwrap_err();
        assert!(matches!(err, UcssError::Config { .. }));
    }

    #[test]
    fn test_wrong_type_is_fatal() {
        assert!(Config::parse("content: 42").is_err());
        assert!(Config::parse("minify: maybe").is_err());
    }

    #[test]
    fn test_parse_plugins() {
        let yaml = r##"
darkMode: class
plugins:
  - aspect-ratio
  - name: buttons
    kind: static
    layer: components
    rules:
      btn:
        padding: 0.5rem 1rem
        border-radius: 0.25rem
  - name: tabs
    kind: grammar
    utilities:
      - prefix: tab
        properties: [tab-size]
        values: {2: 2, 4: 4}
        type: number
  - name: brand
    kind: theme
    ops:
      - { op: set, axis: colors, key: brand, value: "#0f766e" }
      - { op: alias, from: colors, to: accentColor }
"##;
        let config = Config::parse(yaml).unwrap();

        assert_eq!(config.dark_mode, DarkMode::Class);
        assert_eq!(config.plugins.len(), 4);
        assert_eq!(config.plugins[0], PluginRef::Bundled("aspect-ratio".to_string()));

        let PluginRef::Inline(PluginSpec::Static { name, layer, rules }) = &config.plugins[1] else {
            panic!("expected static plugin");
        };
        assert_eq!(name, "buttons");
        assert_eq!(*layer, Layer::Components);
        let btn: Vec<&str> = rules["btn"].keys().map(String::as_str).collect();
        assert_eq!(btn, vec!["padding", "border-radius"]);

        let PluginRef::Inline(spec) = &config.plugins[2] else {
            panic!("expected inline plugin");
        };
        assert_eq!(spec.name(), "tabs");

        let PluginRef::Inline(PluginSpec::Theme { ops, .. }) = &config.plugins[3] else {
            panic!("expected theme plugin");
        };
        assert_eq!(
            ops[0],
            ThemeOpSpec::Set {
                axis: "colors".to_string(),
                key: Scalar("brand".to_string()),
                value: Scalar("#0f766e".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert!(config.content.is_empty());
        assert!(!config.minify);
    }

    #[test]
    fn test_discover_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let (config, path) = Config::discover(dir.path()).unwrap();
        assert!(path.is_none());
        assert!(config.content.is_empty());
    }

    #[test]
    fn test_discover_prefers_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ucss.json"), r#"{"minify": false}"#).unwrap();
        std::fs::write(dir.path().join("ucss.yaml"), "minify: true").unwrap();

        let (config, path) = Config::discover(dir.path()).unwrap();
        assert!(config.minify);
        assert!(path.unwrap().ends_with("ucss.yaml"));
    }
}
