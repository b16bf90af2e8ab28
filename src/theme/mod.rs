//! Theme resolution.
//!
//! A [`Theme`] maps an axis name (`spacing`, `colors`, ...) to a flat scale
//! of `key -> CSS value`. The resolved theme for a build is produced once
//! from the built-in defaults and the user's `theme` config:
//!
//! - axes under `theme.extend` are merged into the base axis, extension
//!   keys overriding base keys of the same name;
//! - axes given directly under `theme` replace the base axis wholesale.
//!
//! When an axis appears in both places the replacement happens first and
//! the extension is applied on top of it.
//!
//! # Example
//!
//! ```ignore
//! use ucss::theme::Theme;
//!
//! let theme = Theme::resolve(&config.theme)?;
//! assert_eq!(theme.get("spacing", "4"), Some("1rem"));
//! ```

mod defaults;
mod scale;

use std::collections::BTreeMap;

use crate::config::ThemeConfig;
use crate::error::Result;

pub use defaults::default_theme;
pub use scale::{scale_from_value, DEFAULT_KEY};

/// A single axis: key -> literal CSS value.
pub type Scale = BTreeMap<String, String>;

/// Resolved design values for one build. Immutable once resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    axes: BTreeMap<String, Scale>,
    /// Sorted view of the `screens` axis, rebuilt whenever it changes.
    screens: Vec<Screen>,
}

/// A responsive breakpoint, ranked by its minimum width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub name: String,
    pub min_width: String,
    /// 1-based position in ascending min-width order.
    pub rank: u32,
}

impl Theme {
    /// Create an empty theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a config theme against the built-in defaults.
    pub fn resolve(config: &ThemeConfig) -> Result<Self> {
        resolve(default_theme(), config)
    }

    /// Get an axis by name.
    pub fn axis(&self, name: &str) -> Option<&Scale> {
        self.axes.get(name)
    }

    /// Get a single value.
    pub fn get(&self, axis: &str, key: &str) -> Option<&str> {
        self.axes.get(axis)?.get(key).map(String::as_str)
    }

    /// Look a key up through a chain of axes, first hit wins.
    pub fn lookup<S: AsRef<str>>(&self, axes: &[S], key: &str) -> Option<&str> {
        axes.iter().find_map(|axis| self.get(axis.as_ref(), key))
    }

    /// Get all axis names.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(|s| s.as_str())
    }

    /// Replace an axis.
    pub fn set_axis(&mut self, axis: impl Into<String>, scale: Scale) {
        let axis = axis.into();
        self.axes.insert(axis.clone(), scale);
        self.axis_changed(&axis);
    }

    /// Merge entries into an axis, creating it if needed.
    pub fn extend_axis(&mut self, axis: &str, scale: Scale) {
        self.axes.entry(axis.to_string()).or_default().extend(scale);
        self.axis_changed(axis);
    }

    /// Insert one value.
    pub fn insert(&mut self, axis: &str, key: impl Into<String>, value: impl Into<String>) {
        self.axes
            .entry(axis.to_string())
            .or_default()
            .insert(key.into(), value.into());
        self.axis_changed(axis);
    }

    fn axis_changed(&mut self, axis: &str) {
        if axis == "screens" {
            self.screens = sorted_screens(self.axes.get(axis));
        }
    }

    /// Breakpoints in ascending min-width order.
    ///
    /// Widths are compared in pixels (`rem`/`em` count as 16px); values that
    /// do not parse sort after all others, by name.
    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    /// Find a breakpoint by name.
    pub fn screen(&self, name: &str) -> Option<&Screen> {
        self.screens.iter().find(|s| s.name == name)
    }
}

fn sorted_screens(axis: Option<&Scale>) -> Vec<Screen> {
    let Some(axis) = axis else {
        return Vec::new();
    };

    let mut screens: Vec<(f64, &String, &String)> = axis
        .iter()
        .map(|(name, value)| (width_in_px(value).unwrap_or(f64::MAX), name, value))
        .collect();
    screens.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    screens
        .into_iter()
        .enumerate()
        .map(|(i, (_, name, value))| Screen {
            name: name.clone(),
            min_width: value.clone(),
            rank: i as u32 + 1,
        })
        .collect()
}

/// Resolve a config theme against an explicit base theme.
pub fn resolve(base: &Theme, config: &ThemeConfig) -> Result<Theme> {
    let mut theme = base.clone();

    for (axis, value) in &config.axes {
        theme.set_axis(axis.clone(), scale_from_value(axis, value)?);
    }

    for (axis, value) in &config.extend {
        theme.extend_axis(axis, scale_from_value(axis, value)?);
    }

    Ok(theme)
}

fn width_in_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let (number, factor) = if let Some(n) = value.strip_suffix("px") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, 16.0)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, 16.0)
    } else {
        (value, 1.0)
    };
    number.trim().parse::<f64>().ok().map(|n| n * factor)
}
