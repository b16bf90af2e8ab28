//! ucss - utility-class stylesheet generator
//!
//! A library for scanning templates for class tokens and generating the
//! matching utility CSS from a theme and a set of grammar plugins.

pub mod assemble;
pub mod build;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generate;
pub mod output;
pub mod plugin;
pub mod scan;
pub mod theme;

pub use assemble::{assemble, AssembleOptions, Layer, Stylesheet};
pub use build::{build, build_project, generate_all, BuildResult, BuildStats};
pub use config::{Config, DarkMode};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Result, UcssError};
pub use generate::{generate, Declaration, Generated, Grammar, UtilityDef, UtilityRule};
pub use plugin::{Pipeline, Plugin};
pub use scan::{scan, ContentFiles, Extractor, ScanOutput};
pub use theme::Theme;
