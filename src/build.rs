//! The build entry point: config + project root -> stylesheet.
//!
//! A build runs the stages in a fixed order:
//!
//! 1. resolve the theme and run the plugin pipeline (fatal on error);
//! 2. resolve content sources and scan them for tokens;
//! 3. generate a rule per token;
//! 4. assemble the rules into CSS.
//!
//! Every fatal error happens before any output exists, so a build either
//! returns a complete stylesheet or none.

use std::collections::BTreeSet;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::assemble::{assemble, AssembleOptions};
use crate::config::Config;
use crate::diagnostics::{codes, Diagnostic, Diagnostics};
use crate::error::Result;
use crate::generate::{generate, Generated, Grammar, UtilityRule};
use crate::plugin::Pipeline;
use crate::scan::{scan, ContentFiles};
use crate::theme::Theme;

/// Counters for one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub files_scanned: usize,
    /// Distinct candidate tokens found by the scanner.
    pub candidate_tokens: usize,
    pub rules_emitted: usize,
    pub unresolved: usize,
}

/// Output of a successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    #[serde(skip)]
    pub stylesheet: String,
    /// Candidate tokens that did not resolve to a rule.
    pub unresolved: BTreeSet<String>,
    pub diagnostics: Diagnostics,
    pub stats: BuildStats,
}

/// Build a stylesheet for the project at `root`.
pub fn build(config: &Config, root: &Path) -> Result<BuildResult> {
    let theme = Theme::resolve(&config.theme)?;
    let grammar = Grammar::builtin().with_dark_mode(config.dark_mode);
    let pipeline = Pipeline::from_refs(&config.plugins)?;
    let (theme, grammar) = pipeline.apply(theme, grammar)?;
    debug!(plugins = pipeline.len(), "theme and grammar ready");

    let (files, mut diagnostics) = ContentFiles::resolve(config, root)?;
    if config.content.is_empty() {
        diagnostics.push(
            Diagnostic::warning(codes::NO_CONTENT, "no content sources configured")
                .with_help("Add glob patterns under `content:` in ucss.yaml"),
        );
    }

    let scanned = scan(&files);
    diagnostics.merge(scanned.diagnostics);

    let (rules, unresolved) = generate_all(&scanned.tokens, &theme, &grammar);
    if !unresolved.is_empty() {
        diagnostics.push(Diagnostic::info(
            codes::UNRESOLVED_TOKEN,
            format!(
                "{} candidate token{} did not match any utility",
                unresolved.len(),
                if unresolved.len() == 1 { "" } else { "s" }
            ),
        ));
    }

    let rules_emitted = rules.len();
    let stylesheet = assemble(
        rules,
        AssembleOptions {
            minify: config.minify,
            preflight: config.preflight,
        },
    );

    let stats = BuildStats {
        files_scanned: scanned.files_scanned,
        candidate_tokens: scanned.tokens.len(),
        rules_emitted,
        unresolved: unresolved.len(),
    };
    info!(
        files = stats.files_scanned,
        rules = stats.rules_emitted,
        unresolved = stats.unresolved,
        "build finished"
    );

    Ok(BuildResult {
        stylesheet,
        unresolved,
        diagnostics,
        stats,
    })
}

/// Build using the config discovered in `root` (or the defaults).
pub fn build_project(root: &Path) -> Result<BuildResult> {
    let (config, path) = Config::discover(root)?;
    if let Some(path) = &path {
        debug!(config = %path.display(), "loaded config");
    }
    build(&config, root)
}

/// Generate every token; tokens are unique, so rules are too.
pub fn generate_all(
    tokens: &BTreeSet<String>,
    theme: &Theme,
    grammar: &Grammar,
) -> (Vec<UtilityRule>, BTreeSet<String>) {
    let tokens: Vec<&String> = tokens.iter().collect();
    let generated: Vec<(&String, Generated)> = tokens
        .par_iter()
        .map(|token| (*token, generate(token, theme, grammar)))
        .collect();

    let mut rules = Vec::new();
    let mut unresolved = BTreeSet::new();
    for (token, outcome) in generated {
        match outcome {
            Generated::Rule(rule) => rules.push(rule),
            Generated::Unresolved => {
                unresolved.insert(token.clone());
            }
        }
    }
    (rules, unresolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UcssError;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_build_two_rules() {
        let dir = tempdir().unwrap();
        write(dir.path(), "index.html", r#"<div class="px-4 md:text-lg"></div>"#);

        let config = Config::parse("content: ['*.html']").unwrap();
        let result = build(&config, dir.path()).unwrap();

        assert_eq!(result.stats.rules_emitted, 2);
        assert_eq!(result.stylesheet.matches('{').count(), 3);
        assert!(result.stylesheet.contains(".px-4 {"));
        assert!(result.stylesheet.contains("@media (min-width: 768px)"));
        assert!(result.unresolved.contains("div"));
    }

    #[test]
    fn test_unknown_tokens_recorded_not_emitted() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.html", r#"<p class="p-4 bogus-thing"></p>"#);

        let config = Config::parse("content: ['a.html']").unwrap();
        let result = build(&config, dir.path()).unwrap();

        assert!(result.unresolved.contains("bogus-thing"));
        assert!(!result.stylesheet.contains("bogus"));
        assert_eq!(
            result.diagnostics.with_code(codes::UNRESOLVED_TOKEN).count(),
            1
        );
    }

    #[test]
    fn test_no_content_warns() {
        let dir = tempdir().unwrap();
        let result = build(&Config::default(), dir.path()).unwrap();
        assert_eq!(result.stylesheet, "");
        assert_eq!(result.diagnostics.with_code(codes::NO_CONTENT).count(), 1);
    }

    #[test]
    fn test_plugin_error_is_fatal() {
        let dir = tempdir().unwrap();
        write(dir.path(), "a.html", r#"<p class="p-4"></p>"#);
        let config = Config::parse(
            "content: ['a.html']\nplugins:\n  - { name: bad, kind: theme, ops: [{ op: alias, from: nope, to: x }] }",
        )
        .unwrap();

        let err = build(&config, dir.path()).unwrap_err();
        assert!(matches!(err, UcssError::Plugin { .. }));
    }

    #[test]
    fn test_bad_theme_is_fatal() {
        let dir = tempdir().unwrap();
        let config = Config::parse("theme:\n  spacing: 4").unwrap();
        assert!(matches!(
            build(&config, dir.path()),
            Err(UcssError::Config { .. })
        ));
    }

    #[test]
    fn test_build_project_discovers_config() {
        let dir = tempdir().unwrap();
        write(dir.path(), "ucss.yaml", "content: ['src/**/*.rs']\nminify: true\n");
        write(dir.path(), "src/main.rs", r#"let c = "flex p-2";"#);

        let result = build_project(dir.path()).unwrap();
        assert_eq!(result.stylesheet, ".flex{display:flex}.p-2{padding:0.5rem}");
    }

    #[test]
    fn test_generate_all_partitions() {
        let tokens: BTreeSet<String> = ["p-4", "nope", "flex"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let theme = crate::theme::default_theme();
        let (rules, unresolved) = generate_all(&tokens, theme, &Grammar::builtin());
        assert_eq!(rules.len(), 2);
        assert_eq!(unresolved.into_iter().collect::<Vec<_>>(), vec!["nope"]);
    }
}
