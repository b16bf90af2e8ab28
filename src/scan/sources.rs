//! Content source resolution: globs -> an ordered, deduplicated file list.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::{Config, ContentEntry};
use crate::diagnostics::{codes, Diagnostic, Diagnostics};
use crate::error::{Result, UcssError};

use super::extract::Extractor;

/// File extensions scanned for class names. Everything else is skipped
/// even when a glob matches it.
pub const RECOGNIZED_EXTENSIONS: &[&str] = &[
    "html", "htm", "j2", "jinja", "jinja2", "njk", "hbs", "twig", "erb", "php", "vue", "svelte",
    "astro", "js", "jsx", "mjs", "cjs", "ts", "tsx", "md", "mdx", "rs", "txt", "css", "scss",
    "less",
];

/// Where a piece of content came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentOrigin {
    File(PathBuf),
    /// Inline `raw` content, by position in the config.
    Raw(usize),
}

impl fmt::Display for ContentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentOrigin::File(path) => write!(f, "{}", path.display()),
            ContentOrigin::Raw(index) => write!(f, "<raw content #{}>", index + 1),
        }
    }
}

/// One piece of content, read on demand.
#[derive(Debug)]
pub struct Content<'a> {
    pub origin: &'a ContentOrigin,
    pub text: std::io::Result<Cow<'a, str>>,
    pub extractor: &'a Extractor,
}

#[derive(Debug, Clone)]
struct Item {
    origin: ContentOrigin,
    extractor: usize,
}

/// Resolved content for one build.
///
/// The file list is fixed when resolved; file contents are read lazily,
/// every time [`ContentFiles::iter`] is called.
#[derive(Debug, Clone, Default)]
pub struct ContentFiles {
    items: Vec<Item>,
    raw: Vec<String>,
    extractors: Vec<Extractor>,
}

impl ContentFiles {
    /// Resolve the config's content sources against a project root.
    ///
    /// Invalid globs and extract patterns are fatal. Patterns that match
    /// nothing and directories that cannot be walked are reported as
    /// warnings.
    pub fn resolve(config: &Config, root: &Path) -> Result<(Self, Diagnostics)> {
        let exclude = build_exclude(&config.exclude)?;
        let mut files = ContentFiles {
            extractors: vec![Extractor::Default],
            ..Default::default()
        };
        let mut diagnostics = Diagnostics::new();
        let mut seen = HashSet::new();

        for entry in &config.content {
            match entry {
                ContentEntry::Glob(pattern) => {
                    files.add_pattern(root, pattern, 0, &exclude, &mut seen, &mut diagnostics)?;
                }
                ContentEntry::Files { files: patterns, extract } => {
                    let extractor = match extract {
                        Some(pattern) => {
                            files.extractors.push(Extractor::custom(pattern)?);
                            files.extractors.len() - 1
                        }
                        None => 0,
                    };
                    for pattern in patterns {
                        files.add_pattern(
                            root,
                            pattern,
                            extractor,
                            &exclude,
                            &mut seen,
                            &mut diagnostics,
                        )?;
                    }
                }
                ContentEntry::Raw { raw, .. } => {
                    files.items.push(Item {
                        origin: ContentOrigin::Raw(files.raw.len()),
                        extractor: 0,
                    });
                    files.raw.push(raw.clone());
                }
            }
        }

        debug!(files = files.items.len(), "resolved content sources");
        Ok((files, diagnostics))
    }

    fn add_pattern(
        &mut self,
        root: &Path,
        pattern: &str,
        extractor: usize,
        exclude: &GlobSet,
        seen: &mut HashSet<PathBuf>,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let pattern = normalize_pattern(root, pattern);
        let matcher = compile_glob(&pattern)?.compile_matcher();
        let base = if has_glob_meta(&pattern) {
            literal_base(&pattern)
        } else {
            PathBuf::from(&pattern)
        };
        let depth = walk_depth(&pattern, &base);
        let reportable = |relative: &str| {
            matcher.is_match(relative) || may_contain_match(&pattern, relative)
        };

        let mut matched = 0usize;
        for path in walk(root, &root.join(&base), depth, reportable, diagnostics) {
            let Some(relative) = relative_path(root, &path) else {
                continue;
            };
            if !matcher.is_match(&relative) || exclude.is_match(&relative) {
                continue;
            }
            if !has_recognized_extension(&path) {
                continue;
            }

            matched += 1;
            let canonical = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if seen.insert(canonical) {
                self.items.push(Item {
                    origin: ContentOrigin::File(path),
                    extractor,
                });
            }
        }

        if matched == 0 {
            warn!(pattern = %pattern, "content pattern matched no files");
            diagnostics.push(
                Diagnostic::warning(
                    codes::EMPTY_PATTERN,
                    format!("content pattern '{}' matched no files", pattern),
                )
                .with_help(format!(
                    "Patterns are relative to the project root; recognized extensions: {}",
                    RECOGNIZED_EXTENSIONS.join(", ")
                )),
            );
        }

        Ok(())
    }

    /// Number of content items (files plus inline snippets).
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Paths of the resolved files, in scan order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.items.iter().filter_map(|item| match &item.origin {
            ContentOrigin::File(path) => Some(path.as_path()),
            ContentOrigin::Raw(_) => None,
        })
    }

    /// Read every item in order. Each call starts over from the first file.
    pub fn iter(&self) -> impl Iterator<Item = Content<'_>> + '_ {
        self.items.iter().map(move |item| self.load(item))
    }

    /// Read the item at `index`.
    pub fn get(&self, index: usize) -> Option<Content<'_>> {
        self.items.get(index).map(|item| self.load(item))
    }

    fn load<'a>(&'a self, item: &'a Item) -> Content<'a> {
        let text = match &item.origin {
            ContentOrigin::File(path) => std::fs::read(path)
                .map(|bytes| Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())),
            ContentOrigin::Raw(index) => Ok(Cow::Borrowed(
                self.raw.get(*index).map(String::as_str).unwrap_or_default(),
            )),
        };
        Content {
            origin: &item.origin,
            text,
            extractor: &self.extractors[item.extractor],
        }
    }
}

fn build_exclude(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile_glob(pattern.trim_start_matches("./"))?);
    }
    builder
        .build()
        .map_err(|e| UcssError::config(format!("invalid exclude patterns: {}", e)))
}

fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| UcssError::Config {
            message: format!("invalid glob '{}': {}", pattern, e),
            help: Some("Use `*`, `**`, `?` and `{a,b}` alternation".to_string()),
        })
}

/// Strip `./` and expand a bare directory to everything below it.
fn normalize_pattern(root: &Path, pattern: &str) -> String {
    let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
    if !has_glob_meta(pattern) && root.join(pattern).is_dir() {
        if pattern.is_empty() {
            "**/*".to_string()
        } else {
            format!("{}/**/*", pattern)
        }
    } else {
        pattern.to_string()
    }
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// The leading directories of a pattern that contain no glob syntax.
fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let mut parts = pattern.split('/').peekable();
    while let Some(part) = parts.next() {
        if has_glob_meta(part) || parts.peek().is_none() {
            break;
        }
        base.push(part);
    }
    base
}

/// How deep below its literal base a pattern can match, `None` if unbounded.
fn walk_depth(pattern: &str, base: &Path) -> Option<usize> {
    if pattern.contains("**") || brace_spans_separator(pattern) {
        return None;
    }
    Some(
        pattern
            .split('/')
            .count()
            .saturating_sub(base.components().count()),
    )
}

fn brace_spans_separator(pattern: &str) -> bool {
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '/' if depth > 0 => return true,
            _ => {}
        }
    }
    false
}

/// Whether the directory at `relative` may hold files matching `pattern`.
fn may_contain_match(pattern: &str, relative: &str) -> bool {
    if brace_spans_separator(pattern) {
        return true;
    }
    let segments: Vec<&str> = pattern.split('/').collect();
    let parts: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();

    for (i, part) in parts.iter().enumerate() {
        let Some(segment) = segments.get(i) else {
            return false;
        };
        if segment.contains("**") {
            return true;
        }
        match Glob::new(segment) {
            Ok(glob) if !glob.compile_matcher().is_match(part) => return false,
            _ => {}
        }
    }
    parts.len() < segments.len()
}

/// Files below `base`, at most `max_depth` levels down.
///
/// Walk errors are reported only for paths `reportable` accepts, so a
/// broken directory the pattern could never reach stays quiet.
fn walk(
    root: &Path,
    base: &Path,
    max_depth: Option<usize>,
    reportable: impl Fn(&str) -> bool,
    diagnostics: &mut Diagnostics,
) -> Vec<PathBuf> {
    if !base.exists() {
        return Vec::new();
    }

    let mut walker = WalkDir::new(base).follow_links(true).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut paths = Vec::new();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => paths.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => {
                let relevant = err
                    .path()
                    .and_then(|p| relative_path(root, p))
                    .map_or(true, |relative| reportable(&relative));
                if !relevant {
                    debug!(error = %err, "ignoring walk error outside pattern");
                    continue;
                }
                let location = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| base.display().to_string());
                warn!(path = %location, error = %err, "skipping unreadable path");
                diagnostics.push(Diagnostic::warning(
                    codes::UNREADABLE_FILE,
                    format!("cannot read {}: {}", location, err),
                ));
            }
        }
    }
    paths
}

/// Path relative to the root with `/` separators, for glob matching.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    Some(parts.join("/"))
}

fn has_recognized_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}
