//! Init command implementation.
//!
//! Writes a starter `ucss.yaml` whose `content` globs cover the template
//! and source files already in the project.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use walkdir::{DirEntry, WalkDir};

use crate::config::CONFIG_FILENAMES;
use crate::error::{Result, UcssError};
use crate::output::{display_path, plural, Printer};
use crate::scan::RECOGNIZED_EXTENSIONS;

/// Directories never suggested as content.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target", "dist", "build", "vendor"];

/// Write a starter ucss.yaml
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs, printer: &Printer) -> Result<()> {
    let config_path = args.path.join(CONFIG_FILENAMES[0]);

    if let Some(existing) = CONFIG_FILENAMES
        .iter()
        .map(|name| args.path.join(name))
        .find(|path| path.exists())
    {
        if !args.force {
            return Err(UcssError::Config {
                message: format!("{} already exists", display_path(&existing)),
                help: Some("Use --force to overwrite".to_string()),
            });
        }
    }

    printer.status("Scanning", &display_path(&args.path));
    let discovered = discover_content(&args.path);
    let patterns = content_patterns(&discovered);

    let yaml = starter_config(&patterns);
    fs::write(&config_path, &yaml).map_err(|e| UcssError::Io {
        path: config_path.clone(),
        message: format!("Failed to write config: {}", e),
    })?;

    if !patterns.is_empty() {
        printer.info("Discovered", &patterns.join(", "));
    }
    let total: usize = discovered.values().map(BTreeSet::len).sum();
    printer.status(
        "Created",
        &format!(
            "{} ({} found)",
            CONFIG_FILENAMES[0],
            plural(total, "content file", "content files")
        ),
    );

    Ok(())
}

/// Content files grouped by top-level directory ("" for the project root),
/// as `(extension, relative path)`.
fn discover_content(root: &Path) -> BTreeMap<String, BTreeSet<(String, PathBuf)>> {
    let mut found: BTreeMap<String, BTreeSet<(String, PathBuf)>> = BTreeMap::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped(entry));

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !RECOGNIZED_EXTENSIONS.contains(&ext) || ext == "md" || ext == "txt" {
            continue;
        }

        let top = if relative.components().count() > 1 {
            relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .unwrap_or_default()
        } else {
            String::new()
        };
        found
            .entry(top)
            .or_default()
            .insert((ext.to_string(), relative.to_path_buf()));
    }

    found
}

fn is_skipped(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()))
}

fn content_patterns(found: &BTreeMap<String, BTreeSet<(String, PathBuf)>>) -> Vec<String> {
    found
        .iter()
        .map(|(dir, files)| {
            let exts: BTreeSet<&str> = files.iter().map(|(ext, _)| ext.as_str()).collect();
            let exts: Vec<&str> = exts.into_iter().collect();
            let ext_glob = if exts.len() == 1 {
                exts[0].to_string()
            } else {
                format!("{{{}}}", exts.join(","))
            };
            if dir.is_empty() {
                format!("./*.{}", ext_glob)
            } else {
                format!("./{}/**/*.{}", dir, ext_glob)
            }
        })
        .collect()
}

fn starter_config(patterns: &[String]) -> String {
    let mut yaml = String::from("content:\n");
    if patterns.is_empty() {
        yaml.push_str("  - \"./**/*.html\"\n");
    } else {
        for pattern in patterns {
            yaml.push_str(&format!("  - \"{}\"\n", pattern));
        }
    }
    yaml.push_str("theme:\n  extend: {}\nplugins: []\n");
    yaml
}
