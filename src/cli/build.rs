//! Build command implementation.
//!
//! Runs a full build and writes the stylesheet to a file or stdout.
//! Diagnostics go to stderr, or to stdout as JSON with `--report json`.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::{Args, ValueEnum};

use crate::build::{build, BuildResult};
use crate::error::{Result, UcssError};
use crate::output::{byte_size, display_path, plural, Printer};

/// Scan content and write the stylesheet
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: ucss.yaml in the project root)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Write the stylesheet to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Emit compact CSS
    #[arg(long)]
    pub minify: bool,

    /// Emit a machine-readable build report on stdout
    #[arg(long, value_enum, requires = "output")]
    pub report: Option<ReportFormat>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
}

pub fn run(args: BuildArgs, printer: &Printer) -> Result<()> {
    let (mut config, config_path) = super::load_config(&args.root, args.config.as_deref())?;
    config.minify |= args.minify;

    match &config_path {
        Some(path) => printer.status("Loading", &display_path(path)),
        None => printer.info("Using", "default config (no ucss.yaml found)"),
    }

    let result = build(&config, &args.root)?;

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| UcssError::Io {
                    path: parent.to_path_buf(),
                    message: format!("Failed to create output directory: {}", e),
                })?;
            }
            fs::write(path, &result.stylesheet).map_err(|e| UcssError::Io {
                path: path.clone(),
                message: format!("Failed to write stylesheet: {}", e),
            })?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(result.stylesheet.as_bytes())?;
        }
    }

    match args.report {
        Some(ReportFormat::Json) => print_report(&result)?,
        None => {
            for diagnostic in result.diagnostics.iter() {
                printer.diagnostic(diagnostic);
            }
        }
    }

    let summary = format!(
        "{} from {} ({})",
        plural(result.stats.rules_emitted, "rule", "rules"),
        plural(result.stats.files_scanned, "file", "files"),
        byte_size(result.stylesheet.len()),
    );
    match &args.output {
        Some(path) => {
            printer.status("Finished", &format!("{} -> {}", summary, display_path(path)))
        }
        None => printer.status("Finished", &summary),
    }

    Ok(())
}

fn print_report(result: &BuildResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
