//! Scan command implementation.
//!
//! Prints the class tokens found in content, one per line on stdout.

use std::path::PathBuf;

use clap::Args;

use crate::build::generate_all;
use crate::error::Result;
use crate::generate::Grammar;
use crate::output::{plural, Printer};
use crate::plugin::Pipeline;
use crate::scan::{scan, ContentFiles};
use crate::theme::Theme;

/// List the class tokens found in content
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Project root (default: current directory)
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Config file (default: ucss.yaml in the project root)
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Only list tokens that do not match any utility
    #[arg(long)]
    pub unresolved: bool,
}

pub fn run(args: ScanArgs, printer: &Printer) -> Result<()> {
    for token in collect(&args, printer)? {
        println!("{}", token);
    }
    Ok(())
}

fn collect(args: &ScanArgs, printer: &Printer) -> Result<Vec<String>> {
    let (config, _) = super::load_config(&args.root, args.config.as_deref())?;
    let (files, diagnostics) = ContentFiles::resolve(&config, &args.root)?;
    printer.status("Scanning", &plural(files.len(), "file", "files"));

    let output = scan(&files);
    for diagnostic in diagnostics.iter().chain(output.diagnostics.iter()) {
        printer.diagnostic(diagnostic);
    }

    if !args.unresolved {
        return Ok(output.tokens.into_iter().collect());
    }

    let theme = Theme::resolve(&config.theme)?;
    let grammar = Grammar::builtin().with_dark_mode(config.dark_mode);
    let (theme, grammar) = Pipeline::from_refs(&config.plugins)?.apply(theme, grammar)?;
    let (_, unresolved) = generate_all(&output.tokens, &theme, &grammar);
    Ok(unresolved.into_iter().collect())
}
