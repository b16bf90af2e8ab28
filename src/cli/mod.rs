pub mod build;
pub mod completions;
pub mod init;
pub mod scan;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;

/// ucss - utility-class stylesheet generator
#[derive(Parser, Debug)]
#[command(name = "ucss")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan content and write the stylesheet
    Build(build::BuildArgs),

    /// List the class tokens found in content
    Scan(scan::ScanArgs),

    /// Write a starter ucss.yaml
    Init(init::InitArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Load an explicit config file, or discover one in the project root.
pub(crate) fn load_config(root: &Path, config: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    match config {
        Some(path) => Ok((Config::load(path)?, Some(path.to_path_buf()))),
        None => Config::discover(root),
    }
}
