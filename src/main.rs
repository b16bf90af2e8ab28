use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;
use ucss::cli::{Cli, Commands};
use ucss::output::Printer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("UCSS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let printer = Printer::new();

    match cli.command {
        Commands::Build(args) => ucss::cli::build::run(args, &printer)?,
        Commands::Scan(args) => ucss::cli::scan::run(args, &printer)?,
        Commands::Init(args) => ucss::cli::init::run(args, &printer)?,
        Commands::Completions(args) => ucss::cli::completions::run(args)?,
    }

    Ok(())
}
