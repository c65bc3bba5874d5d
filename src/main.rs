use annodb::cli::{resolve_config, Cli, Commands};
use annodb::RefDbError;
use clap::Parser;
use colored::*;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // ANNODB_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let log_level = std::env::var("ANNODB_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<RefDbError>() {
            Some(RefDbError::Config(_)) => 2,
            Some(RefDbError::Io(_)) => 3,
            Some(
                RefDbError::ParseMalformedRow { .. }
                | RefDbError::CyclicLineage { .. }
                | RefDbError::DanglingParent { .. },
            ) => 4,
            Some(
                RefDbError::DownloadFailed { .. }
                | RefDbError::DecompressFailed { .. }
                | RefDbError::SourceFileMissing { .. },
            ) => 5,
            Some(_) => 6,
            None => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate(args) => annodb::cli::commands::generate::run(args, config),
        Commands::Download(args) => annodb::cli::commands::download::run(args, config),
        Commands::Taxonomy(args) => annodb::cli::commands::lookup::run_taxonomy(args, config),
        Commands::Go(args) => annodb::cli::commands::lookup::run_go(args, config),
        Commands::Info(args) => annodb::cli::commands::info::run(args, config),
        Commands::Config(args) => annodb::cli::commands::config::run(args, config),
    }
}
