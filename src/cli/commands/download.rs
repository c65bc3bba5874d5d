use clap::Args;
use std::path::PathBuf;

use crate::cli::commands::generate::display_path;
use crate::cli::output::*;
use crate::cli::DatabaseSelection;
use crate::core::types::DatabaseKind;
use crate::Config;

#[derive(Args)]
pub struct DownloadArgs {
    /// Database backend (sql, serialized)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "serialized")]
    pub kind: DatabaseKind,

    /// Output database file (defaults to the configured path for the backend)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Source URL of the gzip-compressed database, overriding the configuration
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,
}

pub fn run(args: DownloadArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(url) = args.url {
        match args.kind {
            DatabaseKind::Sql => config.sources.sql_url = Some(url),
            DatabaseKind::Serialized => config.sources.serialized_url = Some(url),
        }
    }

    let selection = DatabaseSelection {
        kind: args.kind,
        database: args.output,
    };
    let mut manager = selection.open(config)?;

    section_header(&format!("Downloading {} database", args.kind));
    manager.download_database()?;

    let (taxa, terms) = manager.counts()?;
    success("Database downloaded");
    tree(&[
        ("Path", display_path(manager.database_path())),
        ("Taxonomy entries", taxa.to_string()),
        ("Gene Ontology terms", terms.to_string()),
    ]);
    Ok(())
}
