use clap::Args;
use std::path::PathBuf;

use crate::cli::output::*;
use crate::cli::DatabaseSelection;
use crate::core::types::DatabaseKind;
use crate::Config;

#[derive(Args)]
pub struct GenerateArgs {
    /// Database backend (sql, serialized)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "serialized")]
    pub kind: DatabaseKind,

    /// Output database file (defaults to the configured path for the backend)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Keep whatever was written if a later stage fails
    #[arg(long)]
    pub keep_partial: bool,
}

pub fn run(args: GenerateArgs, mut config: Config) -> anyhow::Result<()> {
    if args.keep_partial {
        config.database.keep_partial_on_failure = true;
    }

    let selection = DatabaseSelection {
        kind: args.kind,
        database: args.output,
    };
    let mut manager = selection.open(config)?;

    section_header(&format!("Generating {} database", args.kind));
    manager.generate_database()?;

    let (taxa, terms) = manager.counts()?;
    success("Database generated");
    tree(&[
        ("Path", display_path(manager.database_path())),
        ("Taxonomy entries", taxa.to_string()),
        ("Gene Ontology terms", terms.to_string()),
    ]);
    Ok(())
}

pub(crate) fn display_path(path: Option<&std::path::Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}
