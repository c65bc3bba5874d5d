use clap::Args;

use crate::cli::commands::generate::display_path;
use crate::cli::output::*;
use crate::cli::DatabaseSelection;
use crate::core::paths;
use crate::Config;

#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    pub selection: DatabaseSelection,

    /// Also show the resolved annodb directories
    #[arg(long)]
    pub paths: bool,
}

pub fn run(args: InfoArgs, config: Config) -> anyhow::Result<()> {
    let format = config.database.serialization_format;
    let manager = args.selection.open(config)?;

    section_header("Database Information");
    let mut items = vec![
        ("Backend", args.selection.kind.to_string()),
        ("Path", display_path(manager.database_path())),
    ];
    if args.selection.kind == crate::DatabaseKind::Serialized {
        items.push(("Format", format!("{:?}", format).to_lowercase()));
    }

    if manager.is_populated() {
        let (taxa, terms) = manager.counts()?;
        items.push(("Taxonomy entries", taxa.to_string()));
        items.push(("Gene Ontology terms", terms.to_string()));
        tree(&items);
    } else {
        tree(&items);
        warning("Database has not been generated yet");
    }

    if args.paths {
        println!();
        info(&paths::describe_paths());
    }
    Ok(())
}
