use clap::Args;

use crate::cli::output::*;
use crate::cli::DatabaseSelection;
use crate::{Config, DatabaseManager};

#[derive(Args)]
pub struct TaxonomyArgs {
    /// Species or taxon name, matched case-insensitively
    pub species: String,

    #[command(flatten)]
    pub selection: DatabaseSelection,

    /// Print the entry as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct GoArgs {
    /// GO accession (e.g. GO:0005634)
    pub go_id: String,

    #[command(flatten)]
    pub selection: DatabaseSelection,

    /// Print the entry as JSON
    #[arg(long)]
    pub json: bool,
}

fn open_populated(
    selection: &DatabaseSelection,
    config: Config,
) -> anyhow::Result<DatabaseManager> {
    let manager = selection.open(config)?;
    if !manager.is_populated() {
        anyhow::bail!(
            "No {} database at {}; run `annodb generate --type {}` first",
            selection.kind,
            manager
                .database_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            selection.kind
        );
    }
    Ok(manager)
}

pub fn run_taxonomy(args: TaxonomyArgs, config: Config) -> anyhow::Result<()> {
    let manager = open_populated(&args.selection, config)?;

    let Some(entry) = manager.get_tax_entry(&args.species) else {
        empty(&format!("No taxonomy entry for '{}'", args.species));
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    section_header(&entry.tax_name);
    tree(&[
        ("Tax ID", entry.tax_id.clone()),
        ("Lineage", entry.lineage.clone()),
    ]);
    Ok(())
}

pub fn run_go(args: GoArgs, config: Config) -> anyhow::Result<()> {
    let manager = open_populated(&args.selection, config)?;

    let Some(entry) = manager.get_go_entry(args.go_id.trim()) else {
        empty(&format!("No Gene Ontology term '{}'", args.go_id));
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    section_header(&entry.go_id);
    tree(&[
        ("Term", entry.term.clone()),
        ("Category", entry.category.clone()),
        (
            "Level",
            entry
                .level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    ]);
    Ok(())
}
