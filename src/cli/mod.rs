pub mod commands;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::config::{load_config, Config};
use crate::core::paths;
use crate::core::types::DatabaseKind;
use crate::core::DatabaseManager;
use crate::utils::LocalFilesystem;

#[derive(Parser)]
#[command(
    name = "annodb",
    version,
    about = "Build and query taxonomy and Gene Ontology reference databases",
    long_about = "annodb downloads the NCBI taxonomy dump and the Gene Ontology term tables, \
                  compiles lineages and term levels, and stores them in a SQLite or \
                  serialized database for fast lookups during annotation."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (defaults to $ANNODB_HOME/config.toml when present)
    #[arg(short, long, value_name = "FILE", global = true, env = "ANNODB_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a database from the NCBI and Gene Ontology sources
    Generate(commands::generate::GenerateArgs),

    /// Fetch a pre-built database
    Download(commands::download::DownloadArgs),

    /// Look up the lineage of a species
    Taxonomy(commands::lookup::TaxonomyArgs),

    /// Look up a Gene Ontology term
    Go(commands::lookup::GoArgs),

    /// Show database location and record counts
    Info(commands::info::InfoArgs),

    /// Write the default configuration file
    Config(commands::config::ConfigArgs),
}

/// Backend selection shared by every database command
#[derive(Args, Debug, Clone)]
pub struct DatabaseSelection {
    /// Database backend (sql, serialized)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "serialized")]
    pub kind: DatabaseKind,

    /// Database file (defaults to the configured path for the backend)
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

impl DatabaseSelection {
    pub fn resolve_path(&self, config: &Config) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| config.database.path_for(self.kind).to_path_buf())
    }

    /// Manager with this selection applied
    pub fn open(&self, config: Config) -> crate::Result<DatabaseManager> {
        let path = self.resolve_path(&config);
        let mut manager = DatabaseManager::new(config, Box::new(LocalFilesystem::new()));
        manager.set_database(self.kind, path)?;
        Ok(manager)
    }
}

/// Explicit file, then the default location, then built-in defaults
pub fn resolve_config(explicit: Option<&Path>) -> crate::Result<Config> {
    if let Some(path) = explicit {
        debug!("Loading configuration from {}", path.display());
        return load_config(path);
    }

    let default_path = paths::default_config_path();
    if default_path.exists() {
        debug!("Loading configuration from {}", default_path.display());
        load_config(&default_path)
    } else {
        Ok(Config::default())
    }
}
