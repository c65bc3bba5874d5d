use clap::Args;
use std::path::PathBuf;

use crate::cli::output::*;
use crate::core::config::save_config;
use crate::core::paths;
use crate::Config;

#[derive(Args)]
pub struct ConfigArgs {
    /// Destination file (defaults to $ANNODB_HOME/config.toml)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: ConfigArgs, config: Config) -> anyhow::Result<()> {
    let path = args.output.unwrap_or_else(paths::default_config_path);
    if path.exists() && !args.force {
        anyhow::bail!("{} already exists, pass --force to overwrite", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    save_config(&path, &config)?;
    success(&format!("Configuration written to {}", path.display()));
    Ok(())
}
