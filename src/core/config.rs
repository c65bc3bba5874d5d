//! Configuration types for annodb

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::paths;
use crate::core::types::{DatabaseKind, SerializationFormat};
use crate::RefDbError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    #[serde(default)]
    pub ontology: OntologyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Scratch directory, wiped after every generate/download
    #[serde(default = "paths::temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "paths::default_sql_path")]
    pub sql_path: PathBuf,
    #[serde(default = "paths::default_serialized_path")]
    pub serialized_path: PathBuf,
    #[serde(default)]
    pub serialization_format: SerializationFormat,
    /// Keep whatever was persisted when a later build stage fails
    #[serde(default)]
    pub keep_partial_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_taxonomy_url")]
    pub taxonomy_url: String,
    #[serde(default = "default_gene_ontology_url")]
    pub gene_ontology_url: String,
    /// Gzip-compressed pre-built serialized database
    #[serde(default)]
    pub serialized_url: Option<String>,
    /// Gzip-compressed pre-built SQL database
    #[serde(default)]
    pub sql_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default = "default_taxonomy_archive")]
    pub archive_name: String,
    #[serde(default = "default_names_file")]
    pub names_file: String,
    #[serde(default = "default_nodes_file")]
    pub nodes_file: String,
    #[serde(default = "default_max_lineage_depth")]
    pub max_lineage_depth: usize,
    #[serde(default = "default_progress_interval")]
    pub progress_interval_percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OntologyConfig {
    #[serde(default = "default_ontology_archive")]
    pub archive_name: String,
    /// Directory the archive unpacks into
    #[serde(default = "default_ontology_dir")]
    pub archive_dir: String,
    #[serde(default = "default_term_file")]
    pub term_file: String,
    #[serde(default = "default_graph_file")]
    pub graph_file: String,
    /// Accessions of the biological process, cellular component and molecular function roots
    #[serde(default = "default_root_accessions")]
    pub root_accessions: Vec<String>,
}

// Default value functions
fn default_taxonomy_url() -> String {
    "https://ftp.ncbi.nlm.nih.gov/pub/taxonomy/taxdump.tar.gz".to_string()
}
fn default_gene_ontology_url() -> String {
    "http://archive.geneontology.org/latest-termdb/go_daily-termdb-tables.tar.gz".to_string()
}
fn default_taxonomy_archive() -> String { "taxdump.tar.gz".to_string() }
fn default_names_file() -> String { "names.dmp".to_string() }
fn default_nodes_file() -> String { "nodes.dmp".to_string() }
fn default_max_lineage_depth() -> usize { 1000 }
fn default_progress_interval() -> u8 { 10 }
fn default_ontology_archive() -> String { "go_daily-termdb-tables.tar.gz".to_string() }
fn default_ontology_dir() -> String { "go_daily-termdb-tables".to_string() }
fn default_term_file() -> String { "term.txt".to_string() }
fn default_graph_file() -> String { "graph_path.txt".to_string() }
fn default_root_accessions() -> Vec<String> {
    vec![
        "GO:0008150".to_string(),
        "GO:0005575".to_string(),
        "GO:0003674".to_string(),
    ]
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            temp_dir: paths::temp_dir(),
            sql_path: paths::default_sql_path(),
            serialized_path: paths::default_serialized_path(),
            serialization_format: SerializationFormat::default(),
            keep_partial_on_failure: false,
        }
    }
}

impl DatabaseConfig {
    /// Configured artifact path for `kind`
    pub fn path_for(&self, kind: DatabaseKind) -> &Path {
        match kind {
            DatabaseKind::Sql => &self.sql_path,
            DatabaseKind::Serialized => &self.serialized_path,
        }
    }
}

impl SourceConfig {
    /// URL of the gzip-compressed pre-built artifact for `kind`, if any
    pub fn prebuilt_url(&self, kind: DatabaseKind) -> Option<&str> {
        match kind {
            DatabaseKind::Sql => self.sql_url.as_deref(),
            DatabaseKind::Serialized => self.serialized_url.as_deref(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            taxonomy_url: default_taxonomy_url(),
            gene_ontology_url: default_gene_ontology_url(),
            serialized_url: None,
            sql_url: None,
        }
    }
}

impl Default for TaxonomyConfig {
    fn default() -> Self {
        Self {
            archive_name: default_taxonomy_archive(),
            names_file: default_names_file(),
            nodes_file: default_nodes_file(),
            max_lineage_depth: default_max_lineage_depth(),
            progress_interval_percent: default_progress_interval(),
        }
    }
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            archive_name: default_ontology_archive(),
            archive_dir: default_ontology_dir(),
            term_file: default_term_file(),
            graph_file: default_graph_file(),
            root_accessions: default_root_accessions(),
        }
    }
}

impl Config {
    /// Configuration rooted at `home`, used when the default home is not wanted
    pub fn with_home<P: AsRef<Path>>(home: P) -> Self {
        let home = home.as_ref();
        let mut config = Self::default();
        config.database.temp_dir = home.join("tmp");
        config.database.sql_path = home.join("databases").join("annodb_database.db");
        config.database.serialized_path = home.join("databases").join("annodb_database.bin");
        config
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, RefDbError> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| RefDbError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), RefDbError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| RefDbError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
