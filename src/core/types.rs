use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Taxonomic lineage record, one per (taxon, alias) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxEntry {
    pub tax_id: String,
    /// Semicolon-joined ancestor names, lower-cased, ending in "root"
    pub lineage: String,
    /// Lower-cased alias this record is keyed by
    pub tax_name: String,
}

/// Gene Ontology term record
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GoEntry {
    pub go_id: String,
    pub term: String,
    pub category: String,
    /// Longest recorded distance from the category root
    pub level: Option<u32>,
}

/// Physical storage backend for the reference database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Sql,
    Serialized,
}

impl DatabaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Serialized => "serialized",
        }
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DatabaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sql" | "sqlite" => Ok(Self::Sql),
            "serialized" | "serial" | "bin" => Ok(Self::Serialized),
            _ => Err(format!("Unknown database type: {}", s)),
        }
    }
}

/// Encoding of a serialized database artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// JSON, human readable
    Text,
    /// bincode, compact
    #[default]
    Binary,
}

impl FromStr for SerializationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "json" => Ok(Self::Text),
            "binary" | "bin" => Ok(Self::Binary),
            _ => Err(format!("Unknown serialization format: {}", s)),
        }
    }
}
