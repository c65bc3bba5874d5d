//! Error types for annodb

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for reference database operations
#[derive(Error, Debug)]
pub enum RefDbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to download {url}")]
    DownloadFailed { url: String },

    #[error("Failed to decompress {}", path.display())]
    DecompressFailed { path: PathBuf },

    #[error("Source file missing: {}", path.display())]
    SourceFileMissing { path: PathBuf },

    #[error("Malformed row in {file} at line {line}: {reason}")]
    ParseMalformedRow {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("Cyclic lineage detected at taxon {tax_id}")]
    CyclicLineage { tax_id: String },

    #[error("Taxon {tax_id} references unknown parent {parent_id}")]
    DanglingParent { tax_id: String, parent_id: String },

    #[error("A database is already open")]
    BackendAlreadyOpen,

    #[error("No database is open")]
    BackendNotOpen,

    #[error("Unable to create database at {}: {reason}", path.display())]
    BackendCreateFailed { path: PathBuf, reason: String },

    #[error("Unable to open database at {}: {reason}", path.display())]
    BackendOpenFailed { path: PathBuf, reason: String },

    #[error("Unable to create table {table}: {reason}")]
    TableCreateFailed { table: String, reason: String },

    #[error("Unable to insert entry {key}: {reason}")]
    InsertFailed { key: String, reason: String },

    #[error("Database has already been generated")]
    DuplicateGeneration,

    #[error("Output already exists: {}", path.display())]
    OutputAlreadyExists { path: PathBuf },

    #[error("No database selected")]
    NoDatabaseSelected,

    #[error("Serialization error: {0}")]
    SerializeFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializeFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Result type alias for reference database operations
pub type Result<T> = std::result::Result<T, RefDbError>;

impl RefDbError {
    pub(crate) fn malformed(file: &str, line: usize, reason: impl Into<String>) -> Self {
        RefDbError::ParseMalformedRow {
            file: file.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

impl From<rusqlite::Error> for RefDbError {
    fn from(err: rusqlite::Error) -> Self {
        RefDbError::QueryFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let err = RefDbError::DownloadFailed {
            url: "https://example.org/taxdump.tar.gz".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Failed to download https://example.org/taxdump.tar.gz"
        );

        let err = RefDbError::malformed("names.dmp", 12, "expected 3 fields, found 1");
        assert_eq!(
            format!("{}", err),
            "Malformed row in names.dmp at line 12: expected 3 fields, found 1"
        );

        let err = RefDbError::OutputAlreadyExists {
            path: PathBuf::from("/tmp/annodb.db"),
        };
        assert_eq!(format!("{}", err), "Output already exists: /tmp/annodb.db");

        let err = RefDbError::CyclicLineage {
            tax_id: "42".to_string(),
        };
        assert_eq!(format!("{}", err), "Cyclic lineage detected at taxon 42");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: RefDbError = io_err.into();

        match err {
            RefDbError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_sqlite_error_becomes_query_failure() {
        let err: RefDbError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RefDbError::QueryFailed(_)));
    }
}
