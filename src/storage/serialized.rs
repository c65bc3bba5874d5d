/// In-memory backend persisted as a single JSON or bincode blob
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::types::{DatabaseKind, GoEntry, SerializationFormat, TaxEntry};
use crate::storage::traits::ReferenceStore;
use crate::{RefDbError, Result};

/// Header of binary artifacts
pub const REFERENCE_ARCHIVE_MAGIC: &[u8] = b"RKB\x01";
pub const ARCHIVE_FORMAT_VERSION: u32 = 1;

/// On-disk layout of a serialized database
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ReferenceArchive {
    pub format_version: u32,
    /// Keyed by lower-cased taxon name
    pub taxonomy: BTreeMap<String, TaxEntry>,
    /// Keyed by GO accession
    pub gene_ontology: BTreeMap<String, GoEntry>,
}

impl ReferenceArchive {
    pub fn write_to_file(&self, path: &Path, format: SerializationFormat) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        match format {
            SerializationFormat::Text => serde_json::to_writer(&mut writer, self)
                .map_err(|e| RefDbError::SerializeFailed(e.to_string()))?,
            SerializationFormat::Binary => {
                writer.write_all(REFERENCE_ARCHIVE_MAGIC)?;
                bincode::serialize_into(&mut writer, self)
                    .map_err(|e| RefDbError::SerializeFailed(e.to_string()))?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    pub fn read_from_file(path: &Path, format: SerializationFormat) -> Result<Self> {
        let content = fs::read(path)?;
        let archive: Self = match format {
            SerializationFormat::Text => serde_json::from_slice(&content)
                .map_err(|e| RefDbError::DeserializeFailed(e.to_string()))?,
            SerializationFormat::Binary => {
                let Some(body) = content.strip_prefix(REFERENCE_ARCHIVE_MAGIC) else {
                    return Err(RefDbError::DeserializeFailed(
                        "missing binary archive header".to_string(),
                    ));
                };
                bincode::deserialize(body)
                    .map_err(|e| RefDbError::DeserializeFailed(e.to_string()))?
            }
        };

        if archive.format_version != ARCHIVE_FORMAT_VERSION {
            return Err(RefDbError::DeserializeFailed(format!(
                "unsupported archive version {}",
                archive.format_version
            )));
        }
        Ok(archive)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Closed,
    Building(PathBuf),
    Reading(PathBuf),
}

pub struct SerializedStore {
    format: SerializationFormat,
    mode: Mode,
    archive: ReferenceArchive,
}

impl SerializedStore {
    pub fn new(format: SerializationFormat) -> Self {
        Self {
            format,
            mode: Mode::Closed,
            archive: ReferenceArchive::default(),
        }
    }

    fn archive(&self) -> Result<&ReferenceArchive> {
        match self.mode {
            Mode::Closed => Err(RefDbError::BackendNotOpen),
            _ => Ok(&self.archive),
        }
    }

    fn archive_mut(&mut self) -> Result<&mut ReferenceArchive> {
        match self.mode {
            Mode::Closed => Err(RefDbError::BackendNotOpen),
            _ => Ok(&mut self.archive),
        }
    }
}

impl ReferenceStore for SerializedStore {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Serialized
    }

    fn create(&mut self, path: &Path) -> Result<()> {
        if self.mode != Mode::Closed {
            return Err(RefDbError::BackendAlreadyOpen);
        }
        if path.exists() {
            return Err(RefDbError::OutputAlreadyExists {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| RefDbError::BackendCreateFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        self.archive = ReferenceArchive {
            format_version: ARCHIVE_FORMAT_VERSION,
            ..Default::default()
        };
        self.mode = Mode::Building(path.to_path_buf());
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        if self.mode != Mode::Closed {
            return Err(RefDbError::BackendAlreadyOpen);
        }
        if !path.exists() {
            return Err(RefDbError::SourceFileMissing {
                path: path.to_path_buf(),
            });
        }

        debug!("Loading serialized database from {}", path.display());
        self.archive = ReferenceArchive::read_from_file(path, self.format)?;
        self.mode = Mode::Reading(path.to_path_buf());
        Ok(())
    }

    fn put_tax(&mut self, entry: &TaxEntry) -> Result<()> {
        self.archive_mut()?
            .taxonomy
            .insert(entry.tax_name.clone(), entry.clone());
        Ok(())
    }

    fn put_go(&mut self, entry: &GoEntry) -> Result<()> {
        self.archive_mut()?
            .gene_ontology
            .insert(entry.go_id.clone(), entry.clone());
        Ok(())
    }

    fn get_tax(&self, name: &str) -> Result<Option<TaxEntry>> {
        Ok(self.archive()?.taxonomy.get(name).cloned())
    }

    fn get_go(&self, go_id: &str) -> Result<Option<GoEntry>> {
        Ok(self.archive()?.gene_ontology.get(go_id).cloned())
    }

    fn commit(&mut self) -> Result<()> {
        match &self.mode {
            Mode::Closed => Err(RefDbError::BackendNotOpen),
            Mode::Reading(_) => Ok(()),
            Mode::Building(path) => {
                self.archive.write_to_file(path, self.format)?;
                info!(
                    "Wrote serialized database with {} taxa and {} GO terms to {}",
                    self.archive.taxonomy.len(),
                    self.archive.gene_ontology.len(),
                    path.display()
                );
                Ok(())
            }
        }
    }

    fn counts(&self) -> Result<(usize, usize)> {
        let archive = self.archive()?;
        Ok((archive.taxonomy.len(), archive.gene_ontology.len()))
    }

    fn close(&mut self) {
        self.mode = Mode::Closed;
        self.archive = ReferenceArchive::default();
    }

    fn is_open(&self) -> bool {
        self.mode != Mode::Closed
    }
}
