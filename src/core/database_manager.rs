/// Facade over the reference database build pipeline and lookups
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::bio::{OntologyBuilder, TaxonomyBuilder};
use crate::core::config::Config;
use crate::core::types::{DatabaseKind, GoEntry, TaxEntry};
use crate::storage::{self, ReferenceStore};
use crate::utils::filesystem::{ArchiveKind, Filesystem};
use crate::{RefDbError, Result};

/// Lifecycle of the selected backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    /// No backend selected
    Unset,
    /// Backend selected, artifact not yet built
    Ready,
    /// Artifact built or opened, lookups available
    Populated,
}

pub struct DatabaseManager {
    config: Config,
    filesystem: Box<dyn Filesystem>,
    store: Option<Box<dyn ReferenceStore>>,
    path: Option<PathBuf>,
    state: DatabaseState,
}

impl DatabaseManager {
    pub fn new(config: Config, filesystem: Box<dyn Filesystem>) -> Self {
        Self {
            config,
            filesystem,
            store: None,
            path: None,
            state: DatabaseState::Unset,
        }
    }

    pub fn state(&self) -> DatabaseState {
        self.state
    }

    pub fn is_populated(&self) -> bool {
        self.state == DatabaseState::Populated
    }

    pub fn kind(&self) -> Option<DatabaseKind> {
        self.store.as_ref().map(|store| store.kind())
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Select the backend kind and artifact path
    ///
    /// An existing artifact is opened for lookups; otherwise the manager waits
    /// for [`generate_database`](Self::generate_database) or
    /// [`download_database`](Self::download_database).
    pub fn set_database<P: Into<PathBuf>>(&mut self, kind: DatabaseKind, path: P) -> Result<()> {
        let store = storage::store_for(kind, &self.config.database);
        self.select_backend(store, path.into())
    }

    fn select_backend(&mut self, mut store: Box<dyn ReferenceStore>, path: PathBuf) -> Result<()> {
        if self.state != DatabaseState::Unset {
            return Err(RefDbError::BackendAlreadyOpen);
        }

        let state = if self.filesystem.file_exists(&path) {
            store.open(&path)?;
            info!("Opened {} database at {}", store.kind(), path.display());
            DatabaseState::Populated
        } else {
            debug!("No {} database at {}, awaiting build", store.kind(), path.display());
            DatabaseState::Ready
        };

        self.store = Some(store);
        self.path = Some(path);
        self.state = state;
        Ok(())
    }

    fn take_selected(&mut self) -> Result<(Box<dyn ReferenceStore>, PathBuf)> {
        match self.state {
            DatabaseState::Unset => return Err(RefDbError::NoDatabaseSelected),
            DatabaseState::Populated => return Err(RefDbError::DuplicateGeneration),
            DatabaseState::Ready => {}
        }
        let (Some(store), Some(path)) = (self.store.take(), self.path.clone()) else {
            return Err(RefDbError::NoDatabaseSelected);
        };
        if self.filesystem.file_exists(&path) {
            self.store = Some(store);
            return Err(RefDbError::OutputAlreadyExists { path });
        }
        Ok((store, path))
    }

    /// Build the artifact from the NCBI taxonomy and Gene Ontology sources
    pub fn generate_database(&mut self) -> Result<()> {
        let (mut store, path) = self.take_selected()?;
        info!("Generating {} database at {}", store.kind(), path.display());

        let result = store
            .create(&path)
            .and_then(|()| self.build_into(store.as_mut()));
        self.reset_temp_dir();

        match &result {
            Ok(()) => {
                self.state = DatabaseState::Populated;
                info!("Database generated at {}", path.display());
            }
            Err(e) => {
                warn!("Database generation failed: {}", e);
                self.discard_partial(store.as_mut(), &path);
            }
        }
        self.store = Some(store);
        result
    }

    fn build_into(&self, store: &mut dyn ReferenceStore) -> Result<()> {
        self.build_taxonomy(store)?;
        self.build_gene_ontology(store)?;
        store.commit()
    }

    fn build_taxonomy(&self, store: &mut dyn ReferenceStore) -> Result<()> {
        let temp = &self.config.database.temp_dir;
        let taxonomy = &self.config.taxonomy;
        let archive = temp.join(&taxonomy.archive_name);

        info!("Downloading NCBI taxonomy");
        self.fetch_archive(&self.config.sources.taxonomy_url, &archive, temp)?;

        let names = temp.join(&taxonomy.names_file);
        let nodes = temp.join(&taxonomy.nodes_file);
        self.require_file(&names)?;
        self.require_file(&nodes)?;

        TaxonomyBuilder::new(taxonomy).build(&names, &nodes, |entry| store.put_tax(&entry))?;
        self.filesystem.delete_file(&archive);
        Ok(())
    }

    fn build_gene_ontology(&self, store: &mut dyn ReferenceStore) -> Result<()> {
        let temp = &self.config.database.temp_dir;
        let ontology = &self.config.ontology;
        let archive = temp.join(&ontology.archive_name);

        info!("Downloading Gene Ontology term database");
        self.fetch_archive(&self.config.sources.gene_ontology_url, &archive, temp)?;

        let tables = temp.join(&ontology.archive_dir);
        let term = tables.join(&ontology.term_file);
        let graph = tables.join(&ontology.graph_file);
        self.require_file(&term)?;
        self.require_file(&graph)?;

        OntologyBuilder::new(ontology).build(&term, &graph, |entry| store.put_go(&entry))?;
        self.filesystem.delete_file(&archive);
        Ok(())
    }

    fn fetch_archive(&self, url: &str, archive: &Path, dest: &Path) -> Result<()> {
        self.filesystem.create_dir(dest);
        if !self.filesystem.download(url, archive) {
            return Err(RefDbError::DownloadFailed {
                url: url.to_string(),
            });
        }
        if !self.filesystem.decompress(archive, dest, ArchiveKind::TarGz) {
            return Err(RefDbError::DecompressFailed {
                path: archive.to_path_buf(),
            });
        }
        Ok(())
    }

    fn require_file(&self, path: &Path) -> Result<()> {
        if self.filesystem.file_exists(path) {
            Ok(())
        } else {
            Err(RefDbError::SourceFileMissing {
                path: path.to_path_buf(),
            })
        }
    }

    fn discard_partial(&self, store: &mut dyn ReferenceStore, path: &Path) {
        if self.config.database.keep_partial_on_failure && store.is_open() {
            match store.commit() {
                Ok(()) => info!("Kept partial database at {}", path.display()),
                Err(e) => warn!("Unable to commit partial database: {}", e),
            }
            store.close();
        } else {
            store.close();
            self.filesystem.delete_file(path);
        }
    }

    fn reset_temp_dir(&self) {
        let temp = &self.config.database.temp_dir;
        self.filesystem.delete_dir(temp);
        self.filesystem.create_dir(temp);
    }

    /// Fetch a gzip-compressed pre-built artifact of the selected kind
    pub fn download_database(&mut self) -> Result<()> {
        let (mut store, path) = self.take_selected()?;

        let result = self.fetch_prebuilt(store.as_mut(), &path);
        self.reset_temp_dir();

        match &result {
            Ok(()) => {
                self.state = DatabaseState::Populated;
                info!("Downloaded {} database to {}", store.kind(), path.display());
            }
            Err(e) => {
                warn!("Database download failed: {}", e);
                store.close();
                self.filesystem.delete_file(&path);
            }
        }
        self.store = Some(store);
        result
    }

    fn fetch_prebuilt(&self, store: &mut dyn ReferenceStore, path: &Path) -> Result<()> {
        let kind = store.kind();
        let url = self.config.sources.prebuilt_url(kind).ok_or_else(|| {
            RefDbError::Config(format!("No download URL configured for {} database", kind))
        })?;

        let temp = &self.config.database.temp_dir;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("annodb_database.{}", kind));
        let archive = temp.join(format!("{}.gz", file_name));

        self.filesystem.create_dir(temp);
        if !self.filesystem.download(url, &archive) {
            return Err(RefDbError::DownloadFailed {
                url: url.to_string(),
            });
        }
        if let Some(parent) = path.parent() {
            self.filesystem.create_dir(parent);
        }
        if !self.filesystem.decompress(&archive, path, ArchiveKind::Gz) {
            return Err(RefDbError::DecompressFailed { path: archive });
        }

        store.open(path)
    }

    /// Look up a species, dropping trailing words until a name matches
    pub fn get_tax_entry(&self, species: &str) -> Option<TaxEntry> {
        let store = self.populated_store()?;
        let mut query = species.trim().to_lowercase();

        while !query.is_empty() {
            match store.get_tax(&query) {
                Ok(Some(entry)) => return Some(entry),
                Ok(None) => {}
                Err(e) => {
                    warn!("Taxonomy lookup for '{}' failed: {}", query, e);
                    return None;
                }
            }

            let Some(pos) = query.rfind(' ') else {
                break;
            };
            query.truncate(pos);
            query.truncate(query.trim_end().len());
        }
        None
    }

    pub fn get_go_entry(&self, go_id: &str) -> Option<GoEntry> {
        if go_id.is_empty() {
            return None;
        }
        let store = self.populated_store()?;
        match store.get_go(go_id) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Gene Ontology lookup for '{}' failed: {}", go_id, e);
                None
            }
        }
    }

    fn populated_store(&self) -> Option<&dyn ReferenceStore> {
        if self.state != DatabaseState::Populated {
            return None;
        }
        self.store.as_deref()
    }

    /// Number of (taxonomy, gene ontology) records in the open artifact
    pub fn counts(&self) -> Result<(usize, usize)> {
        match (self.state, self.store.as_deref()) {
            (DatabaseState::Unset, _) | (_, None) => Err(RefDbError::NoDatabaseSelected),
            (DatabaseState::Ready, _) => Err(RefDbError::BackendNotOpen),
            (DatabaseState::Populated, Some(store)) => store.counts(),
        }
    }

    /// Release the backend and return to the unset state
    pub fn close(&mut self) {
        if let Some(mut store) = self.store.take() {
            store.close();
        }
        self.path = None;
        self.state = DatabaseState::Unset;
    }
}

impl Drop for DatabaseManager {
    fn drop(&mut self) {
        self.close();
    }
}
