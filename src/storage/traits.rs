/// Storage trait for reference database backends
///
/// A backend is written once by a build pipeline (`create`, `put_*`,
/// `commit`) and then read by exact key (`open`, `get_*`).
use std::path::Path;

use crate::core::types::{DatabaseKind, GoEntry, TaxEntry};
use crate::Result;

#[cfg_attr(test, mockall::automock)]
pub trait ReferenceStore {
    /// Backend kind this store persists as
    fn kind(&self) -> DatabaseKind;

    /// Start a new artifact at `path`; the path must not exist
    fn create(&mut self, path: &Path) -> Result<()>;

    /// Open an existing artifact for lookups
    fn open(&mut self, path: &Path) -> Result<()>;

    fn put_tax(&mut self, entry: &TaxEntry) -> Result<()>;

    fn put_go(&mut self, entry: &GoEntry) -> Result<()>;

    /// Exact lookup by lower-cased taxon name
    fn get_tax(&self, name: &str) -> Result<Option<TaxEntry>>;

    /// Exact lookup by GO accession
    fn get_go(&self, go_id: &str) -> Result<Option<GoEntry>>;

    /// Finish a build so the artifact can be reopened
    fn commit(&mut self) -> Result<()>;

    /// Number of (taxonomy, gene ontology) records held
    fn counts(&self) -> Result<(usize, usize)>;

    /// Release the handle; calling on a closed store is a no-op
    fn close(&mut self);

    fn is_open(&self) -> bool;
}
