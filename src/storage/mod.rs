pub mod serialized;
pub mod sqlite;
pub mod traits;

pub use serialized::SerializedStore;
pub use sqlite::SqliteStore;
pub use traits::ReferenceStore;

use crate::core::config::DatabaseConfig;
use crate::core::types::DatabaseKind;

/// Construct an unopened backend for `kind`
pub fn store_for(kind: DatabaseKind, config: &DatabaseConfig) -> Box<dyn ReferenceStore> {
    match kind {
        DatabaseKind::Sql => Box::new(SqliteStore::new()),
        DatabaseKind::Serialized => Box::new(SerializedStore::new(config.serialization_format)),
    }
}
