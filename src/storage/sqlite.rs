/// SQLite backend for the reference database
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::core::types::{DatabaseKind, GoEntry, TaxEntry};
use crate::storage::traits::ReferenceStore;
use crate::{RefDbError, Result};

pub const TAXONOMY_TABLE: &str = "ncbi_tax";
pub const GENE_ONTOLOGY_TABLE: &str = "go_term";

const CREATE_TAXONOMY: &str = "CREATE TABLE ncbi_tax (
    id INTEGER PRIMARY KEY NOT NULL,
    tax_id TEXT NOT NULL,
    lineage TEXT NOT NULL,
    tax_name TEXT NOT NULL
)";

const CREATE_GENE_ONTOLOGY: &str = "CREATE TABLE go_term (
    id INTEGER PRIMARY KEY NOT NULL,
    go_id TEXT NOT NULL,
    term TEXT NOT NULL,
    category TEXT NOT NULL,
    level INTEGER
)";

const CREATE_INDEXES: &str = "
CREATE INDEX IF NOT EXISTS idx_ncbi_tax_tax_name ON ncbi_tax(tax_name);
CREATE INDEX IF NOT EXISTS idx_go_term_go_id ON go_term(go_id);
";

/// Artifacts written elsewhere store `level` as TEXT with `''` for no distance
fn level_from(value: ValueRef<'_>) -> Option<u32> {
    match value {
        ValueRef::Integer(level) => u32::try_from(level).ok(),
        ValueRef::Text(text) => std::str::from_utf8(text).ok()?.trim().parse().ok(),
        _ => None,
    }
}

pub struct SqliteStore {
    conn: Option<Connection>,
    go_cache: RefCell<HashMap<String, Option<GoEntry>>>,
}

impl Default for SqliteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SqliteStore {
    pub fn new() -> Self {
        Self {
            conn: None,
            go_cache: RefCell::new(HashMap::new()),
        }
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(RefDbError::BackendNotOpen)
    }

    fn create_table(conn: &Connection, table: &str, ddl: &str) -> Result<()> {
        debug!("Creating SQL table {}", table);
        conn.execute(ddl, [])
            .map_err(|e| RefDbError::TableCreateFailed {
                table: table.to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    fn has_table(conn: &Connection, table: &str) -> Result<bool> {
        let found: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![table],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(count as usize)
    }
}

impl ReferenceStore for SqliteStore {
    fn kind(&self) -> DatabaseKind {
        DatabaseKind::Sql
    }

    fn create(&mut self, path: &Path) -> Result<()> {
        if self.conn.is_some() {
            return Err(RefDbError::BackendAlreadyOpen);
        }
        if path.exists() {
            return Err(RefDbError::OutputAlreadyExists {
                path: path.to_path_buf(),
            });
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| RefDbError::BackendCreateFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // Rebuildable artifact, trade durability for insert speed
        conn.pragma_update(None, "synchronous", "OFF")?;
        conn.pragma_update_and_check(None, "journal_mode", "OFF", |row| row.get::<_, String>(0))?;

        Self::create_table(&conn, TAXONOMY_TABLE, CREATE_TAXONOMY)?;
        Self::create_table(&conn, GENE_ONTOLOGY_TABLE, CREATE_GENE_ONTOLOGY)?;

        info!("Created SQL database at {}", path.display());
        self.conn = Some(conn);
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        if self.conn.is_some() {
            return Err(RefDbError::BackendAlreadyOpen);
        }
        if !path.exists() {
            return Err(RefDbError::SourceFileMissing {
                path: path.to_path_buf(),
            });
        }

        let open_failed = |reason: String| RefDbError::BackendOpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| open_failed(e.to_string()))?;

        for table in [TAXONOMY_TABLE, GENE_ONTOLOGY_TABLE] {
            let present = Self::has_table(&conn, table).map_err(|e| open_failed(e.to_string()))?;
            if !present {
                return Err(open_failed(format!("missing table {}", table)));
            }
        }

        debug!("Opened SQL database at {}", path.display());
        self.conn = Some(conn);
        Ok(())
    }

    fn put_tax(&mut self, entry: &TaxEntry) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO ncbi_tax (tax_id, lineage, tax_name) VALUES (?1, ?2, ?3)",
            params![entry.tax_id, entry.lineage, entry.tax_name],
        )
        .map_err(|e| RefDbError::InsertFailed {
            key: entry.tax_name.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn put_go(&mut self, entry: &GoEntry) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO go_term (go_id, term, category, level) VALUES (?1, ?2, ?3, ?4)",
            params![entry.go_id, entry.term, entry.category, entry.level],
        )
        .map_err(|e| RefDbError::InsertFailed {
            key: entry.go_id.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    fn get_tax(&self, name: &str) -> Result<Option<TaxEntry>> {
        let conn = self.conn()?;
        let entry = conn
            .query_row(
                "SELECT tax_id, lineage, tax_name FROM ncbi_tax WHERE tax_name = ?1 LIMIT 1",
                params![name],
                |row| {
                    Ok(TaxEntry {
                        tax_id: row.get(0)?,
                        lineage: row.get(1)?,
                        tax_name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    fn get_go(&self, go_id: &str) -> Result<Option<GoEntry>> {
        if let Some(cached) = self.go_cache.borrow().get(go_id) {
            return Ok(cached.clone());
        }

        let conn = self.conn()?;
        let entry = conn
            .query_row(
                "SELECT go_id, term, category, level FROM go_term WHERE go_id = ?1 LIMIT 1",
                params![go_id],
                |row| {
                    Ok(GoEntry {
                        go_id: row.get(0)?,
                        term: row.get(1)?,
                        category: row.get(2)?,
                        level: level_from(row.get_ref(3)?),
                    })
                },
            )
            .optional()?;

        self.go_cache
            .borrow_mut()
            .insert(go_id.to_string(), entry.clone());
        Ok(entry)
    }

    fn commit(&mut self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(CREATE_INDEXES)?;
        debug!("Created lookup indexes");
        Ok(())
    }

    fn counts(&self) -> Result<(usize, usize)> {
        let conn = self.conn()?;
        Ok((
            Self::count_rows(conn, TAXONOMY_TABLE)?,
            Self::count_rows(conn, GENE_ONTOLOGY_TABLE)?,
        ))
    }

    fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!("Error closing SQL database: {}", e);
            }
        }
        self.go_cache.borrow_mut().clear();
    }

    fn is_open(&self) -> bool {
        self.conn.is_some()
    }
}
