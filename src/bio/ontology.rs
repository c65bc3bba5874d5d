/// Gene Ontology termdb table parsing
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::core::config::OntologyConfig;
use crate::core::types::GoEntry;
use crate::{RefDbError, Result};

fn split_row(line: &str) -> Vec<&str> {
    line.trim_end_matches(&['\r', '\n'][..])
        .split('\t')
        .map(|field| field.trim_matches(' '))
        .collect()
}

/// Longest recorded distance from a category root, keyed by numeric term id
#[derive(Debug, Default)]
pub struct DistanceMap {
    levels: HashMap<String, u32>,
}

impl DistanceMap {
    /// Keep the larger of the existing and new distance
    pub fn record(&mut self, term_id: &str, distance: Option<u32>) {
        let Some(distance) = distance else {
            return;
        };
        self.levels
            .entry(term_id.to_string())
            .and_modify(|level| *level = (*level).max(distance))
            .or_insert(distance);
    }

    pub fn get(&self, term_id: &str) -> Option<u32> {
        self.levels.get(term_id).copied()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Numeric ids of the rows whose accession is one of `accessions`
pub fn resolve_roots<R: BufRead>(reader: R, accessions: &[String]) -> Result<HashSet<String>> {
    let mut roots = HashSet::new();
    let mut found = HashSet::new();

    for line in reader.lines() {
        let line = line?;
        let fields = split_row(&line);
        if fields.len() < 4 {
            continue;
        }
        if accessions.iter().any(|acc| acc == fields[3]) {
            roots.insert(fields[0].to_string());
            found.insert(fields[3].to_string());
        }
    }

    for accession in accessions {
        if !found.contains(accession) {
            warn!("GO category root {} not present in term table", accession);
        }
    }

    Ok(roots)
}

/// Fold graph_path rows descending from a root into `distances`
pub fn load_distances<R: BufRead>(
    reader: R,
    source: &str,
    roots: &HashSet<String>,
    distances: &mut DistanceMap,
) -> Result<usize> {
    let mut edges = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_row(&line);
        if fields.len() < 5 {
            return Err(RefDbError::malformed(
                source,
                line_num + 1,
                format!("expected at least 5 fields, found {}", fields.len()),
            ));
        }

        let (ancestor, descendant, distance) = (fields[1], fields[2], fields[4]);
        if !roots.contains(ancestor) {
            continue;
        }

        let distance = if distance.is_empty() {
            None
        } else {
            Some(distance.parse::<u32>().map_err(|_| {
                RefDbError::malformed(
                    source,
                    line_num + 1,
                    format!("distance '{}' is not a number", distance),
                )
            })?)
        };

        distances.record(descendant, distance);
        edges += 1;
    }

    Ok(edges)
}

/// Stream term rows into `sink`, attaching levels from `distances`
pub fn load_terms<R, F>(
    reader: R,
    source: &str,
    distances: &DistanceMap,
    mut sink: F,
) -> Result<usize>
where
    R: BufRead,
    F: FnMut(GoEntry) -> Result<()>,
{
    let mut emitted = 0;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_row(&line);
        if fields.len() < 4 {
            return Err(RefDbError::malformed(
                source,
                line_num + 1,
                format!("expected at least 4 fields, found {}", fields.len()),
            ));
        }

        sink(GoEntry {
            go_id: fields[3].to_string(),
            term: fields[1].to_string(),
            category: fields[2].to_string(),
            level: distances.get(fields[0]),
        })?;
        emitted += 1;
    }

    Ok(emitted)
}

/// Builds GO entries from the extracted termdb tables
pub struct OntologyBuilder {
    root_accessions: Vec<String>,
}

impl OntologyBuilder {
    pub fn new(config: &OntologyConfig) -> Self {
        Self {
            root_accessions: config.root_accessions.clone(),
        }
    }

    pub fn build<F>(&self, term_path: &Path, graph_path: &Path, sink: F) -> Result<usize>
    where
        F: FnMut(GoEntry) -> Result<()>,
    {
        let roots = resolve_roots(open_table(term_path)?, &self.root_accessions)?;
        debug!("Resolved {} GO category roots", roots.len());

        let mut distances = DistanceMap::default();
        let edges = load_distances(
            open_table(graph_path)?,
            &table_name(graph_path),
            &roots,
            &mut distances,
        )?;
        info!(
            "Read {} root edges covering {} GO terms",
            edges,
            distances.len()
        );

        let emitted = load_terms(open_table(term_path)?, &table_name(term_path), &distances, sink)?;
        info!("Gene Ontology complete: {} entries", emitted);
        Ok(emitted)
    }
}

fn open_table(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(RefDbError::SourceFileMissing {
            path: path.to_path_buf(),
        });
    }
    Ok(BufReader::new(File::open(path)?))
}

fn table_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
