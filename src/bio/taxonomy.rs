/// NCBI taxonomy dump parsing and lineage resolution
///
/// Nodes live in an arena indexed by position; the id -> index map replaces
/// pointer chasing and lets lineages be memoized per node.
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

use crate::core::config::TaxonomyConfig;
use crate::core::types::TaxEntry;
use crate::{RefDbError, Result};

/// Taxonomy id of the NCBI root node
pub const ROOT_TAX_ID: &str = "1";
/// Name class marking the canonical name of a taxon
pub const SCIENTIFIC_NAME: &str = "scientific name";
const ROOT_LINEAGE: &str = "root";

/// Build-time taxonomy node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyNode {
    pub id: String,
    pub parent_id: String,
    pub scientific_name: String,
    pub all_names: Vec<String>,
}

impl TaxonomyNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Root sentinel, or a node whose chain ends here
    pub fn is_root(&self) -> bool {
        self.id == ROOT_TAX_ID || self.id.is_empty() || self.parent_id.is_empty()
    }

    /// Name used for this node inside lineages
    pub fn lineage_name(&self) -> &str {
        if self.scientific_name.is_empty() {
            self.all_names.first().map(String::as_str).unwrap_or("")
        } else {
            &self.scientific_name
        }
    }
}

/// Split a dump row into trimmed fields
///
/// Accepts NCBI `.dmp` rows (`\t|\t` separated, `\t|` terminated) as well as
/// plain tab separated rows.
pub fn split_dump_row(line: &str) -> Vec<&str> {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    if line.contains("\t|") {
        line.trim_end_matches("\t|")
            .split("\t|\t")
            .map(str::trim)
            .collect()
    } else {
        line.split('\t').map(str::trim).collect()
    }
}

/// Arena of taxonomy nodes keyed by NCBI id
#[derive(Debug)]
pub struct TaxonomyGraph {
    nodes: Vec<TaxonomyNode>,
    index: HashMap<String, usize>,
    name_rows: usize,
    max_depth: usize,
}

impl TaxonomyGraph {
    pub fn new(max_depth: usize) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            name_rows: 0,
            max_depth,
        }
    }

    /// Load a names and a nodes dump from disk
    pub fn from_files(names_path: &Path, nodes_path: &Path, max_depth: usize) -> Result<Self> {
        let mut graph = Self::new(max_depth);

        debug!("Parsing NCBI names file at {}", names_path.display());
        graph.load_names(open_dump(names_path)?, &display_name(names_path))?;

        debug!("Parsing NCBI nodes file at {}", nodes_path.display());
        graph.load_nodes(open_dump(nodes_path)?, &display_name(nodes_path))?;

        Ok(graph)
    }

    /// Record every name row; returns the number of rows read
    pub fn load_names<R: BufRead>(&mut self, reader: R, source: &str) -> Result<usize> {
        let mut rows = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_dump_row(&line);
            if fields.len() < 3 {
                return Err(RefDbError::malformed(
                    source,
                    line_num + 1,
                    format!("expected at least 3 fields, found {}", fields.len()),
                ));
            }

            let (tax_id, name, name_class) = (fields[0], fields[1], fields[fields.len() - 1]);
            let idx = self.node_index(tax_id);
            let node = &mut self.nodes[idx];
            if name_class == SCIENTIFIC_NAME {
                node.scientific_name = name.to_string();
            }
            node.all_names.push(name.to_string());
            rows += 1;
        }

        self.name_rows += rows;
        Ok(rows)
    }

    /// Attach parent ids; rows for taxa without names are skipped
    pub fn load_nodes<R: BufRead>(&mut self, reader: R, source: &str) -> Result<usize> {
        let mut linked = 0;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_dump_row(&line);
            if fields.len() < 2 {
                return Err(RefDbError::malformed(
                    source,
                    line_num + 1,
                    format!("expected at least 2 fields, found {}", fields.len()),
                ));
            }

            if let Some(&idx) = self.index.get(fields[0]) {
                self.nodes[idx].parent_id = fields[1].to_string();
                linked += 1;
            }
        }

        Ok(linked)
    }

    fn node_index(&mut self, tax_id: &str) -> usize {
        if let Some(&idx) = self.index.get(tax_id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(TaxonomyNode::new(tax_id));
        self.index.insert(tax_id.to_string(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name_rows(&self) -> usize {
        self.name_rows
    }

    pub fn get(&self, tax_id: &str) -> Option<&TaxonomyNode> {
        self.index.get(tax_id).map(|&idx| &self.nodes[idx])
    }

    /// Lineage of a single taxon, `None` if the id is unknown
    pub fn lineage(&self, tax_id: &str) -> Result<Option<String>> {
        let Some(&idx) = self.index.get(tax_id) else {
            return Ok(None);
        };
        let mut resolver = LineageResolver::new(self);
        resolver.resolve(idx).map(Some)
    }

    /// Emit one entry per (taxon, alias) pair, in first-seen order
    pub fn for_each_entry<F>(&self, progress_interval: u8, mut sink: F) -> Result<usize>
    where
        F: FnMut(TaxEntry) -> Result<()>,
    {
        let mut resolver = LineageResolver::new(self);
        let mut progress = ProgressLog::new(self.name_rows, progress_interval);
        let mut emitted = 0;

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.all_names.is_empty() {
                continue;
            }
            let lineage = resolver.resolve(idx)?;

            for name in &node.all_names {
                sink(TaxEntry {
                    tax_id: node.id.clone(),
                    lineage: lineage.clone(),
                    tax_name: name.to_lowercase(),
                })?;
                emitted += 1;
            }
            progress.update(emitted);
        }

        Ok(emitted)
    }
}

/// Iterative lineage walk, memoizing only nodes that some other node descends from
struct LineageResolver<'a> {
    graph: &'a TaxonomyGraph,
    has_children: Vec<bool>,
    cache: Vec<Option<String>>,
}

impl<'a> LineageResolver<'a> {
    fn new(graph: &'a TaxonomyGraph) -> Self {
        let mut has_children = vec![false; graph.nodes.len()];
        for node in graph.nodes.iter().filter(|node| !node.is_root()) {
            if let Some(&parent) = graph.index.get(&node.parent_id) {
                has_children[parent] = true;
            }
        }

        Self {
            graph,
            has_children,
            cache: vec![None; graph.nodes.len()],
        }
    }

    fn resolve(&mut self, start: usize) -> Result<String> {
        let graph = self.graph;
        let nodes = &graph.nodes;
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = start;

        let mut tail = loop {
            if let Some(known) = &self.cache[current] {
                break known.clone();
            }
            let node = &nodes[current];
            if node.is_root() {
                break ROOT_LINEAGE.to_string();
            }
            if !visited.insert(current) || chain.len() >= graph.max_depth {
                return Err(RefDbError::CyclicLineage {
                    tax_id: nodes[start].id.clone(),
                });
            }
            chain.push(current);

            current = match graph.index.get(&node.parent_id) {
                Some(&parent) => parent,
                None => {
                    return Err(RefDbError::DanglingParent {
                        tax_id: node.id.clone(),
                        parent_id: node.parent_id.clone(),
                    })
                }
            };
        };

        for &idx in chain.iter().rev() {
            let lineage = format!("{};{}", nodes[idx].lineage_name().to_lowercase(), tail);
            if self.has_children[idx] {
                self.cache[idx] = Some(lineage.clone());
            }
            tail = lineage;
        }

        Ok(tail)
    }
}

struct ProgressLog {
    total: usize,
    step: usize,
    last: usize,
}

impl ProgressLog {
    fn new(total: usize, step: u8) -> Self {
        Self {
            total,
            step: step.max(1) as usize,
            last: 0,
        }
    }

    fn update(&mut self, current: usize) {
        if self.total == 0 {
            return;
        }
        let percent = (current * 100 / self.total).min(100);
        if percent >= self.last + self.step {
            self.last = percent - percent % self.step;
            info!("Taxonomy entries: {}% complete", self.last);
        }
    }
}

/// Builds taxonomy entries from an extracted taxdump
pub struct TaxonomyBuilder {
    max_depth: usize,
    progress_interval: u8,
}

impl TaxonomyBuilder {
    pub fn new(config: &TaxonomyConfig) -> Self {
        Self {
            max_depth: config.max_lineage_depth,
            progress_interval: config.progress_interval_percent,
        }
    }

    /// Parse both dumps and stream every entry into `sink`
    pub fn build<F>(&self, names_path: &Path, nodes_path: &Path, sink: F) -> Result<usize>
    where
        F: FnMut(TaxEntry) -> Result<()>,
    {
        let graph = TaxonomyGraph::from_files(names_path, nodes_path, self.max_depth)?;
        info!(
            "Parsed {} taxa from {} name rows, compiling lineages",
            graph.len(),
            graph.name_rows()
        );

        let emitted = graph.for_each_entry(self.progress_interval, sink)?;
        info!("Taxonomy complete: {} entries", emitted);
        Ok(emitted)
    }
}

fn open_dump(path: &Path) -> Result<BufReader<File>> {
    if !path.exists() {
        return Err(RefDbError::SourceFileMissing {
            path: path.to_path_buf(),
        });
    }
    Ok(BufReader::new(File::open(path)?))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const NAMES: &str = "\
1\t|\troot\t|\t\t|\tscientific name\t|
2759\t|\tEukaryota\t|\t\t|\tscientific name\t|
2759\t|\teukaryotes\t|\t\t|\tgenbank common name\t|
9605\t|\tHomo\t|\t\t|\tscientific name\t|
9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|
9606\t|\thuman\t|\t\t|\tgenbank common name\t|
";

    const NODES: &str = "\
1\t|\t1\t|\tno rank\t|
2759\t|\t1\t|\tsuperkingdom\t|
9605\t|\t2759\t|\tgenus\t|
9606\t|\t9605\t|\tspecies\t|
10090\t|\t10088\t|\tspecies\t|
";

    fn graph_from(names: &str, nodes: &str) -> TaxonomyGraph {
        let mut graph = TaxonomyGraph::new(64);
        graph.load_names(Cursor::new(names), "names.dmp").unwrap();
        graph.load_nodes(Cursor::new(nodes), "nodes.dmp").unwrap();
        graph
    }

    fn collect(graph: &TaxonomyGraph) -> Vec<TaxEntry> {
        let mut entries = Vec::new();
        graph
            .for_each_entry(10, |entry| {
                entries.push(entry);
                Ok(())
            })
            .unwrap();
        entries
    }

    #[test]
    fn test_split_dump_row_formats() {
        assert_eq!(
            split_dump_row("9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|"),
            vec!["9606", "Homo sapiens", "", "scientific name"]
        );
        assert_eq!(
            split_dump_row("9606\tHomo sapiens\t\tscientific name"),
            vec!["9606", "Homo sapiens", "", "scientific name"]
        );
    }

    #[test]
    fn test_root_lineage() {
        let graph = graph_from(NAMES, NODES);
        assert_eq!(graph.lineage("1").unwrap().as_deref(), Some("root"));
    }

    #[test]
    fn test_node_without_parent_is_root_terminated() {
        let graph = graph_from("42\tOrphan\t\tscientific name\n", "");
        assert_eq!(graph.lineage("42").unwrap().as_deref(), Some("root"));
    }

    #[test]
    fn test_lineage_walks_parent_chain() {
        let graph = graph_from(NAMES, NODES);
        assert_eq!(
            graph.lineage("9606").unwrap().as_deref(),
            Some("homo sapiens;homo;eukaryota;root")
        );
        // lineage(N) == name(N) + ";" + lineage(parent)
        let parent = graph.lineage("9605").unwrap().unwrap();
        assert_eq!(
            graph.lineage("9606").unwrap().unwrap(),
            format!("homo sapiens;{}", parent)
        );
        assert_eq!(graph.lineage("404").unwrap(), None);
    }

    #[test]
    fn test_resolver_memoizes_internal_nodes_only() {
        let graph = graph_from(NAMES, NODES);
        let mut resolver = LineageResolver::new(&graph);
        let slot = |tax_id: &str| graph.index[tax_id];

        let lineage = resolver.resolve(slot("9606")).unwrap();
        assert_eq!(lineage, "homo sapiens;homo;eukaryota;root");
        assert_eq!(resolver.cache[slot("9606")], None);
        assert_eq!(
            resolver.cache[slot("9605")].as_deref(),
            Some("homo;eukaryota;root")
        );
        assert_eq!(
            resolver.cache[slot("2759")].as_deref(),
            Some("eukaryota;root")
        );

        // Leaf lineages are rebuilt from the cached parent
        assert_eq!(resolver.resolve(slot("9606")).unwrap(), lineage);
        assert_eq!(resolver.cache.iter().flatten().count(), 2);
    }

    #[test]
    fn test_unnamed_nodes_are_skipped() {
        let graph = graph_from(NAMES, NODES);
        // 10090 only appears in the nodes dump
        assert!(graph.get("10090").is_none());
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.name_rows(), 6);
    }

    #[test]
    fn test_one_entry_per_alias() {
        let graph = graph_from(NAMES, NODES);
        let entries = collect(&graph);

        assert_eq!(entries.len(), 6);
        let human: Vec<_> = entries.iter().filter(|e| e.tax_id == "9606").collect();
        assert_eq!(human.len(), 2);
        assert_eq!(human[0].tax_name, "homo sapiens");
        assert_eq!(human[1].tax_name, "human");
        assert!(human.iter().all(|e| e.lineage == "homo sapiens;homo;eukaryota;root"));
    }

    #[test]
    fn test_two_level_example() {
        let graph = graph_from(
            "9606\tHomo sapiens\t\tscientific name\n9605\tHomo\t\tscientific name\n",
            "9606\t9605\tspecies\n",
        );
        let entries = collect(&graph);
        let entry = entries.iter().find(|e| e.tax_name == "homo sapiens").unwrap();
        assert_eq!(entry.lineage, "homo sapiens;root");
    }

    #[test]
    fn test_cycle_is_reported() {
        let graph = graph_from(
            "10\tAlpha\t\tscientific name\n11\tBeta\t\tscientific name\n",
            "10\t11\n11\t10\n",
        );
        match graph.lineage("10") {
            Err(RefDbError::CyclicLineage { tax_id }) => assert_eq!(tax_id, "10"),
            other => panic!("Expected CyclicLineage, got {:?}", other),
        }
    }

    #[test]
    fn test_self_parent_is_reported() {
        let graph = graph_from("7\tLoop\t\tscientific name\n", "7\t7\n");
        assert!(matches!(
            graph.lineage("7"),
            Err(RefDbError::CyclicLineage { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut names = String::new();
        let mut nodes = String::new();
        for id in 2..20 {
            names.push_str(&format!("{}\tTaxon{}\t\tscientific name\n", id, id));
            nodes.push_str(&format!("{}\t{}\n", id, id - 1));
        }
        let mut graph = TaxonomyGraph::new(5);
        graph.load_names(Cursor::new(names), "names").unwrap();
        graph.load_nodes(Cursor::new(nodes), "nodes").unwrap();

        assert!(matches!(
            graph.lineage("19"),
            Err(RefDbError::CyclicLineage { .. })
        ));
    }

    #[test]
    fn test_dangling_parent() {
        let graph = graph_from("5\tLost\t\tscientific name\n", "5\t999\n");
        match graph.lineage("5") {
            Err(RefDbError::DanglingParent { tax_id, parent_id }) => {
                assert_eq!(tax_id, "5");
                assert_eq!(parent_id, "999");
            }
            other => panic!("Expected DanglingParent, got {:?}", other),
        }
    }

    #[test]
    fn test_synonym_only_taxon_uses_first_alias() {
        let graph = graph_from(
            "1\troot\t\tscientific name\n50\tOld Name\t\tsynonym\n",
            "50\t1\n",
        );
        assert_eq!(graph.lineage("50").unwrap().as_deref(), Some("old name;root"));
    }

    #[test]
    fn test_malformed_names_row() {
        let mut graph = TaxonomyGraph::new(64);
        let result = graph.load_names(Cursor::new("1\troot\tscientific name\n9606\n"), "names.dmp");
        match result {
            Err(RefDbError::ParseMalformedRow { file, line, .. }) => {
                assert_eq!(file, "names.dmp");
                assert_eq!(line, 2);
            }
            other => panic!("Expected ParseMalformedRow, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_reports_missing_files() {
        let builder = TaxonomyBuilder::new(&TaxonomyConfig::default());
        let result = builder.build(
            Path::new("/nonexistent/names.dmp"),
            Path::new("/nonexistent/nodes.dmp"),
            |_| Ok(()),
        );
        assert!(matches!(result, Err(RefDbError::SourceFileMissing { .. })));
    }

    #[test]
    fn test_sink_error_aborts_build() {
        let graph = graph_from(NAMES, NODES);
        let mut seen = 0;
        let result = graph.for_each_entry(10, |entry| {
            seen += 1;
            Err(RefDbError::InsertFailed {
                key: entry.tax_name,
                reason: "disk full".to_string(),
            })
        });
        assert!(matches!(result, Err(RefDbError::InsertFailed { .. })));
        assert_eq!(seen, 1);
    }
}
