//! Shared fixtures for annodb integration tests
//!
//! Builds miniature NCBI taxdump and GO termdb archives inside a temporary
//! directory and points a `Config` at them through `file://` URLs.
#![allow(dead_code)]

use annodb::Config;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const NAMES_DMP: &str = "\
1\t|\troot\t|\t\t|\tscientific name\t|
9605\t|\tHomo\t|\t\t|\tscientific name\t|
9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|
9606\t|\thuman\t|\t\t|\tgenbank common name\t|
9596\t|\tPan\t|\t\t|\tscientific name\t|
9598\t|\tPan troglodytes\t|\t\t|\tscientific name\t|
";

// 9605 has no parent row and terminates its chain
pub const NODES_DMP: &str = "\
1\t|\t1\t|\tno rank\t|
9606\t|\t9605\t|\tspecies\t|
9596\t|\t1\t|\tgenus\t|
9598\t|\t9596\t|\tspecies\t|
";

pub const TERM_TXT: &str = "\
1\tbiological_process\tbiological_process\tGO:0008150\t0\t0
2\tcellular_component\tcellular_component\tGO:0005575\t0\t0
3\tmolecular_function\tmolecular_function\tGO:0003674\t0\t0
10\tcell cycle\tbiological_process\tGO:0007049\t0\t0
11\tnucleus\tcellular_component\tGO:0005634\t0\t0
";

pub const GRAPH_PATH_TXT: &str = "\
100\t1\t10\t1\t2\t0
101\t1\t10\t1\t5\t0
102\t2\t11\t1\t1\t0
103\t10\t11\t1\t9\t0
";

pub const TAXONOMY_ENTRIES: usize = 6;
pub const GO_ENTRIES: usize = 5;

/// Temporary annodb home with fixture sources
pub struct TestEnvironment {
    temp_dir: TempDir,
    pub home: PathBuf,
    pub sources: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_names(NAMES_DMP)
    }

    /// Environment whose taxdump carries `names` as names.dmp
    pub fn with_names(names: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let home = temp_dir.path().join("annodb_home");
        let sources = temp_dir.path().join("sources");
        std::fs::create_dir_all(&sources).expect("Failed to create sources dir");

        write_tar_gz(
            &sources.join("taxdump.tar.gz"),
            &[("names.dmp", names), ("nodes.dmp", NODES_DMP)],
        );
        write_tar_gz(
            &sources.join("go_daily-termdb-tables.tar.gz"),
            &[
                ("go_daily-termdb-tables/term.txt", TERM_TXT),
                ("go_daily-termdb-tables/graph_path.txt", GRAPH_PATH_TXT),
            ],
        );

        TestEnvironment {
            temp_dir,
            home,
            sources,
        }
    }

    /// Configuration rooted in this environment
    pub fn config(&self) -> Config {
        let mut config = Config::with_home(&self.home);
        config.sources.taxonomy_url = file_url(&self.sources.join("taxdump.tar.gz"));
        config.sources.gene_ontology_url =
            file_url(&self.sources.join("go_daily-termdb-tables.tar.gz"));
        config
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.home.join(relative)
    }

    pub fn temp_dir(&self) -> PathBuf {
        self.config().database.temp_dir
    }
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

pub fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
    let encoder = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Gzip `source` into `dest`
pub fn gzip_file(source: &Path, dest: &Path) {
    let data = std::fs::read(source).unwrap();
    let mut encoder = GzEncoder::new(File::create(dest).unwrap(), Compression::default());
    encoder.write_all(&data).unwrap();
    encoder.finish().unwrap();
}

pub fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
