/// Filesystem collaborator used by the database pipeline
///
/// Every operation is fallible but non-throwing: failures are logged and
/// reported as `false` so the caller decides which error kind applies.
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;
use tar::Archive;
use tracing::{debug, warn};

/// Archive layouts understood by [`Filesystem::decompress`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Tarball; the destination is a directory
    TarGz,
    /// Single gzip stream; the destination is the output file
    Gz,
}

#[cfg_attr(test, mockall::automock)]
pub trait Filesystem {
    fn download(&self, url: &str, dest: &Path) -> bool;
    fn decompress(&self, archive: &Path, dest: &Path, kind: ArchiveKind) -> bool;
    fn file_exists(&self, path: &Path) -> bool;
    fn delete_file(&self, path: &Path);
    fn create_dir(&self, path: &Path);
    fn delete_dir(&self, path: &Path);
}

/// Local disk implementation; fetches `http(s)://` with reqwest and copies
/// `file://` URLs or bare paths
pub struct LocalFilesystem {
    user_agent: String,
    timeout: Duration,
}

impl Default for LocalFilesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalFilesystem {
    pub fn new() -> Self {
        LocalFilesystem {
            user_agent: format!("annodb/{}", env!("CARGO_PKG_VERSION")),
            // taxdump is ~60 MB, allow slow mirrors
            timeout: Duration::from_secs(1800),
        }
    }

    fn fetch_http(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let mut response = client.get(url).send()?.error_for_status()?;
        let mut writer = BufWriter::new(File::create(dest)?);
        response.copy_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    fn extract(&self, archive: &Path, dest: &Path, kind: ArchiveKind) -> io::Result<()> {
        let mut decoder = GzDecoder::new(File::open(archive)?);
        match kind {
            ArchiveKind::TarGz => {
                fs::create_dir_all(dest)?;
                Archive::new(decoder).unpack(dest)
            }
            ArchiveKind::Gz => {
                let mut writer = BufWriter::new(File::create(dest)?);
                io::copy(&mut decoder, &mut writer)?;
                writer.flush()
            }
        }
    }
}

impl Filesystem for LocalFilesystem {
    fn download(&self, url: &str, dest: &Path) -> bool {
        debug!("Downloading {} to {}", url, dest.display());

        let result = if url.starts_with("http://") || url.starts_with("https://") {
            self.fetch_http(url, dest)
        } else {
            let source = url.strip_prefix("file://").unwrap_or(url);
            fs::copy(source, dest).map(|_| ()).map_err(anyhow::Error::from)
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Download of {} failed: {}", url, e);
                fs::remove_file(dest).ok();
                false
            }
        }
    }

    fn decompress(&self, archive: &Path, dest: &Path, kind: ArchiveKind) -> bool {
        debug!("Decompressing {} to {}", archive.display(), dest.display());
        if !archive.exists() {
            warn!("Archive does not exist: {}", archive.display());
            return false;
        }

        match self.extract(archive, dest, kind) {
            Ok(()) => true,
            Err(e) => {
                warn!("Unable to decompress {}: {}", archive.display(), e);
                false
            }
        }
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn delete_file(&self, path: &Path) {
        if path.exists() {
            if let Err(e) = fs::remove_file(path) {
                warn!("Unable to delete {}: {}", path.display(), e);
            }
        }
    }

    fn create_dir(&self, path: &Path) {
        if let Err(e) = fs::create_dir_all(path) {
            warn!("Unable to create directory {}: {}", path.display(), e);
        }
    }

    fn delete_dir(&self, path: &Path) {
        if path.exists() {
            if let Err(e) = fs::remove_dir_all(path) {
                warn!("Unable to delete directory {}: {}", path.display(), e);
            }
        }
    }
}
