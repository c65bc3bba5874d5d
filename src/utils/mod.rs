pub mod filesystem;

pub use filesystem::{ArchiveKind, Filesystem, LocalFilesystem};
