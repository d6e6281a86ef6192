//! Filesystem access used by the splitter and the walker.
//!
//! The core never calls `std::fs` directly; it goes through [`ArchiveFs`] so
//! the traversal and naming logic stay independent of the storage backend.

pub mod local;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::Result;

pub use local::LocalFs;

/// Operations the archive tools need from a filesystem.
///
/// Listings are sorted by file name so a run visits files in a stable order.
pub trait ArchiveFs {
    /// Regular files directly inside `dir` whose extension equals `ext`
    /// (ASCII case-insensitive).
    fn list_files(&self, dir: &Path, ext: &str) -> Result<Vec<PathBuf>>;

    /// Directories directly inside `dir`.
    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// Whole content of a file.
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;

    /// Rename `from` to `to`.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;

    fn set_creation_time(&self, path: &Path, time: SystemTime) -> Result<()>;

    fn set_modified_time(&self, path: &Path, time: SystemTime) -> Result<()>;

    /// Create `path` and any missing parents.
    fn create_directory(&self, path: &Path) -> Result<()>;

    fn file_exists(&self, path: &Path) -> bool;

    /// Create a new file holding `contents`.
    ///
    /// Fails with an `AlreadyExists` I/O error if anything is already at
    /// `path`; an existing file is never replaced.
    fn write_all(&self, path: &Path, contents: &[u8]) -> Result<()>;

    /// Whether `path` exists and is a directory.
    fn is_directory(&self, path: &Path) -> bool;
}
