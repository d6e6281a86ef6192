//! Writing dated `.eml` files through an [`ArchiveFs`].

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::error::Result;
use crate::store::ArchiveFs;

/// Result of trying to create a destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created with `bytes` bytes.
    Written { path: PathBuf, bytes: u64 },
    /// A file with that name already exists and was left as it was.
    AlreadyExists(PathBuf),
}

/// Write `contents` to `path` unless something already exists there.
///
/// The file is created exclusively, so an existing file is never
/// overwritten. Duplicates are detected by path only, not by content.
pub fn write_new_file(fs: &dyn ArchiveFs, path: &Path, contents: &[u8]) -> Result<WriteOutcome> {
    match fs.write_all(path, contents) {
        Ok(()) => Ok(WriteOutcome::Written {
            path: path.to_path_buf(),
            bytes: contents.len() as u64,
        }),
        Err(e) if e.is_already_exists() => {
            debug!(path = %path.display(), "Destination exists");
            Ok(WriteOutcome::AlreadyExists(path.to_path_buf()))
        }
        Err(e) => Err(e),
    }
}

/// Set both the creation and the modification time of `path` to `date`.
pub fn stamp_file(fs: &dyn ArchiveFs, path: &Path, date: &DateTime<FixedOffset>) -> Result<()> {
    let when = SystemTime::from(*date);
    fs.set_creation_time(path, when)?;
    fs.set_modified_time(path, when)
}
