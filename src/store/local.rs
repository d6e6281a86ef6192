//! [`ArchiveFs`] backed by the local filesystem.

use std::fs::{File, FileTimes};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::ArchiveFs;
use crate::error::{ArchiveError, Result};
use crate::model::entry::has_extension;

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }

    /// Entries of `dir` accepted by `keep`, sorted by name.
    fn list_dir(&self, dir: &Path, keep: impl Fn(&Path, &std::fs::FileType) -> bool) -> Result<Vec<PathBuf>> {
        let read_dir = std::fs::read_dir(dir).map_err(|e| ArchiveError::io(dir, e))?;
        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| ArchiveError::io(dir, e))?;
            let path = entry.path();
            // Follows symlinks, so linked files and folders are treated like real ones.
            let file_type = match std::fs::metadata(&path) {
                Ok(meta) => meta.file_type(),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if keep(&path, &file_type) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn apply_times(&self, path: &Path, times: FileTimes) -> Result<()> {
        let file = File::options()
            .write(true)
            .open(path)
            .map_err(|e| ArchiveError::io(path, e))?;
        file.set_times(times).map_err(|e| ArchiveError::io(path, e))
    }
}

impl ArchiveFs for LocalFs {
    fn list_files(&self, dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
        self.list_dir(dir, |path, ft| ft.is_file() && has_extension(path, ext))
    }

    fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        self.list_dir(dir, |_, ft| ft.is_dir())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| ArchiveError::io(path, e))
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to).map_err(|e| ArchiveError::io(from, e))
    }

    #[cfg(any(windows, target_os = "macos"))]
    fn set_creation_time(&self, path: &Path, time: SystemTime) -> Result<()> {
        #[cfg(target_os = "macos")]
        use std::os::macos::fs::FileTimesExt;
        #[cfg(windows)]
        use std::os::windows::fs::FileTimesExt;

        self.apply_times(path, FileTimes::new().set_created(time))
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    fn set_creation_time(&self, path: &Path, _time: SystemTime) -> Result<()> {
        debug!(path = %path.display(), "Creation time cannot be set on this platform");
        Ok(())
    }

    fn set_modified_time(&self, path: &Path, time: SystemTime) -> Result<()> {
        self.apply_times(path, FileTimes::new().set_modified(time))
    }

    fn create_directory(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path).map_err(|e| ArchiveError::io(path, e))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write_all(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let mut file = File::options()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| ArchiveError::io(path, e))?;
        file.write_all(contents).map_err(|e| ArchiveError::io(path, e))
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
