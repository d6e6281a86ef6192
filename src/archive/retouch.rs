//! In-place retouching of loose `.eml` files: date-prefixed rename plus file
//! times.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::RetouchConfig;
use crate::error::Result;
use crate::export::{eml, naming};
use crate::model::entry::ArchiveEntry;
use crate::model::message::Message;
use crate::parser::eml::read_mail_file;
use crate::sink::{LogEvent, LogSink};
use crate::store::ArchiveFs;

/// What happened to one loose message file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetouchOutcome {
    /// Renamed to the new path and stamped.
    Renamed(PathBuf),
    /// Name already carried the date prefix; only the file times were set.
    Stamped(PathBuf),
    /// The renamed path was taken; the file was left untouched.
    AlreadyExists(PathBuf),
    /// No usable date; the file was left untouched.
    NoDate,
    /// Reading, renaming or stamping failed; reported and skipped.
    Failed,
}

/// Rename a loose message to `"{date} {original name}"` and set its creation
/// and modification times to that date.
///
/// A message without a usable date is reported and left as it is. The
/// content is never rewritten. Filesystem errors on this file are reported
/// to `sink` as a failure of this file only.
pub fn retouch_file(
    fs: &dyn ArchiveFs,
    sink: &mut dyn LogSink,
    entry: &ArchiveEntry,
    config: &RetouchConfig,
) -> RetouchOutcome {
    match try_retouch(fs, sink, entry, config) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(path = %entry.path.display(), error = %e, "Cannot retouch file");
            sink.event(&LogEvent::failed(&entry.path, &e));
            RetouchOutcome::Failed
        }
    }
}

fn try_retouch(
    fs: &dyn ArchiveFs,
    sink: &mut dyn LogSink,
    entry: &ArchiveEntry,
    config: &RetouchConfig,
) -> Result<RetouchOutcome> {
    let path = &entry.path;
    let text = read_mail_file(fs, path)?;

    let date = match Message::whole(text.as_str()).date() {
        Ok(date) => date,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot find date");
            sink.event(&LogEvent::DateNotFound(path.clone()));
            return Ok(RetouchOutcome::NoDate);
        }
    };

    let original = entry.file_name();
    if config.skip_prefixed && naming::has_date_prefix(&original, &date) {
        debug!(path = %path.display(), "Already date-prefixed, stamping only");
        eml::stamp_file(fs, path, &date)?;
        sink.event(&LogEvent::TimestampSet(path.clone()));
        return Ok(RetouchOutcome::Stamped(path.clone()));
    }

    let target = sibling(path, &naming::retouched_file_name(&date, &original));
    if fs.file_exists(&target) {
        sink.event(&LogEvent::AlreadyExists(target.clone()));
        return Ok(RetouchOutcome::AlreadyExists(target));
    }

    fs.move_file(path, &target)?;
    eml::stamp_file(fs, &target, &date)?;
    sink.event(&LogEvent::TimestampSet(target.clone()));
    Ok(RetouchOutcome::Renamed(target))
}

fn sibling(path: &Path, name: &str) -> PathBuf {
    match path.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::store::LocalFs;
    use std::time::SystemTime;

    /// Local filesystem whose renames always fail.
    struct ReadOnlyRenames(LocalFs);

    impl ArchiveFs for ReadOnlyRenames {
        fn list_files(&self, dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
            self.0.list_files(dir, ext)
        }
        fn list_subdirectories(&self, dir: &Path) -> Result<Vec<PathBuf>> {
            self.0.list_subdirectories(dir)
        }
        fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
            self.0.read_all(path)
        }
        fn move_file(&self, from: &Path, _to: &Path) -> Result<()> {
            Err(ArchiveError::io(
                from,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ))
        }
        fn set_creation_time(&self, path: &Path, time: SystemTime) -> Result<()> {
            self.0.set_creation_time(path, time)
        }
        fn set_modified_time(&self, path: &Path, time: SystemTime) -> Result<()> {
            self.0.set_modified_time(path, time)
        }
        fn create_directory(&self, path: &Path) -> Result<()> {
            self.0.create_directory(path)
        }
        fn file_exists(&self, path: &Path) -> bool {
            self.0.file_exists(path)
        }
        fn write_all(&self, path: &Path, contents: &[u8]) -> Result<()> {
            self.0.write_all(path, contents)
        }
        fn is_directory(&self, path: &Path) -> bool {
            self.0.is_directory(path)
        }
    }

    const NOTE: &str = "From: a@example.com\nDate: Fri, 31 Dec 1999 23:59:00 +0000\nSubject: Party\n\nSee you.\n";

    fn setup(name: &str, content: &str) -> (tempfile::TempDir, ArchiveEntry) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        let entry = ArchiveEntry::classify(path, "eml", "mbox");
        (dir, entry)
    }

    #[test]
    fn test_retouch_renames_and_logs() {
        let (dir, entry) = setup("note.eml", NOTE);
        let mut lines: Vec<String> = Vec::new();

        let outcome =
            retouch_file(&LocalFs::new(), &mut lines, &entry, &RetouchConfig::default());

        let expected = dir.path().join("1999-12-31 23.59.00 note.eml");
        assert_eq!(outcome, RetouchOutcome::Renamed(expected.clone()));
        assert!(!entry.path.exists());
        assert_eq!(std::fs::read_to_string(&expected).unwrap(), NOTE);
        assert_eq!(lines, [format!("Set timestamp of {}", expected.display())]);
    }

    #[test]
    fn test_retouch_without_date_leaves_file() {
        let (_dir, entry) = setup("nodate.eml", "Subject: nothing\n\nbody\n");
        let mut lines: Vec<String> = Vec::new();

        let outcome =
            retouch_file(&LocalFs::new(), &mut lines, &entry, &RetouchConfig::default());

        assert_eq!(outcome, RetouchOutcome::NoDate);
        assert!(entry.path.exists());
        assert_eq!(
            lines,
            [format!("ERROR: Cannot find date in file: {}", entry.path.display())]
        );
    }

    #[test]
    fn test_retouch_skips_prefixed_name() {
        let (_dir, entry) = setup("1999-12-31 23.59.00 note.eml", NOTE);
        let mut lines: Vec<String> = Vec::new();

        let outcome =
            retouch_file(&LocalFs::new(), &mut lines, &entry, &RetouchConfig::default());

        assert_eq!(outcome, RetouchOutcome::Stamped(entry.path.clone()));
        assert!(entry.path.exists());
    }

    #[test]
    fn test_retouch_prefixes_again_when_configured() {
        let (dir, entry) = setup("1999-12-31 23.59.00 note.eml", NOTE);
        let config = RetouchConfig {
            skip_prefixed: false,
            ..RetouchConfig::default()
        };
        let mut lines: Vec<String> = Vec::new();

        let outcome = retouch_file(&LocalFs::new(), &mut lines, &entry, &config);
        assert_eq!(
            outcome,
            RetouchOutcome::Renamed(dir.path().join("1999-12-31 23.59.00 1999-12-31 23.59.00 note.eml"))
        );
    }

    #[test]
    fn test_retouch_target_taken() {
        let (dir, entry) = setup("note.eml", NOTE);
        let taken = dir.path().join("1999-12-31 23.59.00 note.eml");
        std::fs::write(&taken, "other").unwrap();
        let mut lines: Vec<String> = Vec::new();

        let outcome =
            retouch_file(&LocalFs::new(), &mut lines, &entry, &RetouchConfig::default());

        assert_eq!(outcome, RetouchOutcome::AlreadyExists(taken.clone()));
        assert!(entry.path.exists());
        assert_eq!(std::fs::read_to_string(&taken).unwrap(), "other");
        assert_eq!(
            lines,
            [format!("Ignoring {}. File already exists.", taken.display())]
        );
    }

    #[test]
    fn test_retouch_failure_is_reported() {
        let (_dir, entry) = setup("note.eml", NOTE);
        let mut lines: Vec<String> = Vec::new();

        let outcome = retouch_file(
            &ReadOnlyRenames(LocalFs::new()),
            &mut lines,
            &entry,
            &RetouchConfig::default(),
        );

        assert_eq!(outcome, RetouchOutcome::Failed);
        assert!(entry.path.exists());
        assert_eq!(
            lines,
            [format!("ERROR: Cannot process file: {} (read-only)", entry.path.display())]
        );
    }

    #[test]
    fn test_retouch_unreadable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let entry = ArchiveEntry::classify(dir.path().join("gone.eml"), "eml", "mbox");
        let mut lines: Vec<String> = Vec::new();

        let outcome = retouch_file(&LocalFs::new(), &mut lines, &entry, &RetouchConfig::default());

        assert_eq!(outcome, RetouchOutcome::Failed);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with(&format!("ERROR: Cannot process file: {}", entry.path.display())));
    }
}
