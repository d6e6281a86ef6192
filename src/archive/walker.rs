//! Depth-first archive traversal.
//!
//! At each directory mailboxes are split first. A directory holding at least
//! one mailbox counts as already converted, so its loose `.eml` files are not
//! retouched in the same pass. Subdirectories are listed before anything is
//! written, which keeps the year folders created by splitting out of the
//! current traversal.
//!
//! A failure on one file or message is reported to the sink and the walk
//! moves on. Only a bad root or an unlistable directory ends the run.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive::retouch::{self, RetouchOutcome};
use crate::config::Config;
use crate::error::{ArchiveError, Result};
use crate::model::entry::{ArchiveEntry, EntryKind};
use crate::parser::eml::read_mail_file;
use crate::parser::mbox::{MboxSplitter, SplitReport};
use crate::sink::{LogEvent, LogSink};
use crate::store::ArchiveFs;

/// Totals for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    pub directories: u64,
    pub mailboxes: u64,
    /// Messages found inside mailboxes.
    pub messages: u64,
    pub messages_written: u64,
    /// Destinations skipped because the file already existed.
    pub already_existing: u64,
    /// Messages and loose files without a usable date.
    pub undated: u64,
    /// Loose files renamed or stamped.
    pub retouched: u64,
    /// Files or messages that could not be read or written.
    pub failed: u64,
    pub bytes_written: u64,
}

impl WalkSummary {
    fn add_split(&mut self, report: &SplitReport) {
        self.mailboxes += 1;
        self.messages += report.messages;
        self.messages_written += report.written;
        self.already_existing += report.already_existing;
        self.undated += report.undated;
        self.failed += report.failed;
        self.bytes_written += report.bytes_written;
    }

    fn add_retouch(&mut self, outcome: &RetouchOutcome) {
        match outcome {
            RetouchOutcome::Renamed(_) | RetouchOutcome::Stamped(_) => self.retouched += 1,
            RetouchOutcome::AlreadyExists(_) => self.already_existing += 1,
            RetouchOutcome::NoDate => self.undated += 1,
            RetouchOutcome::Failed => self.failed += 1,
        }
    }
}

/// Walks an archive tree, splitting mailboxes and retouching loose messages.
pub struct ArchiveWalker<F, S> {
    fs: F,
    sink: S,
    config: Config,
    splitter: MboxSplitter,
    progress: Option<Box<dyn Fn(&Path)>>,
}

impl<F: ArchiveFs, S: LogSink> ArchiveWalker<F, S> {
    pub fn new(fs: F, sink: S, config: &Config) -> Self {
        let splitter = MboxSplitter::from_config(&config.split, &config.retouch.message_extension);
        Self {
            fs,
            sink,
            config: config.clone(),
            splitter,
            progress: None,
        }
    }

    /// Call `progress` with every directory before it is processed.
    pub fn with_progress(mut self, progress: impl Fn(&Path) + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// The sink, e.g. to inspect collected lines.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process `root` and everything below it.
    ///
    /// Fails if `root` is missing or not a directory, or if a directory
    /// cannot be listed; per-file problems are only reported to the sink.
    pub fn walk(&mut self, root: &Path) -> Result<WalkSummary> {
        if !self.fs.file_exists(root) {
            return Err(ArchiveError::RootNotFound(root.to_path_buf()));
        }
        if !self.fs.is_directory(root) {
            return Err(ArchiveError::NotADirectory(root.to_path_buf()));
        }

        let mut summary = WalkSummary::default();
        self.visit(root, &mut summary)?;
        info!(
            root = %root.display(),
            directories = summary.directories,
            mailboxes = summary.mailboxes,
            retouched = summary.retouched,
            failed = summary.failed,
            "Walk complete"
        );
        Ok(summary)
    }

    fn visit(&mut self, dir: &Path, summary: &mut WalkSummary) -> Result<()> {
        if let Some(progress) = &self.progress {
            progress(dir);
        }
        summary.directories += 1;

        let subdirectories = self.fs.list_subdirectories(dir)?;

        let split_any = self.split_mailboxes(dir, summary)?;
        if split_any {
            debug!(dir = %dir.display(), "Mailboxes present, skipping loose messages");
        } else {
            self.retouch_messages(dir, summary)?;
        }

        for sub in subdirectories {
            self.visit(&sub, summary)?;
        }
        Ok(())
    }

    /// Split every mailbox in `dir`. Returns whether there was at least one.
    fn split_mailboxes(&mut self, dir: &Path, summary: &mut WalkSummary) -> Result<bool> {
        let mailboxes = self.entries(dir, &self.config.split.mailbox_extension, EntryKind::Mailbox)?;
        let destination_root = self
            .config
            .split
            .output_root
            .clone()
            .unwrap_or_else(|| dir.to_path_buf());

        for mailbox in &mailboxes {
            debug!(mailbox = %mailbox.path.display(), "Splitting");
            let text = match read_mail_file(&self.fs, &mailbox.path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(mailbox = %mailbox.path.display(), error = %e, "Cannot read mailbox");
                    self.sink.event(&LogEvent::failed(&mailbox.path, &e));
                    summary.failed += 1;
                    continue;
                }
            };
            let report =
                self.splitter
                    .split(&self.fs, &mut self.sink, &mailbox.path, &text, &destination_root);
            summary.add_split(&report);
        }
        Ok(!mailboxes.is_empty())
    }

    fn retouch_messages(&mut self, dir: &Path, summary: &mut WalkSummary) -> Result<()> {
        let messages = self.entries(dir, &self.config.retouch.message_extension, EntryKind::Message)?;
        for message in &messages {
            let outcome =
                retouch::retouch_file(&self.fs, &mut self.sink, message, &self.config.retouch);
            summary.add_retouch(&outcome);
        }
        Ok(())
    }

    /// Files of `dir` with extension `ext`, kept only if they classify as `kind`.
    fn entries(&self, dir: &Path, ext: &str, kind: EntryKind) -> Result<Vec<ArchiveEntry>> {
        let entries = self
            .fs
            .list_files(dir, ext)?
            .into_iter()
            .map(|path| {
                ArchiveEntry::classify(
                    path,
                    &self.config.retouch.message_extension,
                    &self.config.split.mailbox_extension,
                )
            })
            .filter(|entry| entry.kind == kind)
            .collect();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalFs;

    #[test]
    fn test_missing_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut walker = ArchiveWalker::new(LocalFs::new(), Vec::<String>::new(), &Config::default());
        let err = walker.walk(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, ArchiveError::RootNotFound(_)));
    }

    #[test]
    fn test_file_root_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.eml");
        std::fs::write(&file, "x").unwrap();
        let mut walker = ArchiveWalker::new(LocalFs::new(), Vec::<String>::new(), &Config::default());
        assert!(matches!(
            walker.walk(&file).unwrap_err(),
            ArchiveError::NotADirectory(_)
        ));
    }

    #[test]
    fn test_empty_tree() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let mut walker = ArchiveWalker::new(LocalFs::new(), Vec::<String>::new(), &Config::default());
        let summary = walker.walk(dir.path()).unwrap();
        assert_eq!(summary.directories, 2);
        assert_eq!(summary.mailboxes, 0);
        assert!(walker.sink().is_empty());
    }

    #[test]
    fn test_progress_sees_every_directory() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in_cb = Rc::clone(&seen);

        let mut walker = ArchiveWalker::new(LocalFs::new(), Vec::<String>::new(), &Config::default())
            .with_progress(move |p| seen_in_cb.borrow_mut().push(p.to_path_buf()));
        walker.walk(dir.path()).unwrap();

        assert_eq!(
            *seen.borrow(),
            [
                dir.path().to_path_buf(),
                dir.path().join("a"),
                dir.path().join("a").join("b")
            ]
        );
    }
}
