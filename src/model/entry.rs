//! Filesystem entries found while walking an archive.

use std::path::{Path, PathBuf};

/// What a file inside the archive holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A single-message file (`.eml`).
    Message,
    /// A concatenated mailbox (`.mbox`).
    Mailbox,
    Other,
}

/// A path plus its kind. Re-derived on every traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl ArchiveEntry {
    /// Classify a file path by extension (ASCII case-insensitive).
    pub fn classify(path: impl Into<PathBuf>, message_ext: &str, mailbox_ext: &str) -> Self {
        let path = path.into();
        let kind = if has_extension(&path, mailbox_ext) {
            EntryKind::Mailbox
        } else if has_extension(&path, message_ext) {
            EntryKind::Message
        } else {
            EntryKind::Other
        };
        Self { path, kind }
    }

    /// File name as a string, lossily converted.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Whether `path` ends in `.{ext}`, ignoring ASCII case.
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext.trim_start_matches('.')))
}
