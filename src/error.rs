//! Centralized error types for emlstamp.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by archive operations.
///
/// A bad root or an unreadable directory aborts a run. Errors on a single
/// file or message are reported through the log sink and the walk continues.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The archive root does not exist.
    #[error("Archive root not found: {0}")]
    RootNotFound(PathBuf),

    /// The archive root exists but is not a directory.
    #[error("Archive root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Convenience alias for `Result<T, ArchiveError>`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

impl ArchiveError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The cause without the path, for report lines that already name it.
    pub fn reason(&self) -> String {
        match self {
            Self::Io { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this is an I/O error of kind `AlreadyExists`.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::AlreadyExists)
    }
}

/// Why no date could be taken from a message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// No line starts with `Date:`.
    #[error("no Date header")]
    MissingHeader,

    /// A `Date:` header exists but its value is not a recognizable date.
    #[error("unparsable Date header: '{0}'")]
    Unparsable(String),
}
