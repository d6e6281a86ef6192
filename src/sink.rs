//! User-facing report lines.
//!
//! Every processed, skipped or failed file produces one [`LogEvent`]. The core
//! hands the rendered line to an injected [`LogSink`]; diagnostics for
//! developers go through `tracing` instead.
//!
//! Mailbox messages are not files of their own, so a message without a date
//! is reported as `ERROR: Cannot find date in file: {mailbox} (message N)`,
//! numbered from 1. When the missing-date policy still writes that message,
//! the written file gets its own `Writing {path}` line after the error.

use std::fmt;
use std::path::PathBuf;

use crate::error::ArchiveError;

/// One report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
    /// A loose message was renamed and its file times set.
    TimestampSet(PathBuf),
    /// A message split out of a mailbox was written.
    Writing(PathBuf),
    /// The destination already exists; nothing was written.
    AlreadyExists(PathBuf),
    /// No usable `Date:` header.
    DateNotFound(PathBuf),
    /// A mailbox message without a usable `Date:` header.
    MessageDateNotFound { mailbox: PathBuf, sequence: u64 },
    /// Reading, writing, renaming or stamping one file failed.
    Failed { path: PathBuf, reason: String },
}

impl LogEvent {
    pub fn failed(path: impl Into<PathBuf>, error: &ArchiveError) -> Self {
        Self::Failed {
            path: path.into(),
            reason: error.reason(),
        }
    }
}

impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimestampSet(p) => write!(f, "Set timestamp of {}", p.display()),
            Self::Writing(p) => write!(f, "Writing {}", p.display()),
            Self::AlreadyExists(p) => write!(f, "Ignoring {}. File already exists.", p.display()),
            Self::DateNotFound(p) => write!(f, "ERROR: Cannot find date in file: {}", p.display()),
            Self::MessageDateNotFound { mailbox, sequence } => write!(
                f,
                "ERROR: Cannot find date in file: {} (message {})",
                mailbox.display(),
                sequence + 1
            ),
            Self::Failed { path, reason } => {
                write!(f, "ERROR: Cannot process file: {} ({reason})", path.display())
            }
        }
    }
}

/// Consumer of report lines.
pub trait LogSink {
    fn log(&mut self, line: &str);

    /// Render and log an event.
    fn event(&mut self, event: &LogEvent) {
        self.log(&event.to_string());
    }
}

/// Collects lines in memory.
impl LogSink for Vec<String> {
    fn log(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

impl<S: LogSink + ?Sized> LogSink for &mut S {
    fn log(&mut self, line: &str) {
        (**self).log(line);
    }
}

/// Prints every line to standard output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn log(&mut self, line: &str) {
        println!("{line}");
    }
}
