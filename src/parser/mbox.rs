//! MBOX splitting.
//!
//! A mailbox is cut into messages at every line accepted by a [`Boundary`].
//! The conventional boundary is a line starting with `From `; body lines that
//! happen to start the same way are a known false positive and are not
//! unescaped or special-cased. Each message is then dated, named and written
//! to `{root}/{year}/` as its own `.eml` file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{MissingDatePolicy, SplitConfig};
use crate::error::Result;
use crate::export::eml::{self, WriteOutcome};
use crate::export::naming;
use crate::model::message::{MailboxText, Message};
use crate::sink::{LogEvent, LogSink};
use crate::store::ArchiveFs;

/// Folder for messages written under [`MissingDatePolicy::Unsorted`].
pub const UNDATED_FOLDER: &str = "undated";

/// Decides whether a line (without its line ending) starts a new message.
pub trait Boundary {
    fn is_boundary(&self, line: &str) -> bool;
}

impl<F: Fn(&str) -> bool> Boundary for F {
    fn is_boundary(&self, line: &str) -> bool {
        self(line)
    }
}

/// Built-in boundary rules, selectable from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryStyle {
    /// Any line starting with `From `.
    #[default]
    FromLine,
    /// `From ` followed by a sender and a four-digit year, as in a real
    /// envelope line (`From alice@example.com Wed Jul  4 10:22:33 2001`).
    Strict,
}

impl Boundary for BoundaryStyle {
    fn is_boundary(&self, line: &str) -> bool {
        match self {
            Self::FromLine => is_from_line(line),
            Self::Strict => is_envelope_line(line),
        }
    }
}

/// Check whether a line starts with the `From ` separator.
pub fn is_from_line(line: &str) -> bool {
    line.starts_with("From ")
}

/// Check whether a line looks like a complete mbox envelope line.
pub fn is_envelope_line(line: &str) -> bool {
    let Some(rest) = line.strip_prefix("From ") else {
        return false;
    };
    let mut tokens = rest.split_whitespace();
    let has_sender = tokens.next().is_some_and(|sender| !sender.ends_with(':'));
    has_sender && tokens.any(|t| t.len() == 4 && t.chars().all(|c| c.is_ascii_digit()))
}

/// Counters for one split mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    /// Messages found in the mailbox.
    pub messages: u64,
    /// Messages written to a new file.
    pub written: u64,
    /// Messages skipped because the destination already existed.
    pub already_existing: u64,
    /// Messages without a usable date.
    pub undated: u64,
    /// Messages whose file could not be written.
    pub failed: u64,
    pub bytes_written: u64,
}

/// Splits mailboxes into dated `.eml` files.
#[derive(Debug, Clone)]
pub struct MboxSplitter<B = BoundaryStyle> {
    boundary: B,
    missing_date: MissingDatePolicy,
    max_subject_len: usize,
    message_ext: String,
    set_timestamps: bool,
}

impl MboxSplitter<BoundaryStyle> {
    /// Build a splitter from the `[split]` configuration.
    pub fn from_config(config: &SplitConfig, message_ext: &str) -> Self {
        Self::new(config.boundary)
            .with_missing_date(config.missing_date)
            .with_timestamps(config.set_timestamps)
            .with_max_subject_len(config.max_subject_len)
            .with_message_ext(message_ext)
    }
}

impl<B: Boundary> MboxSplitter<B> {
    /// A splitter with default settings and a custom boundary rule.
    pub fn new(boundary: B) -> Self {
        let defaults = SplitConfig::default();
        Self {
            boundary,
            missing_date: defaults.missing_date,
            max_subject_len: defaults.max_subject_len,
            message_ext: "eml".to_string(),
            set_timestamps: defaults.set_timestamps,
        }
    }

    pub fn with_missing_date(mut self, policy: MissingDatePolicy) -> Self {
        self.missing_date = policy;
        self
    }

    /// Whether written files get the message date as their file times.
    pub fn with_timestamps(mut self, set_timestamps: bool) -> Self {
        self.set_timestamps = set_timestamps;
        self
    }

    /// Cap on the sanitized subject, in characters.
    pub fn with_max_subject_len(mut self, max_subject_len: usize) -> Self {
        self.max_subject_len = max_subject_len;
        self
    }

    /// Extension of written files, with or without the leading dot.
    pub fn with_message_ext(mut self, ext: &str) -> Self {
        self.message_ext = ext.trim_start_matches('.').to_string();
        self
    }

    /// Cut `text` into messages.
    ///
    /// Every boundary line opens exactly one message, even an empty one, and
    /// the last message runs to the end of the text. Text before the first
    /// boundary becomes a message only if it is not blank.
    pub fn segment<'a>(&self, text: &'a str) -> Vec<Message<'a>> {
        let mut messages = Vec::new();
        let mut separator: Option<&'a str> = None;
        let mut start = 0usize;
        let mut offset = 0usize;

        for line in text.split_inclusive('\n') {
            let bare = line.trim_end_matches(['\n', '\r']);
            if self.boundary.is_boundary(bare) {
                push_segment(&mut messages, separator, &text[start..offset]);
                separator = Some(bare);
                start = offset + line.len();
            }
            offset += line.len();
        }
        push_segment(&mut messages, separator, &text[start..]);

        messages
    }

    /// Split a decoded mailbox into one file per message under
    /// `destination_root`.
    ///
    /// `mailbox_path` is only used for reporting and for naming undated
    /// messages. Missing dates, existing destinations and failed writes are
    /// reported to `sink` per message; the remaining messages are still
    /// processed.
    pub fn split(
        &self,
        fs: &dyn ArchiveFs,
        sink: &mut dyn LogSink,
        mailbox_path: &Path,
        mailbox: &MailboxText,
        destination_root: &Path,
    ) -> SplitReport {
        let mut report = SplitReport::default();

        for message in self.segment(mailbox.as_str()) {
            report.messages += 1;

            let Some((dest_dir, file_name, date)) =
                self.destination(sink, mailbox_path, &message, destination_root, &mut report)
            else {
                continue;
            };

            let dest = dest_dir.join(file_name);
            let contents = mailbox.encode(message.content);

            match self.write_message(fs, &dest, &contents, date) {
                Ok(WriteOutcome::Written { path, bytes }) => {
                    sink.event(&LogEvent::Writing(path));
                    report.written += 1;
                    report.bytes_written += bytes;
                }
                Ok(WriteOutcome::AlreadyExists(path)) => {
                    sink.event(&LogEvent::AlreadyExists(path));
                    report.already_existing += 1;
                }
                Err(e) => {
                    warn!(
                        mailbox = %mailbox_path.display(),
                        sequence = message.sequence,
                        error = %e,
                        "Cannot write message"
                    );
                    sink.event(&LogEvent::failed(dest, &e));
                    report.failed += 1;
                }
            }
        }

        info!(
            mailbox = %mailbox_path.display(),
            messages = report.messages,
            written = report.written,
            failed = report.failed,
            "Split mailbox"
        );
        report
    }

    /// Create the destination folder, write the file and stamp it.
    fn write_message(
        &self,
        fs: &dyn ArchiveFs,
        dest: &Path,
        contents: &[u8],
        date: Option<DateTime<FixedOffset>>,
    ) -> Result<WriteOutcome> {
        if let Some(dir) = dest.parent() {
            fs.create_directory(dir)?;
        }
        let outcome = eml::write_new_file(fs, dest, contents)?;
        if let (WriteOutcome::Written { path, .. }, true, Some(date)) =
            (&outcome, self.set_timestamps, date)
        {
            eml::stamp_file(fs, path, &date)?;
        }
        Ok(outcome)
    }

    /// Folder, file name, and real date (if any) for one message, or `None`
    /// when the message is not to be written.
    fn destination(
        &self,
        sink: &mut dyn LogSink,
        mailbox_path: &Path,
        message: &Message<'_>,
        root: &Path,
        report: &mut SplitReport,
    ) -> Option<(PathBuf, String, Option<DateTime<FixedOffset>>)> {
        let subject = message.subject();

        match message.date() {
            Ok(date) => {
                let name = naming::message_file_name(
                    &date,
                    subject.as_deref(),
                    self.max_subject_len,
                    &self.message_ext,
                );
                Some((root.join(naming::year_folder(&date)), name, Some(date)))
            }
            Err(e) => {
                warn!(
                    mailbox = %mailbox_path.display(),
                    sequence = message.sequence,
                    error = %e,
                    "Message has no usable date"
                );
                report.undated += 1;
                sink.event(&LogEvent::MessageDateNotFound {
                    mailbox: mailbox_path.to_path_buf(),
                    sequence: message.sequence,
                });

                match self.missing_date {
                    MissingDatePolicy::Skip => None,
                    MissingDatePolicy::MinimumDate => {
                        let date = minimum_date();
                        let name = naming::message_file_name(
                            &date,
                            subject.as_deref(),
                            self.max_subject_len,
                            &self.message_ext,
                        );
                        Some((root.join(naming::year_folder(&date)), name, None))
                    }
                    MissingDatePolicy::Unsorted => {
                        let stem = mailbox_path
                            .file_stem()
                            .map(|s| s.to_string_lossy().into_owned())
                            .unwrap_or_else(|| "mailbox".to_string());
                        let tail = format!(" {:05}.{}", message.sequence + 1, self.message_ext);
                        let name = naming::fit_file_name(&stem, &tail);
                        Some((root.join(UNDATED_FOLDER), name, None))
                    }
                }
            }
        }
    }
}

/// `0001-01-01 00:00:00 +00:00`, the date given to undated messages under
/// [`MissingDatePolicy::MinimumDate`].
pub fn minimum_date() -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0)
        .single()
        .expect("0001-01-01 is a valid date")
        .fixed_offset()
}

fn push_segment<'a>(messages: &mut Vec<Message<'a>>, separator: Option<&'a str>, content: &'a str) {
    let message = Message {
        sequence: messages.len() as u64,
        separator,
        content,
    };
    if separator.is_none() {
        if message.is_blank() {
            return;
        }
        debug!("Text before the first boundary kept as a message");
    }
    messages.push(message);
}
