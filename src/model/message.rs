//! Decoded mailbox text and the messages carved out of it.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset};
use encoding_rs::Encoding;

use crate::error::DateError;
use crate::parser::{date, header};

/// The full text of a `.mbox` or `.eml` file plus the encoding it was read in.
///
/// Files are decoded as UTF-8 when valid and as Windows-1252 otherwise, which
/// accepts every byte. Keeping the encoding lets split messages be written
/// back with their original bytes.
#[derive(Debug, Clone)]
pub struct MailboxText {
    text: String,
    encoding: &'static Encoding,
}

impl MailboxText {
    /// Decode raw file bytes.
    pub fn decode(bytes: &[u8]) -> Self {
        let (text, encoding) = header::decode_text_bytes(bytes);
        Self { text, encoding }
    }

    /// Wrap text that is already UTF-8.
    pub fn from_utf8(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            encoding: encoding_rs::UTF_8,
        }
    }

    /// The decoded text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The encoding the source bytes were decoded from.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Encode a slice of this text back into the source encoding.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        let (bytes, _, _) = self.encoding.encode(text);
        bytes
    }
}

/// One message of a mailbox, borrowed from its [`MailboxText`].
///
/// `separator` is the boundary line that opened the message (without its line
/// ending); it is `None` for a whole `.eml` file or for text preceding the
/// first boundary. `content` is every line after the separator up to the next
/// boundary or the end of the stream, line endings included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    /// Position inside the mailbox (0, 1, 2, …).
    pub sequence: u64,
    pub separator: Option<&'a str>,
    pub content: &'a str,
}

impl<'a> Message<'a> {
    /// A message made of a whole file's text.
    pub fn whole(content: &'a str) -> Self {
        Self {
            sequence: 0,
            separator: None,
            content,
        }
    }

    /// Whether the content holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// The authored date from the `Date:` header.
    pub fn date(&self) -> Result<DateTime<FixedOffset>, DateError> {
        date::extract_date(self.content)
    }

    /// The `Subject:` value, unless absent or an undecoded encoded-word.
    pub fn subject(&self) -> Option<String> {
        header::extract_subject(self.content)
    }
}
