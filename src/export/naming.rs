//! File naming policy for dated messages.
//!
//! Names start with the message date as `YYYY-MM-DD HH.MM.SS` so a plain
//! alphabetical listing is chronological.

use chrono::{DateTime, Datelike, FixedOffset};

/// Characters removed from subjects before they become part of a file name.
const ILLEGAL_CHARS: &[char] = &[
    ':', '[', ']', '\\', '"', '\'', '/', '<', '>', '?', '=', '!', ',', '*', '\t', '|',
];

/// `strftime` pattern of the date prefix.
pub const DATE_PREFIX_FORMAT: &str = "%Y-%m-%d %H.%M.%S";

/// Longest file name, in bytes, accepted by common filesystems.
pub const MAX_FILE_NAME_BYTES: usize = 255;

/// The date prefix, using the wall-clock time written in the header.
pub fn date_prefix(date: &DateTime<FixedOffset>) -> String {
    date.format(DATE_PREFIX_FORMAT).to_string()
}

/// Name of the year folder a message is filed under (`2001`, `0001`).
pub fn year_folder(date: &DateTime<FixedOffset>) -> String {
    format!("{:04}", date.year())
}

/// File name for a message split out of a mailbox:
/// `"{date} {subject}.{ext}"`, or `"{date}.{ext}"` without a usable subject.
///
/// The subject is shortened further when the whole name would exceed
/// [`MAX_FILE_NAME_BYTES`].
pub fn message_file_name(
    date: &DateTime<FixedOffset>,
    subject: Option<&str>,
    max_subject_len: usize,
    ext: &str,
) -> String {
    let prefix = date_prefix(date);
    let subject = subject
        .map(|s| sanitize_subject(s, max_subject_len))
        .unwrap_or_default();
    if subject.is_empty() {
        format!("{prefix}.{ext}")
    } else {
        fit_file_name(&format!("{prefix} {subject}"), &format!(".{ext}"))
    }
}

/// New name for a loose message file: the date prefix followed by the
/// original name. A long original stem is shortened, its extension kept.
pub fn retouched_file_name(date: &DateTime<FixedOffset>, original: &str) -> String {
    let (stem, ext) = match original.rfind('.') {
        Some(dot) if dot > 0 => original.split_at(dot),
        _ => (original, ""),
    };
    fit_file_name(&format!("{} {stem}", date_prefix(date)), ext)
}

/// `head` followed by `tail`, with `head` cut at a character boundary so the
/// result is at most [`MAX_FILE_NAME_BYTES`] long.
pub fn fit_file_name(head: &str, tail: &str) -> String {
    let budget = MAX_FILE_NAME_BYTES.saturating_sub(tail.len());
    if head.len() <= budget {
        return format!("{head}{tail}");
    }
    let mut end = budget;
    while !head.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{tail}", head[..end].trim_end())
}

/// Whether `name` already starts with the date prefix of `date`.
pub fn has_date_prefix(name: &str, date: &DateTime<FixedOffset>) -> bool {
    name.starts_with(&format!("{} ", date_prefix(date)))
}

/// Sanitize a subject for use in a file name.
///
/// Whole `<...>` tokens (message ids, addresses) are removed, then every
/// character of the illegal set and every control character. Runs of
/// whitespace collapse to one space, the result is trimmed and truncated to
/// `max_len` characters. Applying it twice gives the same result as once.
pub fn sanitize_subject(s: &str, max_len: usize) -> String {
    let without_tokens = strip_angle_tokens(s);
    let cleaned: String = without_tokens
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed.chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

/// Remove every `<...>` token from a string.
fn strip_angle_tokens(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut remaining = s;
    while let Some(start) = remaining.find('<') {
        match remaining[start..].find('>') {
            Some(end) => {
                result.push_str(&remaining[..start]);
                remaining = &remaining[start + end + 1..];
            }
            None => break,
        }
    }
    result.push_str(remaining);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822(s).unwrap()
    }

    #[test]
    fn test_date_prefix_uses_header_wall_clock() {
        let d = date("Wed, 4 Jul 2001 10:22:33 -0700");
        assert_eq!(date_prefix(&d), "2001-07-04 10.22.33");
        assert_eq!(year_folder(&d), "2001");
    }

    #[test]
    fn test_message_file_name() {
        let d = date("Tue, 1 Jan 2002 00:00:00 +0000");
        assert_eq!(
            message_file_name(&d, Some("New Year"), 120, "eml"),
            "2002-01-01 00.00.00 New Year.eml"
        );
        assert_eq!(message_file_name(&d, None, 120, "eml"), "2002-01-01 00.00.00.eml");
        assert_eq!(
            message_file_name(&d, Some("???"), 120, "eml"),
            "2002-01-01 00.00.00.eml"
        );
    }

    #[test]
    fn test_retouched_file_name() {
        let d = date("Fri, 31 Dec 1999 23:59:00 +0000");
        assert_eq!(
            retouched_file_name(&d, "note.eml"),
            "1999-12-31 23.59.00 note.eml"
        );
        assert!(has_date_prefix("1999-12-31 23.59.00 note.eml", &d));
        assert!(!has_date_prefix("note.eml", &d));
    }

    #[test]
    fn test_sanitize_removes_illegal_set() {
        let dirty = "Re: [list] \"quoted\" 'x' a/b\\c <d> e? f=g! h, i* j\tk|l";
        let clean = sanitize_subject(dirty, 200);
        for c in ILLEGAL_CHARS {
            assert!(!clean.contains(*c), "{c:?} left in {clean:?}");
        }
        assert_eq!(clean, "Re list quoted x abc e fg h i jkl");
    }

    #[test]
    fn test_sanitize_removes_angle_tokens() {
        assert_eq!(
            sanitize_subject("Meeting <123@host.example> notes", 200),
            "Meeting notes"
        );
        assert_eq!(sanitize_subject("a < b", 200), "a b");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            "Re: [list] hello, world!",
            "  spaced   out  ",
            "<only@token>",
            "tab\tand|pipe",
            "long subject that will be truncated somewhere in the middle",
        ];
        for input in inputs {
            let once = sanitize_subject(input, 20);
            assert_eq!(sanitize_subject(&once, 20), once, "input {input:?}");
        }
    }

    #[test]
    fn test_multibyte_subject_fits_name_limit() {
        let d = date("Wed, 4 Jul 2001 10:22:33 -0700");
        let subject = "日".repeat(120);
        let name = message_file_name(&d, Some(&subject), 120, "eml");
        assert!(name.len() <= MAX_FILE_NAME_BYTES, "{} bytes", name.len());
        assert!(name.starts_with("2001-07-04 10.22.33 日"));
        assert!(name.ends_with("日.eml"));
    }

    #[test]
    fn test_long_retouched_name_keeps_extension() {
        let d = date("Fri, 31 Dec 1999 23:59:00 +0000");
        let original = format!("{}.eml", "é".repeat(125));
        let name = retouched_file_name(&d, &original);
        assert!(name.len() <= MAX_FILE_NAME_BYTES);
        assert!(name.starts_with("1999-12-31 23.59.00 é"));
        assert!(name.ends_with("é.eml"));
        assert!(has_date_prefix(&name, &d));
    }

    #[test]
    fn test_fit_file_name() {
        assert_eq!(fit_file_name("short", ".eml"), "short.eml");
        // The cut lands on a space, which is trimmed.
        let fitted = fit_file_name(&" a".repeat(200), ".eml");
        assert_eq!(fitted.len(), MAX_FILE_NAME_BYTES - 1);
        assert!(fitted.ends_with("a.eml"));
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        assert_eq!(sanitize_subject("Café con leña", 4), "Café");
    }
}
