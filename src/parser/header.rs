//! Header lookup on raw message text: byte decoding, line-anchored header
//! search with folding, and subject extraction.

use encoding_rs::Encoding;

/// Decode raw file bytes to a string.
///
/// Tries UTF-8 first, then falls back to Windows-1252 (which accepts every
/// byte). A leading UTF-8 BOM is dropped. Returns the text and the encoding
/// that produced it.
pub fn decode_text_bytes(bytes: &[u8]) -> (String, &'static Encoding) {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(s) => (s.to_string(), encoding_rs::UTF_8),
        Err(_) => {
            let (decoded, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
            (decoded.into_owned(), encoding_rs::WINDOWS_1252)
        }
    }
}

/// Find the value of the first header `name` that starts a line.
///
/// The name is matched ASCII case-insensitively and must be followed by a
/// colon. Continuation lines (leading space or tab) are joined with a single
/// space. Occurrences in the middle of a line never match.
pub fn find_header(text: &str, name: &str) -> Option<String> {
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let Some(value) = strip_header_name(line, name) else {
            continue;
        };

        let mut value = value.trim().to_string();
        for next in lines.by_ref() {
            if !(next.starts_with(' ') || next.starts_with('\t')) || next.trim().is_empty() {
                break;
            }
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(next.trim());
        }
        return Some(value);
    }
    None
}

/// Return the text after `name:` when `line` starts with that header name.
fn strip_header_name<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let head = line.get(..name.len())?;
    if !head.eq_ignore_ascii_case(name) {
        return None;
    }
    line[name.len()..].strip_prefix(':')
}

/// Extract the subject from a line starting with `Subject: `.
///
/// Subjects holding MIME encoded-words (`=?utf-8?...`) are treated as absent:
/// they are not decoded and would only produce unreadable file names. An empty
/// subject is also absent.
pub fn extract_subject(text: &str) -> Option<String> {
    let value = text
        .lines()
        .find_map(|line| line.strip_prefix("Subject: "))?
        .trim();

    if value.is_empty() || value.to_ascii_lowercase().contains("?utf-") {
        return None;
    }
    Some(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_header_anchored_at_line_start() {
        let text = "X-Note: see Date: yesterday\nDate: Wed, 4 Jul 2001 10:22:33 -0700\n";
        assert_eq!(
            find_header(text, "Date").as_deref(),
            Some("Wed, 4 Jul 2001 10:22:33 -0700")
        );
    }

    #[test]
    fn test_find_header_ignores_quoted_header() {
        let text = "Subject: fwd\n\n> Date: Mon, 1 Jan 2001 00:00:00 +0000\n";
        assert_eq!(find_header(text, "Date"), None);
    }

    #[test]
    fn test_find_header_case_insensitive_name() {
        assert_eq!(find_header("DATE: 1 Jan 2001\n", "Date").as_deref(), Some("1 Jan 2001"));
    }

    #[test]
    fn test_find_header_requires_colon() {
        assert_eq!(find_header("Dateline: nope\n", "Date"), None);
    }

    #[test]
    fn test_find_header_unfolds() {
        let text = "Date: Wed, 4 Jul 2001\n\t10:22:33 -0700\nFrom: a@b.com\n";
        assert_eq!(
            find_header(text, "Date").as_deref(),
            Some("Wed, 4 Jul 2001 10:22:33 -0700")
        );
    }

    #[test]
    fn test_find_header_crlf() {
        let text = "Date: 1 Jan 2002 00:00:00 +0000\r\nSubject: x\r\n";
        assert_eq!(find_header(text, "date").as_deref(), Some("1 Jan 2002 00:00:00 +0000"));
    }

    #[test]
    fn test_extract_subject() {
        assert_eq!(
            extract_subject("From: a\nSubject: Hello\n\nbody").as_deref(),
            Some("Hello")
        );
        assert_eq!(extract_subject("From: a\n\nbody"), None);
        assert_eq!(extract_subject("Subject: \n"), None);
    }

    #[test]
    fn test_extract_subject_rejects_encoded_words() {
        assert_eq!(extract_subject("Subject: =?UTF-8?B?SG9sYQ==?=\n"), None);
        assert_eq!(extract_subject("Subject: Re: =?utf-8?q?caf=C3=A9?=\n"), None);
        assert_eq!(
            extract_subject("Subject: =?ISO-8859-1?Q?caf=E9?=\n").as_deref(),
            Some("=?ISO-8859-1?Q?caf=E9?=")
        );
    }

    #[test]
    fn test_decode_strips_bom() {
        let (text, enc) = decode_text_bytes(b"\xEF\xBB\xBFFrom a\n");
        assert_eq!(text, "From a\n");
        assert_eq!(enc, encoding_rs::UTF_8);
    }
}
