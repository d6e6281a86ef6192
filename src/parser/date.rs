//! `Date:` header extraction and tolerant date parsing.
//!
//! Archived mail carries dates in many informal shapes: weekday prefixes with
//! and without commas, trailing `(PST)` annotations, the obsolete `UT` zone,
//! upper-case month names, missing seconds or offsets. Every expression goes
//! through [`normalize_date_expr`] before parsing and a failed parse is an
//! ordinary [`DateError`], never a panic.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::error::DateError;
use crate::parser::header;

/// Formats tried when the expression carries a numeric offset.
const OFFSET_FORMATS: [&str; 5] = [
    "%d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M %z",
    "%b %d %Y %H:%M:%S %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%z",
];

/// Formats tried for expressions without an offset; the result is taken as UTC.
const NAIVE_FORMATS: [&str; 9] = [
    "%d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M",
    "%b %d %H:%M:%S %Y",
    "%b %d %Y %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

const WEEKDAYS: [(&str, &str); 7] = [
    ("mon", "monday"),
    ("tue", "tuesday"),
    ("wed", "wednesday"),
    ("thu", "thursday"),
    ("fri", "friday"),
    ("sat", "saturday"),
    ("sun", "sunday"),
];

const NAMED_ZONES: [(&str, &str); 17] = [
    ("UT", "+0000"),
    ("UTC", "+0000"),
    ("GMT", "+0000"),
    ("Z", "+0000"),
    ("EST", "-0500"),
    ("EDT", "-0400"),
    ("CST", "-0600"),
    ("CDT", "-0500"),
    ("MST", "-0700"),
    ("MDT", "-0600"),
    ("PST", "-0800"),
    ("PDT", "-0700"),
    ("BST", "+0100"),
    ("CET", "+0100"),
    ("CEST", "+0200"),
    ("MET", "+0100"),
    ("JST", "+0900"),
];

/// Extract the authored date of a message.
///
/// The first line starting with `Date:` is used; see [`header::find_header`].
pub fn extract_date(text: &str) -> Result<DateTime<FixedOffset>, DateError> {
    let raw = header::find_header(text, "Date").ok_or(DateError::MissingHeader)?;
    parse_date(&raw).ok_or(DateError::Unparsable(raw))
}

/// Clean a raw `Date:` value: cut a parenthetical zone name, drop a trailing
/// ` UT`, and collapse runs of whitespace.
pub fn normalize_date_expr(raw: &str) -> String {
    let without_comment = raw.find('(').map_or(raw, |pos| &raw[..pos]);
    let trimmed = without_comment.trim();
    let trimmed = trimmed.strip_suffix(" UT").unwrap_or(trimmed);
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a raw `Date:` header value.
///
/// The wall-clock fields and offset written in the header are preserved;
/// expressions without an offset are read as UTC.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let cleaned = normalize_date_expr(raw);
    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        debug!(date = raw, "Date header has no digits");
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(&cleaned) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(dt);
    }

    let normalized = normalize_tokens(&replace_named_zone(strip_day_of_week(&cleaned)));

    for fmt in &OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }
    for fmt in &NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(Utc.from_utc_datetime(&ndt).fixed_offset());
        }
    }

    if let Some(dt) = mail_parser_date(&cleaned) {
        return Some(dt);
    }

    debug!(date = raw, "Could not parse date");
    None
}

/// Last resort: let `mail-parser` read the value as a `Date:` header.
fn mail_parser_date(input: &str) -> Option<DateTime<FixedOffset>> {
    use mail_parser::MessageParser;

    let fake_msg = format!("Date: {input}\n\n");
    let parsed = MessageParser::default().parse(fake_msg.as_bytes())?;
    let date = parsed.date()?;
    if !date.is_valid() {
        return None;
    }
    let dt = date.to_rfc3339();
    DateTime::parse_from_rfc3339(&dt).ok()
}

/// Drop a leading weekday token (`Wed,`, `wed`, `Wednesday,`, …).
fn strip_day_of_week(s: &str) -> &str {
    let end = s
        .find(|c: char| c == ',' || c.is_whitespace())
        .unwrap_or(s.len());
    let (token, rest) = s.split_at(end);
    if is_weekday(token) {
        rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace())
    } else {
        s
    }
}

fn is_weekday(token: &str) -> bool {
    let token = token.to_ascii_lowercase();
    WEEKDAYS
        .iter()
        .any(|(short, long)| token == *short || token == *long)
        || matches!(token.as_str(), "tues" | "thur" | "thurs")
}

/// Replace a trailing zone abbreviation with its numeric offset. A name that
/// follows a numeric offset (`+0000 GMT`) is dropped.
fn replace_named_zone(s: &str) -> String {
    let Some((head, last)) = s.rsplit_once(' ') else {
        return s.to_string();
    };
    let upper = last.to_ascii_uppercase();
    let Some((_, offset)) = NAMED_ZONES.iter().find(|(name, _)| *name == upper) else {
        return s.to_string();
    };

    let has_offset = head
        .rsplit(' ')
        .next()
        .is_some_and(|prev| prev.starts_with(['+', '-']) && prev[1..].chars().all(|c| c.is_ascii_digit()));
    if has_offset {
        head.to_string()
    } else {
        format!("{head} {offset}")
    }
}

/// Turn `16-JUL-2025` into `16 Jul 2025` and title-case alphabetic tokens so
/// `JUL`, `jul` and `Jul` all parse as the same month.
fn normalize_tokens(s: &str) -> String {
    s.split(' ')
        .map(|token| {
            let parts: Vec<&str> = token.split('-').collect();
            if parts.len() == 3
                && parts[0].chars().all(|c| c.is_ascii_digit())
                && parts[1].chars().all(|c| c.is_ascii_alphabetic())
                && !parts[1].is_empty()
            {
                format!("{} {} {}", parts[0], title_case(parts[1]), parts[2])
            } else if token.len() >= 3 && token.chars().all(|c| c.is_ascii_alphabetic()) {
                title_case(token)
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}
