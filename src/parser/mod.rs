//! Message parsing: `Date:` extraction, header lookup, `.eml` loading and MBOX splitting.

pub mod date;
pub mod eml;
pub mod header;
pub mod mbox;
