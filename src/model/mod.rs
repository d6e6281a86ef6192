//! Core data model types: decoded mailbox text, messages, and archive entries.

pub mod entry;
pub mod message;
