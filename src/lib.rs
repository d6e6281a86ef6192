//! `emlstamp` — date-stamp legacy email archives.
//!
//! The library finds the authored date of every message in a directory tree,
//! renames loose `.eml` files with a sortable date prefix, sets their file
//! times, and splits `.mbox` mailboxes into one `.eml` file per message filed
//! under per-year folders.

pub mod archive;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod sink;
pub mod store;
