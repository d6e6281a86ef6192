//! Output side: file naming policy and writing dated `.eml` files.

pub mod eml;
pub mod naming;
