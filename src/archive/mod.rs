//! Archive processing: the directory walker and loose-message retouching.

pub mod retouch;
pub mod walker;

pub use walker::{ArchiveWalker, WalkSummary};
