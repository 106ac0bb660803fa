//! Dataset analysis.
//!
//! Merging per-anchor results into one dataset and deciding whether an
//! existing dataset can be reused.

pub mod freshness;
pub mod merge;

pub use freshness::{check_freshness, Freshness, StaleReason};
pub use merge::{merge_anchor_batches, MergeOutcome};
