//! Deduplicating CSV persistence
//!
//! The output artifact is rewritten in full after every page. Exact duplicate
//! rows collapse on merge and the most recently written copy wins.

pub mod dataset;
pub mod incremental;
pub mod record;

pub use dataset::{Dataset, merge};
pub use incremental::{DedupMode, DedupReport, IncrementalStore, MergeOutcome, deduplicate};
pub use record::{Record, Schema};
