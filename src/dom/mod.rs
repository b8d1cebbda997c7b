//! Page snapshots
//!
//! A [`DomSnapshot`] is the parsed markup of one rendered page; a [`Page`] pairs it
//! with its ordinal in the paginated list. Both are transient and dropped once the
//! page's rows have been persisted.

pub mod snapshot;

pub use snapshot::{DomSnapshot, Page};
