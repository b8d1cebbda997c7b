//! Field extraction and row alignment
//!
//! - [`rule`]: declarative [`ExtractionRule`] tables
//! - [`parser`]: [`PageParser`], one value list per rule from a page snapshot
//! - [`align`]: [`RowAligner`], ragged value lists to row-aligned records
//! - [`presets`]: built-in rule tables

pub mod align;
pub mod parser;
pub mod presets;
pub mod rule;

pub use align::RowAligner;
pub use parser::{ExtractedFields, FieldExtractionResult, PageParser};
pub use rule::{AlignmentPolicy, ExtractionRule, OnMissing, RowScope, RuleSet, TextTransform, ValueFilter, ValueSource};
