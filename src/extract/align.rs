//! Row alignment
//!
//! Every field of a page is extracted independently, so the lists disagree in
//! length whenever a row lacks an optional element. Alignment is purely positional:
//! row `i` takes index `i` of every list after padding. Nothing ties a value to the
//! row node it came from, so a missing value in the middle of a list shifts the
//! rest of that column up by one. Row-scoped rule sets avoid that by construction.

use crate::extract::parser::{ExtractedFields, FieldExtractionResult};
use crate::extract::rule::{AlignmentPolicy, RuleSet};
use crate::store::{Record, Schema};

/// Keep items `offset, offset + stride, offset + 2 * stride, ...`
///
/// A stride of zero selects nothing.
pub fn strided<T>(items: impl IntoIterator<Item = T>, stride: usize, offset: usize) -> Vec<T> {
    if stride == 0 {
        return Vec::new();
    }
    items.into_iter().skip(offset).step_by(stride).collect()
}

/// Split a combined value into its first whitespace-delimited token and the remainder
pub fn split_pair(value: &str) -> (String, String) {
    let trimmed = value.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim_start().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Split every value, keeping both halves of one source item on the same index
pub fn split_pairs(values: &[String]) -> (Vec<String>, Vec<String>) {
    values.iter().map(|v| split_pair(v)).unzip()
}

/// Right-pad with `sentinel` up to `target`; never truncates
pub fn pad_to(mut values: Vec<String>, target: usize, sentinel: &str) -> Vec<String> {
    if values.len() < target {
        values.resize(target, sentinel.to_string());
    }
    values
}

/// What one rule contributes to a row
enum FieldPlan {
    Single { field: String, default: String },
    Pair { field: String, default: String },
}

/// Reconciles a page's ragged field lists into row-aligned records
pub struct RowAligner {
    schema: Schema,
    plans: Vec<FieldPlan>,
}

impl RowAligner {
    pub fn new(rule_set: &RuleSet) -> Self {
        let plans = rule_set
            .rules
            .iter()
            .map(|rule| match &rule.policy {
                AlignmentPolicy::PairedSplit { .. } => {
                    FieldPlan::Pair { field: rule.field.clone(), default: rule.default.clone() }
                }
                _ => FieldPlan::Single { field: rule.field.clone(), default: rule.default.clone() },
            })
            .collect();

        Self { schema: Schema::new(rule_set.columns()), plans }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Align one page's fields into records.
    ///
    /// Produces exactly as many records as the longest column list.
    pub fn align(&self, fields: &ExtractedFields) -> Vec<Record> {
        let mut lists: Vec<(Vec<String>, &str)> = Vec::with_capacity(self.schema.len());

        for plan in &self.plans {
            match plan {
                FieldPlan::Single { field, default } => {
                    let values = source(fields, field).map(|r| r.values.clone()).unwrap_or_default();
                    lists.push((values, default.as_str()));
                }
                FieldPlan::Pair { field, default } => {
                    let (firsts, seconds) = source(fields, field).map(|r| split_source(r, default)).unwrap_or_default();
                    lists.push((firsts, default.as_str()));
                    lists.push((seconds, default.as_str()));
                }
            }
        }

        let target = lists.iter().map(|(list, _)| list.len()).max().unwrap_or(0);

        let columns: Vec<Vec<String>> = lists
            .into_iter()
            .zip(self.schema.columns())
            .map(|((list, default), name)| {
                if list.len() < target {
                    log::warn!("Column '{}': {} of {} values, padding with {:?}", name, list.len(), target, default);
                }
                pad_to(list, target, default)
            })
            .collect();

        (0..target)
            .map(|row| Record::new_unchecked(self.schema.clone(), columns.iter().map(|c| c[row].clone()).collect()))
            .collect()
    }
}

fn source<'a>(fields: &'a ExtractedFields, field: &str) -> Option<&'a FieldExtractionResult> {
    let result = fields.get(field);
    if result.is_none() {
        log::warn!("No values extracted for field '{}'", field);
    }
    result
}

/// Like [`split_pairs`], but a substituted default fills both halves as padding would
fn split_source(result: &FieldExtractionResult, default: &str) -> (Vec<String>, Vec<String>) {
    result
        .values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            if result.is_defaulted(i) {
                (default.to_string(), default.to_string())
            } else {
                split_pair(value)
            }
        })
        .unzip()
}
