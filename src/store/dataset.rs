use crate::store::record::{Record, Schema};
use std::collections::HashMap;

/// Records under one schema; unique unless built with [`Dataset::from_raw`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    schema: Schema,
    records: Vec<Record>,
}

impl Dataset {
    pub fn empty(schema: Schema) -> Self {
        Self { schema, records: Vec::new() }
    }

    /// Build a dataset, collapsing exact duplicates
    pub fn from_records(schema: Schema, records: Vec<Record>) -> Self {
        Self { schema, records: dedup_keep_last(records) }
    }

    /// Keep records exactly as given, duplicates included
    pub(crate) fn from_raw(schema: Schema, records: Vec<Record>) -> Self {
        Self { schema, records }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }
}

/// Concatenate `existing` and `new_records`, then drop exact duplicate rows.
///
/// Of each group of identical rows only the last one survives, at its own
/// position; rows differing in any field are all kept.
pub fn merge(existing: &Dataset, new_records: &[Record]) -> Dataset {
    let combined: Vec<Record> = existing.records.iter().chain(new_records).cloned().collect();
    Dataset { schema: existing.schema.clone(), records: dedup_keep_last(combined) }
}

pub(crate) fn dedup_keep_last(records: Vec<Record>) -> Vec<Record> {
    let mut last_seen: HashMap<&Record, usize> = HashMap::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        last_seen.insert(record, i);
    }

    let keep: Vec<bool> = records.iter().enumerate().map(|(i, r)| last_seen.get(r) == Some(&i)).collect();
    drop(last_seen);

    records.into_iter().zip(keep).filter_map(|(record, keep)| keep.then_some(record)).collect()
}
