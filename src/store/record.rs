use crate::error::{HarvestError, Result};
use std::sync::Arc;

/// Ordered column names shared by every record of one dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Schema(Arc<Vec<String>>);

impl Schema {
    pub fn new(columns: Vec<String>) -> Self {
        Self(Arc::new(columns))
    }

    pub fn columns(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.0.iter().position(|c| c == column)
    }

    /// Build a record, checking that there is exactly one value per column
    pub fn record(&self, values: Vec<String>) -> Result<Record> {
        if values.len() != self.len() {
            return Err(HarvestError::RecordArity { expected: self.len(), found: values.len() });
        }
        Ok(Record::new_unchecked(self.clone(), values))
    }
}

/// One row: a single string value per schema column. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    schema: Schema,
    values: Vec<String>,
}

impl Record {
    pub(crate) fn new_unchecked(schema: Schema, values: Vec<String>) -> Self {
        debug_assert_eq!(schema.len(), values.len());
        Self { schema, values }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema.index_of(column).and_then(|i| self.values.get(i)).map(String::as_str)
    }

    /// Values in column order
    pub fn values(&self) -> &[String] {
        &self.values
    }
}
