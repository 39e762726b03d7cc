use std::collections::HashMap;

use crate::env::{Dataset, RecNo};
use crate::types::Value;

use super::cond::Cond;

/// One record: attribute (unit) names mapped to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: HashMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value.
    #[must_use]
    pub fn set(mut self, unit: &str, value: impl Into<Value>) -> Self {
        self.insert(unit, value.into());
        self
    }

    pub fn insert(&mut self, unit: &str, value: Value) {
        self.data.insert(unit.to_owned(), value);
    }

    #[must_use]
    pub fn get(&self, unit: &str) -> Option<&Value> {
        self.data.get(unit)
    }
}

/// In-memory dataset. A record's number is its position in the set.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    #[must_use]
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, rec_no: RecNo) -> Option<&Record> {
        self.records.get(rec_no)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Dataset<Cond> for RecordSet {
    fn total_count(&self, cond: &Cond) -> usize {
        self.records.iter().filter(|rec| cond.matches(rec)).count()
    }

    fn rec_seq(&self, cond: &Cond, limit: usize) -> Vec<RecNo> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, rec)| cond.matches(rec))
            .map(|(no, _)| no)
            .take(limit)
            .collect()
    }
}
