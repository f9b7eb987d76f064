use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A single row: an ordered mapping from field name to scalar/JSON value.
///
/// `BTreeMap` gives deterministic field iteration order, which matters for
/// the determinism property in the testable-properties list (byte-identical
/// output for pure nodes given identical input).
pub type Record = BTreeMap<String, Json>;

/// What a node publishes into the node output map: either one record or a
/// sequence of records. This is the Rust rendering of the source's
/// "node output map vs pointer graph" design note - a plain tagged value,
/// not a second "edge with handle" abstraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Record(Record),
    Records(Vec<Record>),
}

impl Value {
    /// Views this value as a slice of records, whether it was published as
    /// one record or many. Most row-shape handlers want this view.
    pub fn as_records(&self) -> Vec<&Record> {
        match self {
            Value::Record(r) => vec![r],
            Value::Records(rs) => rs.iter().collect(),
        }
    }

    pub fn into_records(self) -> Vec<Record> {
        match self {
            Value::Record(r) => vec![r],
            Value::Records(rs) => rs,
        }
    }

    pub fn empty_records() -> Value {
        Value::Records(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            Value::Record(_) => 1,
            Value::Records(rs) => rs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Vec<Record>> for Value {
    fn from(rs: Vec<Record>) -> Self {
        Value::Records(rs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_records_normalizes_single_record() {
        let mut rec = Record::new();
        rec.insert("a".to_string(), Json::from(1));
        let v = Value::Record(rec);
        assert_eq!(v.as_records().len(), 1);
    }

    #[test]
    fn empty_records_has_zero_len() {
        assert!(Value::empty_records().is_empty());
    }
}
