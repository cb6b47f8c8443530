//! Directory snapshots.

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::record::Record;

/// An ordered snapshot of directory records. Duplicate keys are allowed here;
/// the identity index decides which one wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Directory {
    records: Vec<Record>,
}

impl Directory {
    /// Create an empty directory.
    pub fn new() -> Directory {
        return Directory { records: Vec::new() };
    }

    /// Decode a directory from a JSON array of rows.
    pub fn from_json(json: &str) -> Result<Directory> {
        let value: Value = serde_json::from_str(json)?;
        return Directory::from_value(value);
    }

    /// Decode a directory from an already parsed JSON value.
    ///
    /// Fails before looking at any row if `value` is not an array, and
    /// reports the index of the first row that has no identity key or does
    /// not decode.
    pub fn from_value(value: Value) -> Result<Directory> {
        let rows = match value {
            Value::Array(rows) => rows,
            other => return Err(Error::NotASequence { found: kind_of(&other) }),
        };

        let mut records = Vec::with_capacity(rows.len());
        for (row, cells) in rows.into_iter().enumerate() {
            if lacks_key(&cells) {
                return Err(Error::MissingKey { row });
            }
            let record: Record = serde_json::from_value(cells)
                .map_err(|source| Error::MalformedRow { row, source })?;
            records.push(record);
        }
        return Ok(Directory { records });
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        return self.records.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.records.is_empty();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        return self.records.iter();
    }

    pub fn records(&self) -> &[Record] {
        return &self.records;
    }
}

/// A row whose identity key cell is absent or null.
fn lacks_key(cells: &Value) -> bool {
    return match cells {
        Value::Array(cells) => cells.get(1).is_none_or(Value::is_null),
        _ => false,
    };
}

fn kind_of(value: &Value) -> &'static str {
    return match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
}

impl From<Vec<Record>> for Directory {
    fn from(records: Vec<Record>) -> Directory {
        return Directory { records };
    }
}

impl FromIterator<Record> for Directory {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Directory {
        return Directory {
            records: iter.into_iter().collect(),
        };
    }
}

impl IntoIterator for Directory {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        return self.records.into_iter();
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        return self.records.iter();
    }
}
