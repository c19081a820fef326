//! Input records and the input contract.

use crate::error::{DeduceError, Result};
use crate::time::TimeBuckets;
use serde_json::{Map, Value};

/// One telemetry record: an opaque mapping of field name to JSON value.
///
/// The scanner extends each record in place with its derived calendar
/// buckets so that time-bucket accessors do not re-parse the timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Map<String, Value>,
    time_buckets: Option<TimeBuckets>,
}

impl Record {
    /// Wrap an already-validated field mapping.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            time_buckets: None,
        }
    }

    /// Convert a JSON value into a record, rejecting anything but an object.
    pub fn from_value(value: Value) -> std::result::Result<Self, Value> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(other),
        }
    }

    /// Look up a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Look up a top-level field that holds a mapping.
    pub fn object(&self, field: &str) -> Option<&Map<String, Value>> {
        self.fields.get(field).and_then(Value::as_object)
    }

    /// All top-level fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Derived calendar buckets, present once the record has been scanned.
    pub fn time_buckets(&self) -> Option<&TimeBuckets> {
        self.time_buckets.as_ref()
    }

    pub(crate) fn set_time_buckets(&mut self, buckets: TimeBuckets) {
        self.time_buckets = Some(buckets);
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validate a whole corpus and convert it into records.
///
/// The corpus must be a JSON array whose elements are all objects. This is
/// checked eagerly, before any record is scanned.
pub fn records_from_value(value: Value) -> Result<Vec<Record>> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DeduceError::InvalidInput(format!(
                "expected an array of records, found {}",
                json_type_name(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Record::from_value(item).map_err(|other| DeduceError::InvalidRecord {
                index,
                reason: format!("expected an object, found {}", json_type_name(&other)),
            })
        })
        .collect()
}

/// Parse a JSON document holding a corpus.
pub fn records_from_str(json: &str) -> Result<Vec<Record>> {
    let value: Value = serde_json::from_str(json)?;
    records_from_value(value)
}
