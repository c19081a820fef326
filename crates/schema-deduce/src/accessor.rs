//! Value extraction strategies for dimensions and metric groups.
//!
//! An [`Accessor`] is plain data describing where a value lives in a record.
//! [`Accessor::extract`] interprets it. Extraction never fails: anything
//! missing or of the wrong shape comes back as [`AccessorValue::Absent`].

use crate::config::WeekStart;
use crate::geo;
use crate::record::Record;
use crate::time::{TimeBucket, parse_timestamp};
use crate::utils::{ABSENT_LABEL, scalar_label};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Where a dimension or metric value is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Accessor {
    /// String value at `record[field][key]`.
    FieldPath { field: String, key: String },
    /// Scalar value at `record[field]`.
    Scalar { field: String },
    /// Calendar bucket of `record.time`.
    TimeBucket {
        bucket: TimeBucket,
        week_start: WeekStart,
    },
    /// Canonical key of `record.location`.
    LocationKey,
    /// Numeric `value` of the metric entry with exactly this `name`.
    Metric { name: String },
}

/// A value read from a record.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessorValue {
    Text(String),
    Instant(DateTime<Utc>),
    Number(f64),
    Absent,
}

impl AccessorValue {
    /// Render the value as a dimension label. Absent values render as `NA`.
    pub fn label(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Instant(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
            Self::Number(n) => n.to_string(),
            Self::Absent => ABSENT_LABEL.to_string(),
        }
    }

    /// Numeric content, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl Accessor {
    pub fn field_path(field: impl Into<String>, key: impl Into<String>) -> Self {
        Self::FieldPath {
            field: field.into(),
            key: key.into(),
        }
    }

    pub fn scalar(field: impl Into<String>) -> Self {
        Self::Scalar {
            field: field.into(),
        }
    }

    pub fn metric(name: impl Into<String>) -> Self {
        Self::Metric { name: name.into() }
    }

    /// Read this accessor's value from a record.
    pub fn extract(&self, record: &Record) -> AccessorValue {
        let value = match self {
            Self::FieldPath { field, key } => record
                .object(field)
                .and_then(|map| map.get(key))
                .and_then(Value::as_str)
                .map(|s| AccessorValue::Text(s.to_string())),
            Self::Scalar { field } => record
                .get(field)
                .and_then(scalar_label)
                .map(AccessorValue::Text),
            Self::TimeBucket { bucket, week_start } => {
                bucket_instant(record, *bucket, *week_start).map(AccessorValue::Instant)
            }
            Self::LocationKey => record
                .object("location")
                .and_then(geo::canonical_key)
                .map(AccessorValue::Text),
            Self::Metric { name } => metric_value(record, name).map(AccessorValue::Number),
        };
        value.unwrap_or(AccessorValue::Absent)
    }

    /// Read this accessor's value as a label.
    pub fn label(&self, record: &Record) -> String {
        self.extract(record).label()
    }

    /// Read this accessor's value as a number. Absent and non-numeric values
    /// are `None`, which is distinct from a recorded zero.
    pub fn number(&self, record: &Record) -> Option<f64> {
        self.extract(record).as_number()
    }
}

fn bucket_instant(
    record: &Record,
    bucket: TimeBucket,
    week_start: WeekStart,
) -> Option<DateTime<Utc>> {
    if let Some(buckets) = record.time_buckets() {
        return Some(buckets.get(bucket));
    }
    let ts = parse_timestamp(record.get("time")?)?;
    bucket.truncate(ts, week_start)
}

fn metric_value(record: &Record, name: &str) -> Option<f64> {
    record
        .get("metrics")?
        .as_array()?
        .iter()
        .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))?
        .get("value")?
        .as_f64()
}
