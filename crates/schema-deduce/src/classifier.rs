//! Field classification.
//!
//! Top-level record fields are recognized purely by name. Each recognized
//! field has a fixed way of yielding dimensions or metric entries; anything
//! else is ignored.

use crate::types::DimensionCategory;
use serde_json::{Map, Value};

/// Fields holding scalar data-source tags.
pub const DATA_SOURCE_FIELDS: [&str; 3] = ["rep", "baseline", "produced_by"];

/// Semantic category of a top-level field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `location`: geo point, canonical key and categorical sub-keys
    Location,
    /// `system`, `activity`, `organization`: string sub-keys become dimensions
    Categorical(DimensionCategory),
    /// `time`: parsed into calendar buckets
    Time,
    /// `metrics`: list of `{name, units, value}` entries
    Metrics,
    /// `rep`, `baseline`, `produced_by`
    DataSource,
    Ignored,
}

impl FieldKind {
    /// Classify a top-level field by its name.
    pub fn classify(field: &str) -> Self {
        match field {
            "location" => Self::Location,
            "system" => Self::Categorical(DimensionCategory::System),
            "activity" => Self::Categorical(DimensionCategory::Activity),
            "organization" => Self::Categorical(DimensionCategory::Organization),
            "time" => Self::Time,
            "metrics" => Self::Metrics,
            f if DATA_SOURCE_FIELDS.contains(&f) => Self::DataSource,
            _ => Self::Ignored,
        }
    }
}

/// String-valued sub-keys of a mapping field. Other sub-values are skipped.
pub fn string_entries(map: &Map<String, Value>) -> impl Iterator<Item = (&str, &str)> {
    map.iter()
        .filter_map(|(key, value)| value.as_str().map(|s| (key.as_str(), s)))
}

/// Name and units of one entry of a `metrics` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricEntry<'a> {
    pub name: &'a str,
    pub units: Option<&'a str>,
}

/// Entries of a `metrics` field that carry a string `name`.
///
/// A `metrics` value that is not a list yields nothing.
pub fn metric_entries(value: &Value) -> Vec<MetricEntry<'_>> {
    value
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let name = entry.get("name")?.as_str()?;
                    let units = entry.get("units").and_then(Value::as_str);
                    Some(MetricEntry { name, units })
                })
                .collect()
        })
        .unwrap_or_default()
}
