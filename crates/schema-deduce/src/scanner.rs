//! The corpus scan.
//!
//! Each record is handled in two phases. The first classifies every field and
//! collects the dimension keys and group keys the record touches. The second
//! links all of those dimensions with all of those groups. Field order within
//! a record therefore has no influence on co-occurrence.

use crate::accessor::{Accessor, AccessorValue};
use crate::classifier::{FieldKind, metric_entries, string_entries};
use crate::config::DeduceConfig;
use crate::error::{DeduceError, Result};
use crate::geo;
use crate::record::Record;
use crate::registry::{POSITION_KEY, Registry};
use crate::time::{TimeBucket, TimeBuckets, parse_timestamp};
use crate::types::DimensionCategory;
use crate::utils::scalar_label;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Counters collected while scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub records: usize,
    pub records_with_time: usize,
    pub unparseable_timestamps: usize,
    pub records_with_geo: usize,
    pub ignored_fields: usize,
}

/// Keys touched by one record.
#[derive(Debug, Default)]
struct Touched {
    dimensions: BTreeSet<String>,
    groups: BTreeSet<String>,
}

/// Scans records into a [`Registry`].
pub struct Scanner<'a> {
    config: &'a DeduceConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a DeduceConfig) -> Self {
        Self { config }
    }

    /// Scan every record once, in order.
    ///
    /// Records are extended in place with their derived time buckets.
    pub fn scan(&self, records: &mut [Record], registry: &mut Registry) -> Result<ScanStats> {
        let mut stats = ScanStats::default();

        for (index, record) in records.iter_mut().enumerate() {
            self.scan_record(index, record, registry, &mut stats)?;
        }

        if stats.unparseable_timestamps > 0 {
            warn!(
                "{} record(s) carried an unparseable timestamp and contribute no time data",
                stats.unparseable_timestamps
            );
        }
        debug!("Scan finished: {:?}", stats);
        Ok(stats)
    }

    fn scan_record(
        &self,
        index: usize,
        record: &mut Record,
        registry: &mut Registry,
        stats: &mut ScanStats,
    ) -> Result<()> {
        stats.records += 1;
        let mut touched = Touched::default();
        let mut buckets = None;

        for (field, value) in record.fields() {
            match FieldKind::classify(field) {
                FieldKind::Location => {
                    if let Some(location) = value.as_object()
                        && self.scan_location(location, registry, &mut touched)
                    {
                        stats.records_with_geo += 1;
                    }
                }
                FieldKind::Categorical(category) => {
                    if let Some(map) = value.as_object() {
                        for (key, label) in string_entries(map) {
                            registry.observe(
                                key,
                                category,
                                || Accessor::field_path(field, key),
                                label,
                            );
                            touched.dimensions.insert(key.to_string());
                        }
                    }
                }
                FieldKind::Time => {
                    registry.ensure_time_dimensions(self.config.week_start);
                    match parse_timestamp(value)
                        .and_then(|ts| TimeBuckets::derive(ts, self.config.week_start))
                    {
                        Some(derived) => {
                            self.scan_time(&derived, registry, &mut touched);
                            stats.records_with_time += 1;
                            buckets = Some(derived);
                        }
                        None if self.config.strict_timestamps => {
                            return Err(DeduceError::InvalidTimestamp {
                                index,
                                value: value.to_string(),
                            });
                        }
                        None => {
                            debug!("Record {}: unparseable timestamp {}", index, value);
                            stats.unparseable_timestamps += 1;
                        }
                    }
                }
                FieldKind::Metrics => {
                    for entry in metric_entries(value) {
                        if let Some(key) = registry.touch_group(entry.name, entry.units) {
                            touched.groups.insert(key);
                        }
                    }
                }
                FieldKind::DataSource => {
                    if let Some(label) = scalar_label(value) {
                        registry.observe(
                            field,
                            DimensionCategory::DataSource,
                            || Accessor::scalar(field),
                            label,
                        );
                        touched.dimensions.insert(field.clone());
                    }
                }
                FieldKind::Ignored => stats.ignored_fields += 1,
            }
        }

        if let Some(derived) = buckets {
            record.set_time_buckets(derived);
        }
        registry.cross_link(&touched.dimensions, &touched.groups);
        Ok(())
    }

    /// Returns true when the location yielded a geo point.
    fn scan_location(
        &self,
        location: &Map<String, Value>,
        registry: &mut Registry,
        touched: &mut Touched,
    ) -> bool {
        if self.config.location_dimensions {
            for (key, label) in string_entries(location) {
                registry.observe(
                    key,
                    DimensionCategory::Location,
                    || Accessor::field_path("location", key),
                    label,
                );
                touched.dimensions.insert(key.to_string());
            }
        }

        let Some(point) = geo::extract_point(location) else {
            return false;
        };
        let Some(key) = geo::canonical_key(location) else {
            return false;
        };
        registry.observe_location(&key, point);
        touched.dimensions.insert(POSITION_KEY.to_string());
        true
    }

    fn scan_time(&self, derived: &TimeBuckets, registry: &mut Registry, touched: &mut Touched) {
        registry.time_range.extend(derived.timestamp);
        let week_start = self.config.week_start;
        for bucket in TimeBucket::ALL {
            let label = AccessorValue::Instant(derived.get(bucket)).label();
            registry.observe(
                bucket.key(),
                DimensionCategory::Time,
                || Accessor::TimeBucket { bucket, week_start },
                label,
            );
            touched.dimensions.insert(bucket.key().to_string());
        }
    }
}
