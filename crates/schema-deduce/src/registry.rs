//! Accumulating tables of dimensions, metric groups and locations.
//!
//! Keys are unique within each table. Touching an existing key never
//! replaces the entry: the first writer fixes its category and accessor,
//! later sightings only add values and co-occurrences.

use crate::accessor::Accessor;
use crate::config::WeekStart;
use crate::geo::GeoPoint;
use crate::time::{TimeBucket, TimeRange};
use crate::types::{Dimension, DimensionCategory, Group};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Key of the dimension holding canonical location keys.
pub const POSITION_KEY: &str = "position";

/// Mutable state shared by every phase of a deduction run.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub(crate) dimensions: BTreeMap<String, Dimension>,
    pub(crate) groups: BTreeMap<String, Group>,
    pub(crate) locations: BTreeMap<String, GeoPoint>,
    pub(crate) time_range: TimeRange,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dimensions(&self) -> &BTreeMap<String, Dimension> {
        &self.dimensions
    }

    pub fn groups(&self) -> &BTreeMap<String, Group> {
        &self.groups
    }

    pub fn locations(&self) -> &BTreeMap<String, GeoPoint> {
        &self.locations
    }

    pub fn time_range(&self) -> &TimeRange {
        &self.time_range
    }

    /// Get or create the dimension for `key`.
    pub fn touch_dimension(
        &mut self,
        key: &str,
        category: DimensionCategory,
        accessor: impl FnOnce() -> Accessor,
    ) -> &mut Dimension {
        self.dimensions.entry(key.to_string()).or_insert_with(|| {
            debug!("New {:?} dimension '{}'", category, key);
            Dimension::new(key, category, accessor())
        })
    }

    /// Record a value observed for a dimension, creating it if needed.
    pub fn observe(
        &mut self,
        key: &str,
        category: DimensionCategory,
        accessor: impl FnOnce() -> Accessor,
        value: impl Into<String>,
    ) {
        self.touch_dimension(key, category, accessor)
            .values
            .insert(value.into());
    }

    /// Create the five time-bucket dimensions the first time they are needed.
    pub fn ensure_time_dimensions(&mut self, week_start: WeekStart) {
        if self.dimensions.contains_key(TimeBucket::Year.key()) {
            return;
        }
        for bucket in TimeBucket::ALL {
            self.touch_dimension(bucket.key(), DimensionCategory::Time, || {
                Accessor::TimeBucket { bucket, week_start }
            });
        }
    }

    /// Record a geo point under its canonical key and in the position dimension.
    ///
    /// The first point seen for a key is kept.
    pub fn observe_location(&mut self, key: &str, point: GeoPoint) {
        self.locations.entry(key.to_string()).or_insert(point);
        self.observe(POSITION_KEY, DimensionCategory::Geo, || Accessor::LocationKey, key);
    }

    /// Get or create the group for a metric name; returns its key.
    pub fn touch_group(&mut self, name: &str, units: Option<&str>) -> Option<String> {
        let candidate = Group::new(name, units.map(str::to_string))?;
        let key = candidate.key.clone();
        self.groups.entry(key.clone()).or_insert_with(|| {
            debug!("New metric group '{}' ({})", key, name);
            candidate
        });
        Some(key)
    }

    /// Link every dimension in `dimensions` with every group in `groups`,
    /// in both directions.
    pub fn cross_link(&mut self, dimensions: &BTreeSet<String>, groups: &BTreeSet<String>) {
        for dim_key in dimensions {
            if let Some(dimension) = self.dimensions.get_mut(dim_key) {
                dimension.metrics.extend(groups.iter().cloned());
            }
        }
        for group_key in groups {
            if let Some(group) = self.groups.get_mut(group_key) {
                group.dimensions.extend(dimensions.iter().cloned());
            }
        }
    }

    /// Dimensions that may split a metric: categorical, with at least
    /// `min_values` distinct values.
    pub(crate) fn splitting_dimensions(
        &self,
        min_values: usize,
    ) -> impl Iterator<Item = &Dimension> {
        self.dimensions
            .values()
            .filter(move |dim| dim.is_categorical() && dim.cardinality() >= min_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_touch_dimension_first_writer_wins() {
        let mut registry = Registry::new();
        registry.observe(
            "name",
            DimensionCategory::System,
            || Accessor::field_path("system", "name"),
            "alpha",
        );
        registry.observe(
            "name",
            DimensionCategory::Activity,
            || Accessor::field_path("activity", "name"),
            "beta",
        );

        assert_eq!(registry.dimensions().len(), 1);
        let dim = &registry.dimensions()["name"];
        assert_eq!(dim.category, DimensionCategory::System);
        assert_eq!(dim.accessor, Accessor::field_path("system", "name"));
        assert_eq!(dim.values, set(&["alpha", "beta"]));
    }

    #[test]
    fn test_ensure_time_dimensions_once() {
        let mut registry = Registry::new();
        registry.ensure_time_dimensions(WeekStart::Monday);
        registry.dimensions.get_mut("week").unwrap().values.insert("w".to_string());
        registry.ensure_time_dimensions(WeekStart::Sunday);

        assert_eq!(registry.dimensions().len(), 5);
        let week = &registry.dimensions()["week"];
        assert_eq!(week.values.len(), 1);
        assert_eq!(
            week.accessor,
            Accessor::TimeBucket {
                bucket: TimeBucket::Week,
                week_start: WeekStart::Monday
            }
        );
    }

    #[test]
    fn test_touch_group_dedupes_by_slug() {
        let mut registry = Registry::new();
        let a = registry.touch_group("Temp", Some("C"));
        let b = registry.touch_group("temp", Some("F"));

        assert_eq!(a, Some("temp".to_string()));
        assert_eq!(b, Some("temp".to_string()));
        assert_eq!(registry.groups().len(), 1);
        assert_eq!(registry.groups()["temp"].units.as_deref(), Some("C"));
        assert_eq!(registry.touch_group("%%", None), None);
    }

    #[test]
    fn test_cross_link_is_symmetric() {
        let mut registry = Registry::new();
        registry.observe(
            "region",
            DimensionCategory::System,
            || Accessor::field_path("system", "region"),
            "east",
        );
        registry.observe("rep", DimensionCategory::DataSource, || Accessor::scalar("rep"), "1");
        registry.touch_group("Temp", Some("C"));
        registry.touch_group("Load", Some("%"));

        registry.cross_link(&set(&["region", "rep"]), &set(&["temp", "load"]));

        for dim in registry.dimensions().values() {
            assert_eq!(dim.metrics, set(&["load", "temp"]));
        }
        for group in registry.groups().values() {
            assert_eq!(group.dimensions, set(&["region", "rep"]));
        }
    }

    #[test]
    fn test_observe_location_keeps_first_point() {
        let mut registry = Registry::new();
        registry.observe_location("site-A", GeoPoint { lat: 10.0, lon: 20.0 });
        registry.observe_location("site-A", GeoPoint { lat: 11.0, lon: 21.0 });

        assert_eq!(registry.locations()["site-A"], GeoPoint { lat: 10.0, lon: 20.0 });
        let position = &registry.dimensions()[POSITION_KEY];
        assert_eq!(position.category, DimensionCategory::Geo);
        assert_eq!(position.values, set(&["site-A"]));
    }
}
