//! Chart recommendations: a time-series pass followed by a cross-tabulation pass.

use super::compose_title;
use crate::config::DeduceConfig;
use crate::reducer::ValueAccessor;
use crate::registry::Registry;
use crate::time::TimeBucket;
use crate::types::{Chart, Dimension, Envelope, Group, SubSeries};
use crate::utils::slugify;
use std::collections::BTreeSet;
use tracing::debug;

pub struct ChartRecommender<'a> {
    config: &'a DeduceConfig,
}

impl<'a> ChartRecommender<'a> {
    pub fn new(config: &'a DeduceConfig) -> Self {
        Self { config }
    }

    /// All chart recommendations, time-series charts first.
    pub fn recommend(&self, registry: &Registry) -> Vec<Chart> {
        let mut charts = self.time_series(registry);
        charts.extend(self.cross_tabulations(registry));
        debug!("Recommended {} chart(s)", charts.len());
        charts
    }

    /// Candle, line and sand charts over the native time bucket.
    ///
    /// Nothing is produced when the corpus spans less than 12 hours or has
    /// no time data at all.
    pub fn time_series(&self, registry: &Registry) -> Vec<Chart> {
        let Some(bucket) = registry
            .time_range()
            .span()
            .and_then(TimeBucket::native_for_span)
        else {
            return Vec::new();
        };
        let Some(time_dim) = registry.dimensions().get(bucket.key()) else {
            return Vec::new();
        };
        debug!("Native time granularity: {}", bucket.key());

        let groups = linked_groups(time_dim, registry);
        let mut charts = Vec::new();
        let mut seen_units = BTreeSet::new();

        for group in &groups {
            charts.push(Chart::Candle {
                envelope: Envelope {
                    dimension: time_dim.key.clone(),
                    groups: vec![group.key.clone()],
                    default_group_accessor: ValueAccessor::Values,
                    title: compose_title(&group.title, &[&time_dim.title]),
                },
            });

            if let Some(units) = &group.units
                && seen_units.insert(units.as_str())
            {
                let same_units: Vec<&Group> = groups
                    .iter()
                    .copied()
                    .filter(|g| g.units.as_deref() == Some(units.as_str()))
                    .collect();
                if same_units.len() >= 2 {
                    let titles: Vec<&str> = same_units.iter().map(|g| g.title.as_str()).collect();
                    charts.push(Chart::Line {
                        envelope: Envelope {
                            dimension: time_dim.key.clone(),
                            groups: same_units.iter().map(|g| g.key.clone()).collect(),
                            default_group_accessor: ValueAccessor::Average,
                            title: compose_title(&titles.join(", "), &[&time_dim.title]),
                        },
                        units: units.clone(),
                    });
                }
            }
        }

        for group in &groups {
            for split in registry.splitting_dimensions(self.config.min_split_cardinality) {
                if !split.metrics.contains(&group.key) {
                    continue;
                }
                charts.push(Chart::Sand {
                    envelope: Envelope {
                        dimension: time_dim.key.clone(),
                        groups: vec![group.key.clone()],
                        default_group_accessor: ValueAccessor::Sum,
                        title: compose_title(&group.title, &[&time_dim.title, &split.title]),
                    },
                    split_dimension: split.key.clone(),
                    series: sub_series(group, split),
                });
            }
        }

        charts
    }

    /// Bar charts of one categorical dimension split by another of a
    /// different category.
    pub fn cross_tabulations(&self, registry: &Registry) -> Vec<Chart> {
        let min = self.config.min_split_cardinality;
        let max = self.config.max_crosstab_cardinality;
        let mut charts = Vec::new();

        let primaries = registry
            .dimensions()
            .values()
            .filter(|dim| dim.is_categorical() && (min..=max).contains(&dim.cardinality()));

        for primary in primaries {
            for group in linked_groups(primary, registry) {
                for split in registry.splitting_dimensions(min) {
                    if split.key == primary.key
                        || split.category == primary.category
                        || !split.metrics.contains(&group.key)
                    {
                        continue;
                    }
                    charts.push(Chart::Bar {
                        envelope: Envelope {
                            dimension: primary.key.clone(),
                            groups: vec![group.key.clone()],
                            default_group_accessor: ValueAccessor::Sum,
                            title: compose_title(&group.title, &[&primary.title, &split.title]),
                        },
                        split_dimension: split.key.clone(),
                        series: sub_series(group, split),
                    });
                }
            }
        }

        charts
    }
}

/// Groups co-occurring with a dimension, in key order.
fn linked_groups<'r>(dimension: &Dimension, registry: &'r Registry) -> Vec<&'r Group> {
    dimension
        .metrics
        .iter()
        .filter_map(|key| registry.groups().get(key))
        .collect()
}

/// One reducer per value of `split`, each filtered to that value.
fn sub_series(group: &Group, split: &Dimension) -> Vec<SubSeries> {
    split
        .values
        .iter()
        .map(|value| SubSeries {
            key: slugify(&format!("{}-{}", value, group.key)),
            label: value.clone(),
            reducer: group
                .reducer
                .clone()
                .filtered_by(split.accessor.clone(), value.clone()),
        })
        .collect()
}
