//! Filter widget recommendations.

use super::compose_title;
use crate::config::DeduceConfig;
use crate::reducer::ValueAccessor;
use crate::registry::Registry;
use crate::types::{Dimension, Envelope, FilterKind, FilterRecommendation};
use tracing::debug;

/// Proposes one filter widget per (dimension, co-occurring metric).
pub struct FilterRecommender<'a> {
    config: &'a DeduceConfig,
}

impl<'a> FilterRecommender<'a> {
    pub fn new(config: &'a DeduceConfig) -> Self {
        Self { config }
    }

    /// Widget for a dimension, or `None` when it cannot discriminate.
    ///
    /// Time dimensions are charted rather than filtered, and a dimension
    /// with a single observed value filters nothing.
    pub fn widget_for(&self, dimension: &Dimension) -> Option<FilterKind> {
        if dimension.is_time() || dimension.cardinality() <= 1 {
            return None;
        }
        Some(if dimension.is_geo() {
            FilterKind::Geo
        } else if dimension.cardinality() > self.config.row_filter_threshold {
            FilterKind::Row
        } else {
            FilterKind::Pie
        })
    }

    pub fn recommend(&self, registry: &Registry) -> Vec<FilterRecommendation> {
        let mut filters = Vec::new();

        for dimension in registry.dimensions().values() {
            let Some(kind) = self.widget_for(dimension) else {
                continue;
            };
            for group in dimension
                .metrics
                .iter()
                .filter_map(|key| registry.groups().get(key))
            {
                filters.push(FilterRecommendation {
                    kind,
                    envelope: Envelope {
                        dimension: dimension.key.clone(),
                        groups: vec![group.key.clone()],
                        default_group_accessor: ValueAccessor::Sum,
                        title: compose_title(&group.title, &[&dimension.title]),
                    },
                });
            }
        }

        debug!("Recommended {} filter(s)", filters.len());
        filters
    }
}
