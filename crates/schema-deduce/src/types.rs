use crate::accessor::Accessor;
use crate::error::{DeduceError, Result};
use crate::geo::GeoPoint;
use crate::record::Record;
use crate::reducer::{ReducerSpec, Reduction, ReductionEngine, ValueAccessor};
use crate::time::TimeRange;
use crate::utils::{slugify, titleize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Dimensions and Groups
// ============================================================================

/// Semantic category a dimension was discovered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DimensionCategory {
    System,
    Activity,
    Organization,
    /// String-valued sub-keys of `location`
    Location,
    /// Derived calendar buckets
    Time,
    /// `rep`, `baseline`, `produced_by`
    DataSource,
    /// The canonical-location `position` dimension
    Geo,
}

impl DimensionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Activity => "activity",
            Self::Organization => "organization",
            Self::Location => "location",
            Self::Time => "time",
            Self::DataSource => "data_source",
            Self::Geo => "geo",
        }
    }

    /// Whether dimensions of this category hold discrete labels usable for
    /// splitting a metric into sub-series.
    pub fn is_categorical(&self) -> bool {
        !matches!(self, Self::Time | Self::Geo)
    }
}

/// A discrete attribute usable for grouping and filtering.
#[derive(Debug, Clone, Serialize)]
pub struct Dimension {
    pub category: DimensionCategory,
    pub key: String,
    pub title: String,
    /// Distinct values observed across the corpus.
    pub values: BTreeSet<String>,
    pub accessor: Accessor,
    /// Keys of metric groups seen in the same record as this dimension.
    pub metrics: BTreeSet<String>,
}

impl Dimension {
    pub fn new(key: impl Into<String>, category: DimensionCategory, accessor: Accessor) -> Self {
        let key = key.into();
        Self {
            category,
            title: titleize(&key),
            key,
            values: BTreeSet::new(),
            accessor,
            metrics: BTreeSet::new(),
        }
    }

    /// Number of distinct observed values.
    pub fn cardinality(&self) -> usize {
        self.values.len()
    }

    pub fn is_time(&self) -> bool {
        self.category == DimensionCategory::Time
    }

    pub fn is_geo(&self) -> bool {
        self.category == DimensionCategory::Geo
    }

    pub fn is_categorical(&self) -> bool {
        self.category.is_categorical()
    }
}

/// A numeric metric usable for aggregation.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub key: String,
    /// Metric name exactly as it appears in the records.
    pub name: String,
    pub title: String,
    pub units: Option<String>,
    pub accessor: Accessor,
    /// Keys of dimensions seen in the same record as this metric.
    pub dimensions: BTreeSet<String>,
    pub reducer: ReducerSpec,
    pub value_accessors: Vec<ValueAccessor>,
}

impl Group {
    /// Build a group for a metric name. Returns `None` when the name has no
    /// alphanumeric content to form a key from.
    pub fn new(name: &str, units: Option<String>) -> Option<Self> {
        let key = slugify(name);
        if key.is_empty() {
            return None;
        }
        let accessor = Accessor::metric(name);
        Some(Self {
            key,
            name: name.to_string(),
            title: titleize(name),
            units,
            reducer: ReducerSpec::new(accessor.clone()),
            accessor,
            dimensions: BTreeSet::new(),
            value_accessors: ValueAccessor::ALL.to_vec(),
        })
    }

    /// Evaluate this group's reducer over a partition of records.
    pub fn reduce(&self, engine: &dyn ReductionEngine, records: &[Record]) -> Result<Reduction> {
        engine.reduce(&self.reducer, records).map_err(|e| {
            DeduceError::ReductionFailed {
                group: self.key.clone(),
                reason: e.to_string(),
            }
        })
    }
}

// ============================================================================
// Recommendations
// ============================================================================

/// Fields shared by every filter and chart recommendation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub dimension: String,
    pub groups: Vec<String>,
    pub default_group_accessor: ValueAccessor,
    pub title: String,
}

/// Filter widget kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Map of the position dimension
    Geo,
    /// Scrollable list for high-cardinality dimensions
    Row,
    /// Pie for low-cardinality dimensions
    Pie,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geo => "geo",
            Self::Row => "row",
            Self::Pie => "pie",
        }
    }
}

/// A recommended filter widget bound to one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterRecommendation {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(flatten)]
    pub envelope: Envelope,
}

/// One reducer of a split chart, restricted to a single category value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubSeries {
    /// Slug of `value-metricKey`.
    pub key: String,
    /// The category value this series is filtered to.
    pub label: String,
    pub reducer: ReducerSpec,
}

/// Chart kinds, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Candle,
    Line,
    Sand,
    Bar,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Candle => "candle",
            Self::Line => "line",
            Self::Sand => "sand",
            Self::Bar => "bar",
        }
    }
}

/// A recommended chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Chart {
    /// Distribution of one metric over time.
    Candle {
        #[serde(flatten)]
        envelope: Envelope,
    },
    /// Several same-units metrics averaged over time.
    Line {
        #[serde(flatten)]
        envelope: Envelope,
        units: String,
    },
    /// One metric over time, stacked by the values of another dimension.
    Sand {
        #[serde(flatten)]
        envelope: Envelope,
        split_dimension: String,
        series: Vec<SubSeries>,
    },
    /// One metric across a dimension, grouped by the values of another.
    Bar {
        #[serde(flatten)]
        envelope: Envelope,
        split_dimension: String,
        series: Vec<SubSeries>,
    },
}

impl Chart {
    pub fn kind(&self) -> ChartKind {
        match self {
            Self::Candle { .. } => ChartKind::Candle,
            Self::Line { .. } => ChartKind::Line,
            Self::Sand { .. } => ChartKind::Sand,
            Self::Bar { .. } => ChartKind::Bar,
        }
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Self::Candle { envelope }
            | Self::Line { envelope, .. }
            | Self::Sand { envelope, .. }
            | Self::Bar { envelope, .. } => envelope,
        }
    }

    /// Sub-series of split charts; empty for candle and line charts.
    pub fn series(&self) -> &[SubSeries] {
        match self {
            Self::Sand { series, .. } | Self::Bar { series, .. } => series,
            _ => &[],
        }
    }

    pub fn title(&self) -> &str {
        &self.envelope().title
    }
}

// ============================================================================
// Deduced Schema
// ============================================================================

/// The analytical schema derived from a corpus.
#[derive(Debug, Clone, Serialize)]
pub struct DeducedSchema {
    pub record_count: usize,
    pub dimensions: BTreeMap<String, Dimension>,
    pub groups: BTreeMap<String, Group>,
    pub locations: BTreeMap<String, GeoPoint>,
    pub time_range: TimeRange,
    pub filters: Vec<FilterRecommendation>,
    pub charts: Vec<Chart>,
}

impl DeducedSchema {
    pub fn dimension(&self, key: &str) -> Option<&Dimension> {
        self.dimensions.get(key)
    }

    pub fn group(&self, key: &str) -> Option<&Group> {
        self.groups.get(key)
    }

    /// Charts of one kind, in recommendation order.
    pub fn charts_of(&self, kind: ChartKind) -> impl Iterator<Item = &Chart> {
        self.charts.iter().filter(move |chart| chart.kind() == kind)
    }

    /// Reduce a group by key over a partition of records.
    pub fn reduce_group(
        &self,
        key: &str,
        engine: &dyn ReductionEngine,
        records: &[Record],
    ) -> Result<Reduction> {
        let group = self.groups.get(key).ok_or_else(|| DeduceError::ReductionFailed {
            group: key.to_string(),
            reason: "no such group".to_string(),
        })?;
        group.reduce(engine, records)
    }
}
