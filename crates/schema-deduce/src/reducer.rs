//! Reducers: how a metric is aggregated over a partition of records.
//!
//! A [`ReducerSpec`] names the metric accessor and an optional equality
//! filter. A [`ReductionEngine`] evaluates it into a [`Reduction`], from which
//! the [`ValueAccessor`]s read sum, average, count, min, max, median and the
//! raw value list.
//!
//! The default engine, [`PolarsReductionEngine`], collects the matching
//! values into a polars `Series` and aggregates there.

use crate::accessor::Accessor;
use crate::error::{Result, ResultExt};
use crate::record::Record;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Restricts a reducer to records whose `accessor` label equals `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EqualityFilter {
    pub accessor: Accessor,
    pub value: String,
}

/// Description of a reducer bound to one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducerSpec {
    pub accessor: Accessor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<EqualityFilter>,
}

impl ReducerSpec {
    pub fn new(accessor: Accessor) -> Self {
        Self {
            accessor,
            filter: None,
        }
    }

    /// Restrict the reducer to records where `accessor` reads `value`.
    pub fn filtered_by(mut self, accessor: Accessor, value: impl Into<String>) -> Self {
        self.filter = Some(EqualityFilter {
            accessor,
            value: value.into(),
        });
        self
    }

    /// Whether a record passes this reducer's filter.
    pub fn matches(&self, record: &Record) -> bool {
        match &self.filter {
            Some(filter) => filter.accessor.label(record) == filter.value,
            None => true,
        }
    }

    /// Metric values of the matching records, in record order.
    ///
    /// Records that do not carry the metric contribute nothing.
    pub fn values(&self, records: &[Record]) -> Vec<f64> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .filter_map(|record| self.accessor.number(record))
            .collect()
    }
}

/// Aggregates of one reducer over one partition.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Reduction {
    pub count: usize,
    pub sum: f64,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub values: Vec<f64>,
}

/// Reads one aggregate out of a [`Reduction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueAccessor {
    Sum,
    Average,
    Count,
    Min,
    Max,
    Median,
    Values,
}

/// Output of a [`ValueAccessor`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateValue {
    Number(Option<f64>),
    List(Vec<f64>),
}

impl ValueAccessor {
    pub const ALL: [ValueAccessor; 7] = [
        ValueAccessor::Sum,
        ValueAccessor::Average,
        ValueAccessor::Count,
        ValueAccessor::Min,
        ValueAccessor::Max,
        ValueAccessor::Median,
        ValueAccessor::Values,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Values => "values",
        }
    }

    pub fn read(&self, reduction: &Reduction) -> AggregateValue {
        match self {
            Self::Sum => AggregateValue::Number(Some(reduction.sum)),
            Self::Average => AggregateValue::Number(reduction.average),
            Self::Count => AggregateValue::Number(Some(reduction.count as f64)),
            Self::Min => AggregateValue::Number(reduction.min),
            Self::Max => AggregateValue::Number(reduction.max),
            Self::Median => AggregateValue::Number(reduction.median),
            Self::Values => AggregateValue::List(reduction.values.clone()),
        }
    }
}

/// The external aggregation engine.
///
/// Implementations evaluate a reducer over a partition of records.
pub trait ReductionEngine: Send + Sync {
    fn reduce(&self, spec: &ReducerSpec, records: &[Record]) -> Result<Reduction>;
}

/// Default engine aggregating with polars.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolarsReductionEngine;

impl ReductionEngine for PolarsReductionEngine {
    fn reduce(&self, spec: &ReducerSpec, records: &[Record]) -> Result<Reduction> {
        let values = spec.values(records);
        if values.is_empty() {
            return Ok(Reduction::default());
        }

        let series = Series::new("value".into(), values.clone());
        let chunked = series.f64().context("Reading reducer values")?;

        Ok(Reduction {
            count: values.len(),
            sum: chunked.sum().unwrap_or(0.0),
            average: series.mean(),
            min: chunked.min(),
            max: chunked.max(),
            median: series.median(),
            values,
        })
    }
}
