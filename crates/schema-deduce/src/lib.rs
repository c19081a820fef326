//! Telemetry Schema Deduction Library
//!
//! Derives an analytical schema from a corpus of semi-structured telemetry
//! records and recommends visualizations for it.
//!
//! # Overview
//!
//! A single pass over the records discovers:
//!
//! - **Dimensions**: discrete attributes from `system`, `activity`,
//!   `organization` and `location` sub-keys, the `rep` / `baseline` /
//!   `produced_by` tags, calendar buckets of `time`, and a geo `position`
//! - **Groups**: metrics from the `metrics` list, keyed by slugified name
//! - **Co-occurrence**: which dimensions and metrics appear in the same record
//! - **Locations**: canonical location key to latitude/longitude
//!
//! The finished registry is then turned into filter widgets (`geo`, `row`,
//! `pie`) and charts (`candle`, `line`, `sand`, `bar`) purely from
//! cardinality, units and co-occurrence.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use schema_deduce::{ChartKind, Deducer, PolarsReductionEngine};
//!
//! let result = Deducer::builder()
//!     .on_progress(|update| println!("[{:.0}%] {}", update.progress * 100.0, update.message))
//!     .build()?
//!     .run_str(&std::fs::read_to_string("telemetry.json")?)?;
//!
//! for chart in result.schema.charts_of(ChartKind::Line) {
//!     println!("{}", chart.title());
//! }
//!
//! let temp = result.schema.reduce_group("temp", &PolarsReductionEngine, &result.records)?;
//! println!("sum = {}", temp.sum);
//! ```
//!
//! # Configuration
//!
//! ```rust,ignore
//! use schema_deduce::{DeduceConfig, WeekStart};
//!
//! let config = DeduceConfig::builder()
//!     .week_start(WeekStart::Sunday)
//!     .row_filter_threshold(12)
//!     .strict_timestamps(true)
//!     .build()?;
//! ```

pub mod accessor;
pub mod classifier;
pub mod config;
pub mod error;
pub mod geo;
pub mod pipeline;
pub mod record;
pub mod recommend;
pub mod reducer;
pub mod registry;
pub mod reporting;
pub mod scanner;
pub mod time;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use accessor::{Accessor, AccessorValue};
pub use classifier::FieldKind;
pub use config::{ConfigValidationError, DeduceConfig, DeduceConfigBuilder, WeekStart};
pub use error::{DeduceError, Result as DeduceResult, ResultExt};
pub use geo::GeoPoint;
pub use pipeline::{
    ClosureProgressReporter, DeduceStage, Deducer, DeducerBuilder, DeductionResult,
    ProgressReporter, ProgressUpdate, deduce,
};
pub use record::{Record, records_from_str, records_from_value};
pub use recommend::{ChartRecommender, FilterRecommender};
pub use reducer::{
    AggregateValue, PolarsReductionEngine, ReducerSpec, Reduction, ReductionEngine, ValueAccessor,
};
pub use registry::Registry;
pub use reporting::{ReportGenerator, SchemaReport};
pub use scanner::{ScanStats, Scanner};
pub use time::{TimeBucket, TimeBuckets, TimeRange};
pub use types::{
    Chart, ChartKind, DeducedSchema, Dimension, DimensionCategory, Envelope, FilterKind,
    FilterRecommendation, Group, SubSeries,
};
pub use utils::{slugify, titleize};
