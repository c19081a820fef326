//! The deduction pipeline.
//!
//! [`Deducer`] runs the phases in strict order over one fresh [`Registry`]:
//! input validation, the corpus scan, filter recommendation and chart
//! recommendation. Every run starts from scratch; a changed corpus needs a
//! new run.

pub mod progress;

pub use progress::{ClosureProgressReporter, DeduceStage, ProgressReporter, ProgressUpdate};

use crate::config::{ConfigValidationError, DeduceConfig};
use crate::error::Result;
use crate::record::{Record, records_from_str, records_from_value};
use crate::recommend::{ChartRecommender, FilterRecommender};
use crate::registry::Registry;
use crate::scanner::{ScanStats, Scanner};
use crate::types::DeducedSchema;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct DeductionResult {
    /// The input records, extended with their derived time buckets.
    pub records: Vec<Record>,
    pub schema: DeducedSchema,
    pub stats: ScanStats,
    pub duration_ms: u64,
}

/// Runs schema deduction over a corpus.
///
/// ```rust,ignore
/// use schema_deduce::{Deducer, DeduceConfig, WeekStart};
///
/// let result = Deducer::builder()
///     .config(DeduceConfig::builder().week_start(WeekStart::Sunday).build()?)
///     .on_progress(|update| println!("[{:.0}%] {}", update.progress * 100.0, update.message))
///     .build()?
///     .run(serde_json::from_str(&json)?)?;
///
/// for chart in &result.schema.charts {
///     println!("{}", chart.title());
/// }
/// ```
pub struct Deducer {
    config: DeduceConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(Deducer: Send, Sync);
static_assertions::assert_impl_all!(DeductionResult: Send, Sync);
static_assertions::assert_impl_all!(DeducedSchema: Send, Sync, Clone);

impl Default for Deducer {
    fn default() -> Self {
        Self {
            config: DeduceConfig::default(),
            progress_reporter: None,
        }
    }
}

impl Deducer {
    pub fn builder() -> DeducerBuilder {
        DeducerBuilder::default()
    }

    pub fn config(&self) -> &DeduceConfig {
        &self.config
    }

    /// Validate a JSON value as a record sequence, then deduce its schema.
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when `input` is not an array of
    /// objects; nothing is scanned in that case.
    pub fn run(&self, input: Value) -> Result<DeductionResult> {
        self.report_progress(ProgressUpdate::new(DeduceStage::Validating, 0.0, "Validating input"));
        let records = match records_from_value(input) {
            Ok(records) => records,
            Err(e) => return Err(self.fail(e)),
        };
        self.run_records(records)
    }

    /// Like [`run`](Self::run), parsing the corpus from a JSON string.
    pub fn run_str(&self, json: &str) -> Result<DeductionResult> {
        self.report_progress(ProgressUpdate::new(DeduceStage::Validating, 0.0, "Parsing input"));
        let records = match records_from_str(json) {
            Ok(records) => records,
            Err(e) => return Err(self.fail(e)),
        };
        self.run_records(records)
    }

    /// Deduce the schema of already validated records.
    pub fn run_records(&self, mut records: Vec<Record>) -> Result<DeductionResult> {
        let start = Instant::now();
        match self.deduce_internal(&mut records) {
            Ok((schema, stats)) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!("Deduction finished in {} ms", duration_ms);
                self.report_progress(ProgressUpdate::complete(format!(
                    "Deduced {} dimension(s), {} group(s), {} chart(s)",
                    schema.dimensions.len(),
                    schema.groups.len(),
                    schema.charts.len()
                )));
                Ok(DeductionResult {
                    records,
                    schema,
                    stats,
                    duration_ms,
                })
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Deduce the schema of `records`, extending each record in place with
    /// its derived time buckets.
    pub fn deduce(&self, records: &mut [Record]) -> Result<DeducedSchema> {
        match self.deduce_internal(records) {
            Ok((schema, _)) => {
                self.report_progress(ProgressUpdate::complete("Deduction complete"));
                Ok(schema)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn deduce_internal(&self, records: &mut [Record]) -> Result<(DeducedSchema, ScanStats)> {
        let total = records.len();
        let mut registry = Registry::new();

        info!("Step 1: Scanning {} record(s)...", total);
        self.report_progress(ProgressUpdate::with_items(
            DeduceStage::Scanning,
            0,
            total,
            "Scanning records",
        ));
        let stats = Scanner::new(&self.config).scan(records, &mut registry)?;
        self.report_progress(ProgressUpdate::with_items(
            DeduceStage::Scanning,
            total,
            total,
            format!(
                "Found {} dimension(s) and {} group(s)",
                registry.dimensions().len(),
                registry.groups().len()
            ),
        ));

        info!("Step 2: Recommending filters...");
        self.report_progress(ProgressUpdate::new(
            DeduceStage::RecommendingFilters,
            0.0,
            "Recommending filters",
        ));
        let filters = FilterRecommender::new(&self.config).recommend(&registry);

        info!("Step 3: Recommending charts...");
        self.report_progress(ProgressUpdate::new(
            DeduceStage::RecommendingCharts,
            0.0,
            "Recommending charts",
        ));
        let charts = ChartRecommender::new(&self.config).recommend(&registry);

        info!(
            "Deduced {} dimension(s), {} group(s), {} filter(s), {} chart(s)",
            registry.dimensions().len(),
            registry.groups().len(),
            filters.len(),
            charts.len()
        );

        let Registry {
            dimensions,
            groups,
            locations,
            time_range,
        } = registry;

        let schema = DeducedSchema {
            record_count: total,
            dimensions,
            groups,
            locations,
            time_range,
            filters,
            charts,
        };
        Ok((schema, stats))
    }

    fn fail(&self, e: crate::error::DeduceError) -> crate::error::DeduceError {
        error!("Deduction error: {}", e);
        self.report_progress(ProgressUpdate::failed(e.to_string()));
        e
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }
}

/// Builder for [`Deducer`].
#[derive(Default)]
pub struct DeducerBuilder {
    config: Option<DeduceConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(DeducerBuilder: Send);

impl DeducerBuilder {
    pub fn config(mut self, config: DeduceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Deducer, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Deducer {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

/// Deduce the schema of a JSON corpus with the default configuration.
pub fn deduce(input: Value) -> Result<DeductionResult> {
    Deducer::default().run(input)
}
