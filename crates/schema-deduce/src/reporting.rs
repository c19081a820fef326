//! Summary reports of a deduction run.
//!
//! A [`SchemaReport`] condenses a [`DeductionResult`] into counts and titles
//! suitable for a quick review. The full schema is serialized separately.

use crate::error::Result;
use crate::pipeline::DeductionResult;
use crate::scanner::ScanStats;
use crate::time::TimeBucket;
use chrono::{Local, SecondsFormat};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct SchemaReport {
    pub generated_at: String,
    pub input_file: String,
    pub duration_ms: u64,
    pub scan: ScanStats,
    pub time_range: TimeRangeSummary,
    /// Dimension counts per category.
    pub dimensions_by_category: BTreeMap<String, usize>,
    pub dimensions: Vec<DimensionSummary>,
    pub groups: Vec<GroupSummary>,
    pub location_count: usize,
    pub filters_by_kind: BTreeMap<String, usize>,
    pub charts_by_kind: BTreeMap<String, usize>,
    pub chart_titles: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeRangeSummary {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Bucket the time-series charts are drawn at, if any.
    pub native_bucket: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionSummary {
    pub key: String,
    pub category: String,
    pub cardinality: usize,
    pub metric_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub key: String,
    pub title: String,
    pub units: Option<String>,
    pub dimension_count: usize,
}

pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl ReportGenerator {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    /// Build a summary report from a finished run.
    pub fn build_report(input_file: &str, result: &DeductionResult) -> SchemaReport {
        let schema = &result.schema;

        let mut dimensions_by_category = BTreeMap::new();
        for dim in schema.dimensions.values() {
            *dimensions_by_category
                .entry(dim.category.as_str().to_string())
                .or_insert(0) += 1;
        }

        let mut filters_by_kind = BTreeMap::new();
        for filter in &schema.filters {
            *filters_by_kind.entry(filter.kind.as_str().to_string()).or_insert(0) += 1;
        }

        let mut charts_by_kind = BTreeMap::new();
        for chart in &schema.charts {
            *charts_by_kind.entry(chart.kind().as_str().to_string()).or_insert(0) += 1;
        }

        let range = &schema.time_range;
        let time_range = TimeRangeSummary {
            start: range.start.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            end: range.end.map(|ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            native_bucket: range
                .span()
                .and_then(TimeBucket::native_for_span)
                .map(|bucket| bucket.key().to_string()),
        };

        let dimensions = schema
            .dimensions
            .values()
            .map(|dim| DimensionSummary {
                key: dim.key.clone(),
                category: dim.category.as_str().to_string(),
                cardinality: dim.cardinality(),
                metric_count: dim.metrics.len(),
            })
            .collect();

        let groups = schema
            .groups
            .values()
            .map(|group| GroupSummary {
                key: group.key.clone(),
                title: group.title.clone(),
                units: group.units.clone(),
                dimension_count: group.dimensions.len(),
            })
            .collect();

        SchemaReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            duration_ms: result.duration_ms,
            scan: result.stats,
            time_range,
            dimensions_by_category,
            dimensions,
            groups,
            location_count: schema.locations.len(),
            filters_by_kind,
            charts_by_kind,
            chart_titles: schema.charts.iter().map(|c| c.title().to_string()).collect(),
            warnings: collect_warnings(result),
        }
    }

    /// Write a report to `<output_dir>/<base_name>_schema_report.json`.
    pub fn write_report_to_file(&self, report: &SchemaReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self
            .output_dir
            .join(format!("{}_schema_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());

        Ok(report_path)
    }
}

fn collect_warnings(result: &DeductionResult) -> Vec<String> {
    let stats = &result.stats;
    let schema = &result.schema;
    let mut warnings = Vec::new();

    if stats.unparseable_timestamps > 0 {
        warnings.push(format!(
            "{} record(s) had an unparseable timestamp",
            stats.unparseable_timestamps
        ));
    }
    if stats.records > 0 && schema.groups.is_empty() {
        warnings.push("No metrics found; no charts can be recommended".to_string());
    }
    if schema.time_range.is_empty() && stats.records > 0 {
        warnings.push("No usable time data; time-series charts skipped".to_string());
    } else if !schema.time_range.is_empty()
        && schema
            .time_range
            .span()
            .and_then(TimeBucket::native_for_span)
            .is_none()
    {
        warnings.push("Time span under 12 hours; time-series charts skipped".to_string());
    }
    warnings
}
