//! Integration tests for schema deduction.
//!
//! These tests run the full pipeline over fixture corpora and inline records.

use pretty_assertions::assert_eq;
use schema_deduce::{
    Chart, ChartKind, DeduceConfig, DeduceError, DeduceStage, Deducer, DeductionResult,
    DimensionCategory, FilterKind, GeoPoint, PolarsReductionEngine, ReductionEngine, TimeBucket,
    ValueAccessor, deduce,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> Value {
    let path = fixtures_path().join(filename);
    let text = std::fs::read_to_string(path).expect("Failed to read fixture");
    serde_json::from_str(&text).expect("Failed to parse fixture")
}

fn telemetry() -> DeductionResult {
    deduce(load_fixture("telemetry.json")).expect("Deduction should succeed")
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Two records `days` apart.
fn records_over_days(days: i64) -> Value {
    let start = chrono::DateTime::parse_from_rfc3339("2015-01-01T00:00:00Z").unwrap();
    let records: Vec<Value> = [0, days]
        .iter()
        .map(|offset| {
            let ts = start + chrono::TimeDelta::days(*offset);
            json!({
                "time": ts.to_rfc3339(),
                "metrics": [{"name": "Temp", "units": "C", "value": 1}]
            })
        })
        .collect();
    Value::Array(records)
}

fn records_with_hosts(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                json!({
                    "system": {"host": format!("host-{i}")},
                    "metrics": [{"name": "Temp", "value": i}]
                })
            })
            .collect(),
    )
}

// ============================================================================
// Fixture Corpus
// ============================================================================

#[test]
fn test_fixture_dimensions_and_groups() {
    let result = telemetry();
    let schema = &result.schema;

    let keys: Vec<&str> = schema.dimensions.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "day",
            "host",
            "hour",
            "month",
            "position",
            "produced_by",
            "region",
            "rep",
            "site",
            "task",
            "team",
            "week",
            "year",
        ]
    );
    assert_eq!(schema.dimensions["region"].values, set(&["east", "west"]));
    assert_eq!(schema.dimensions["region"].category, DimensionCategory::System);
    assert_eq!(schema.dimensions["site"].category, DimensionCategory::Location);
    assert_eq!(schema.dimensions["team"].category, DimensionCategory::Organization);
    assert_eq!(schema.dimensions["rep"].category, DimensionCategory::DataSource);
    assert_eq!(schema.dimensions["position"].category, DimensionCategory::Geo);
    assert_eq!(schema.dimensions["hour"].cardinality(), 4);
    assert_eq!(schema.dimensions["week"].cardinality(), 1);

    let groups: Vec<&str> = schema.groups.keys().map(String::as_str).collect();
    assert_eq!(groups, vec!["count", "dew-point", "load", "temp"]);
    assert_eq!(schema.groups["dew-point"].title, "Dew Point");
    assert_eq!(schema.groups["load"].units.as_deref(), Some("%"));
    assert_eq!(schema.groups["count"].units, None);
    assert_eq!(schema.groups["count"].dimensions, set(&["task"]));
}

#[test]
fn test_fixture_locations() {
    let schema = telemetry().schema;

    assert_eq!(schema.locations.len(), 2);
    assert_eq!(schema.locations["site-A"], GeoPoint { lat: 10.0, lon: 20.0 });
    assert_eq!(schema.locations["site-B"], GeoPoint { lat: 11.5, lon: -3.25 });
    assert_eq!(schema.dimensions["position"].values, set(&["site-A", "site-B"]));
}

#[test]
fn test_fixture_scan_stats() {
    let result = telemetry();

    assert_eq!(result.stats.records, 6);
    assert_eq!(result.stats.records_with_time, 4);
    assert_eq!(result.stats.unparseable_timestamps, 1);
    assert_eq!(result.stats.records_with_geo, 3);
    assert_eq!(result.stats.ignored_fields, 1);
    assert_eq!(result.schema.record_count, 6);
}

#[test]
fn test_fixture_filters() {
    let schema = telemetry().schema;

    let count = |kind| schema.filters.iter().filter(|f| f.kind == kind).count();
    assert_eq!(count(FilterKind::Geo), 3);
    assert_eq!(count(FilterKind::Pie), 16);
    assert_eq!(count(FilterKind::Row), 0);
    for filter in &schema.filters {
        assert_eq!(filter.envelope.groups.len(), 1);
        assert_eq!(filter.envelope.default_group_accessor, ValueAccessor::Sum);
    }

    assert!(schema.filters.iter().all(|f| {
        let dim = &schema.dimensions[&f.envelope.dimension];
        !dim.is_time() && dim.cardinality() > 1
    }));
    assert_eq!(schema.filters[0].envelope.title, "Dew Point by Host");
}

#[test]
fn test_fixture_charts() {
    let schema = telemetry().schema;

    let count = |kind| schema.charts_of(kind).count();
    assert_eq!(count(ChartKind::Candle), 3);
    assert_eq!(count(ChartKind::Line), 1);
    assert_eq!(count(ChartKind::Sand), 15);
    assert_eq!(count(ChartKind::Bar), 54);

    let leading: Vec<(ChartKind, &str)> = schema
        .charts
        .iter()
        .take(4)
        .map(|c| (c.kind(), c.title()))
        .collect();
    assert_eq!(
        leading,
        vec![
            (ChartKind::Candle, "Dew Point by Hour"),
            (ChartKind::Line, "Dew Point, Temp by Hour"),
            (ChartKind::Candle, "Load by Hour"),
            (ChartKind::Candle, "Temp by Hour"),
        ]
    );

    // time-series charts come before cross-tabulations
    let first_bar = schema.charts.iter().position(|c| c.kind() == ChartKind::Bar).unwrap();
    assert!(schema.charts[first_bar..].iter().all(|c| c.kind() == ChartKind::Bar));
}

#[test]
fn test_fixture_bar_charts_split_across_categories() {
    let schema = telemetry().schema;

    for chart in schema.charts_of(ChartKind::Bar) {
        let Chart::Bar {
            envelope,
            split_dimension,
            series,
        } = chart
        else {
            unreachable!();
        };
        let primary = &schema.dimensions[&envelope.dimension];
        let split = &schema.dimensions[split_dimension];

        assert_ne!(primary.category, split.category);
        assert!((2..=10).contains(&primary.cardinality()));
        assert!(split.metrics.contains(&envelope.groups[0]));
        assert_eq!(series.len(), split.cardinality());
    }
}

#[test]
fn test_sand_sub_series_reduce_per_value() {
    let result = telemetry();
    let schema = &result.schema;

    let sand = schema
        .charts_of(ChartKind::Sand)
        .find(|c| c.title() == "Temp by Hour by Region")
        .expect("sand chart for temp by region");
    let keys: Vec<&str> = sand.series().iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["east-temp", "west-temp"]);

    let engine = PolarsReductionEngine;
    let east = engine.reduce(&sand.series()[0].reducer, &result.records).unwrap();
    let west = engine.reduce(&sand.series()[1].reducer, &result.records).unwrap();
    assert_eq!(east.sum, 60.0);
    assert_eq!(west.sum, 40.0);

    let all = schema.reduce_group("temp", &engine, &result.records).unwrap();
    assert_eq!(all.sum, 100.0);
    assert_eq!(all.count, 4);
}

#[test]
fn test_schema_serialization_shape() {
    let schema = telemetry().schema;
    let json = serde_json::to_value(&schema).unwrap();

    assert_eq!(json["charts"][0]["type"], "candle");
    assert_eq!(json["charts"][0]["dimension"], "hour");
    assert_eq!(json["charts"][0]["default_group_accessor"], "values");
    assert_eq!(json["charts"][1]["type"], "line");
    assert_eq!(json["charts"][1]["units"], "C");
    assert_eq!(json["filters"][0]["type"], "pie");
    assert_eq!(json["filters"][0]["groups"], json!(["dew-point"]));
    assert_eq!(json["locations"]["site-A"], json!({"lat": 10.0, "lon": 20.0}));
    assert_eq!(json["dimensions"]["region"]["accessor"]["kind"], "field_path");
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_region_temp_scenario() {
    let result = deduce(json!([
        {"system": {"region": "east"}, "metrics": [{"name": "Temp", "units": "C", "value": 10}]},
        {"system": {"region": "east"}, "metrics": [{"name": "Temp", "units": "C", "value": 20}]},
        {"system": {"region": "east"}, "metrics": [{"name": "Temp", "units": "C", "value": 30}]}
    ]))
    .unwrap();
    let schema = &result.schema;

    assert_eq!(schema.dimensions["region"].values, set(&["east"]));
    let temp = &schema.groups["temp"];
    assert_eq!(temp.title, "Temp");
    assert!(temp.dimensions.contains("region"));
    assert!(schema.dimensions["region"].metrics.contains("temp"));

    let reduction = schema
        .reduce_group("temp", &PolarsReductionEngine, &result.records)
        .unwrap();
    assert_eq!(reduction.sum, 60.0);
    // single-valued dimensions produce no filters
    assert!(schema.filters.is_empty());
}

#[test]
fn test_location_scenario() {
    let schema = deduce(json!([{"location": {"lat": 10, "lon": 20, "site": "A"}}]))
        .unwrap()
        .schema;

    assert_eq!(schema.dimensions["position"].values, set(&["site-A"]));
    assert_eq!(schema.locations["site-A"], GeoPoint { lat: 10.0, lon: 20.0 });
}

#[test]
fn test_same_units_metrics_single_line_chart() {
    let schema = deduce(json!([
        {"time": "2016-01-01T00:00:00Z", "metrics": [
            {"name": "Inlet", "units": "C", "value": 1},
            {"name": "Outlet", "units": "C", "value": 2}
        ]},
        {"time": "2016-01-02T00:00:00Z", "metrics": [
            {"name": "Inlet", "units": "C", "value": 3},
            {"name": "Outlet", "units": "C", "value": 4}
        ]}
    ]))
    .unwrap()
    .schema;

    let lines: Vec<&Chart> = schema.charts_of(ChartKind::Line).collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].envelope().groups, vec!["inlet".to_string(), "outlet".to_string()]);
    assert_eq!(lines[0].title(), "Inlet, Outlet by Hour");
}

#[test]
fn test_filter_cardinality_threshold() {
    let nine = deduce(records_with_hosts(9)).unwrap().schema;
    let ten = deduce(records_with_hosts(10)).unwrap().schema;

    assert_eq!(nine.filters.len(), 1);
    assert_eq!(nine.filters[0].kind, FilterKind::Pie);
    assert_eq!(ten.filters[0].kind, FilterKind::Row);
}

#[test]
fn test_native_granularity_from_span() {
    let six_days = deduce(records_over_days(6)).unwrap().schema;
    let candle = six_days.charts_of(ChartKind::Candle).next().unwrap();
    assert_eq!(candle.envelope().dimension, TimeBucket::Hour.key());

    let long = deduce(records_over_days(400)).unwrap().schema;
    let candle = long.charts_of(ChartKind::Candle).next().unwrap();
    assert_eq!(candle.envelope().dimension, TimeBucket::Month.key());
}

#[test]
fn test_non_ascii_metric_names_and_split_values() {
    let result = deduce(json!([
        {"time": "2016-01-01T00:00:00Z", "system": {"city": "東京"}, "metrics": [
            {"name": "温度", "units": "C", "value": 1},
            {"name": "Température", "value": 2}
        ]},
        {"time": "2016-01-04T00:00:00Z", "system": {"city": "大阪"}, "metrics": [
            {"name": "温度", "units": "C", "value": 5}
        ]}
    ]))
    .unwrap();
    let schema = &result.schema;

    let group_keys: Vec<&str> = schema.groups.keys().map(String::as_str).collect();
    assert_eq!(group_keys, vec!["température", "温度"]);
    assert_eq!(schema.groups["温度"].title, "温度");
    assert!(schema.dimensions["city"].metrics.contains("温度"));
    assert!(schema.groups["温度"].dimensions.contains("city"));

    let sand = schema
        .charts_of(ChartKind::Sand)
        .find(|c| c.title() == "温度 by Hour by City")
        .expect("sand chart for 温度 by city");
    let keys: Vec<&str> = sand.series().iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["大阪-温度", "東京-温度"]);

    let engine = PolarsReductionEngine;
    let osaka = engine.reduce(&sand.series()[0].reducer, &result.records).unwrap();
    let tokyo = engine.reduce(&sand.series()[1].reducer, &result.records).unwrap();
    assert_eq!(osaka.sum, 5.0);
    assert_eq!(tokyo.sum, 1.0);
}

#[test]
fn test_time_range_serialization() {
    let schema = telemetry().schema;
    let json = serde_json::to_value(&schema).unwrap();
    assert_eq!(
        json["time_range"],
        json!({"start": "2016-03-01T08:00:00Z", "end": "2016-03-04T11:00:00Z"})
    );

    let empty = deduce(json!([{"system": {"region": "east"}}])).unwrap().schema;
    let json = serde_json::to_value(&empty).unwrap();
    assert_eq!(json["time_range"], json!({"start": null, "end": null}));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_rescan_is_idempotent() {
    let first = telemetry().schema;
    let second = telemetry().schema;

    let values = |schema: &schema_deduce::DeducedSchema| -> BTreeMap<String, BTreeSet<String>> {
        schema
            .dimensions
            .iter()
            .map(|(k, d)| (k.clone(), d.values.clone()))
            .collect()
    };
    assert_eq!(values(&first), values(&second));
    assert_eq!(
        first.groups.keys().collect::<Vec<_>>(),
        second.groups.keys().collect::<Vec<_>>()
    );
    let titles = |schema: &schema_deduce::DeducedSchema| -> Vec<String> {
        schema.charts.iter().map(|c| c.title().to_string()).collect()
    };
    assert_eq!(titles(&first), titles(&second));
}

#[test]
fn test_co_occurrence_is_symmetric() {
    let schema = telemetry().schema;

    for (dim_key, dim) in &schema.dimensions {
        for metric in &dim.metrics {
            assert!(
                schema.groups[metric].dimensions.contains(dim_key),
                "{metric} should link back to {dim_key}"
            );
        }
    }
    for (group_key, group) in &schema.groups {
        for dim in &group.dimensions {
            assert!(schema.dimensions[dim].metrics.contains(group_key));
        }
    }

    // team and temp never share a record
    assert!(!schema.dimensions["team"].metrics.contains("temp"));
    assert!(schema.dimensions["team"].metrics.contains("load"));
}

#[test]
fn test_time_extent_bounds_every_parsed_timestamp() {
    let result = telemetry();
    let range = result.schema.time_range;

    let timestamps: Vec<_> = result
        .records
        .iter()
        .filter_map(|r| r.time_buckets().map(|b| b.timestamp))
        .collect();
    assert_eq!(timestamps.len(), 4);
    assert!(timestamps.iter().all(|ts| range.contains(*ts)));
    assert_eq!(range.start, timestamps.iter().min().copied());
    assert_eq!(range.end, timestamps.iter().max().copied());
}

#[test]
fn test_time_buckets_are_monotone() {
    let result = telemetry();

    for buckets in result.records.iter().filter_map(|r| r.time_buckets()) {
        assert!(buckets.year <= buckets.month);
        assert!(buckets.month <= buckets.day);
        assert!(buckets.week <= buckets.day);
        assert!(buckets.day <= buckets.hour);
        assert!(buckets.hour <= buckets.timestamp);
    }
}

#[test]
fn test_no_time_data_keeps_sentinel_range() {
    let schema = deduce(json!([{"system": {"region": "east"}}])).unwrap().schema;

    assert!(schema.time_range.is_empty());
    assert_eq!(schema.time_range.as_millis(), (f64::INFINITY, 0.0));
    assert!(!schema.dimensions.contains_key("year"));
}

// ============================================================================
// Input Contract and Configuration
// ============================================================================

#[test]
fn test_rejects_non_sequence_input() {
    let err = deduce(json!({"records": []})).unwrap_err();
    assert!(matches!(err, DeduceError::InvalidInput(_)));
    assert!(err.is_input_error());
}

#[test]
fn test_rejects_non_mapping_record() {
    let err = deduce(json!([{"rep": "r1"}, "oops"])).unwrap_err();
    assert!(matches!(err, DeduceError::InvalidRecord { index: 1, .. }));
    assert_eq!(err.error_code(), "INVALID_RECORD");
}

#[test]
fn test_strict_timestamps_rejects_fixture() {
    let deducer = Deducer::builder()
        .config(DeduceConfig::builder().strict_timestamps(true).build().unwrap())
        .build()
        .unwrap();

    let err = deducer.run(load_fixture("telemetry.json")).unwrap_err();
    match err {
        DeduceError::InvalidTimestamp { index, value } => {
            assert_eq!(index, 4);
            assert!(value.contains("not a time"));
        }
        other => panic!("expected InvalidTimestamp, got {other}"),
    }
}

#[test]
fn test_custom_row_threshold() {
    let deducer = Deducer::builder()
        .config(DeduceConfig::builder().row_filter_threshold(2).build().unwrap())
        .build()
        .unwrap();
    let schema = deducer.run(load_fixture("telemetry.json")).unwrap().schema;

    let host_filters: Vec<FilterKind> = schema
        .filters
        .iter()
        .filter(|f| f.envelope.dimension == "host")
        .map(|f| f.kind)
        .collect();
    assert_eq!(host_filters, vec![FilterKind::Row; 3]);
}

#[test]
fn test_progress_reaches_complete() {
    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    let deducer = Deducer::builder()
        .on_progress(move |update| sink.lock().unwrap().push(update))
        .build()
        .unwrap();

    deducer.run(load_fixture("telemetry.json")).unwrap();

    let updates = updates.lock().unwrap();
    let last = updates.last().unwrap();
    assert_eq!(last.stage, DeduceStage::Complete);
    assert_eq!(last.progress, 1.0);
    assert!(updates.windows(2).all(|w| w[0].progress <= w[1].progress));
}
