//! Timestamp parsing, calendar buckets and the corpus time extent.
//!
//! All truncation happens in UTC so that bucket boundaries do not depend on
//! the machine running the scan.

use crate::config::WeekStart;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Naive layouts tried after RFC 3339; interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Calendar granularity of a derived time dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    Year,
    Month,
    Week,
    Day,
    Hour,
}

impl TimeBucket {
    /// All buckets, coarsest first.
    pub const ALL: [TimeBucket; 5] = [
        TimeBucket::Year,
        TimeBucket::Month,
        TimeBucket::Week,
        TimeBucket::Day,
        TimeBucket::Hour,
    ];

    /// Dimension key of this bucket.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }

    /// Truncate a timestamp to the start of its bucket.
    pub fn truncate(&self, ts: DateTime<Utc>, week_start: WeekStart) -> Option<DateTime<Utc>> {
        let date = ts.date_naive();
        match self {
            Self::Year => start_of_day(NaiveDate::from_ymd_opt(date.year(), 1, 1)?),
            Self::Month => start_of_day(NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?),
            Self::Week => {
                let offset = match week_start {
                    WeekStart::Monday => date.weekday().num_days_from_monday(),
                    WeekStart::Sunday => date.weekday().num_days_from_sunday(),
                };
                start_of_day(date.checked_sub_days(Days::new(u64::from(offset)))?)
            }
            Self::Day => start_of_day(date),
            Self::Hour => date.and_hms_opt(ts.hour(), 0, 0).map(|n| n.and_utc()),
        }
    }

    /// Pick the bucket that suits a time span for charting.
    ///
    /// Spans under twelve hours are too short for any time chart.
    pub fn native_for_span(span: TimeDelta) -> Option<TimeBucket> {
        if span < TimeDelta::hours(12) {
            None
        } else if span < TimeDelta::days(7) {
            Some(Self::Hour)
        } else if span < TimeDelta::weeks(10) {
            Some(Self::Day)
        } else if span < TimeDelta::days(365) {
            Some(Self::Week)
        } else if span < TimeDelta::days(365 * 10) {
            Some(Self::Month)
        } else {
            Some(Self::Year)
        }
    }
}

fn start_of_day(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|n| n.and_utc())
}

/// Parse a record's `time` value.
///
/// Accepts RFC 3339 strings, naive date-times and plain dates (read as UTC),
/// and numbers as epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => {
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => {
                    let f = n.as_f64()?;
                    if !f.is_finite() {
                        return None;
                    }
                    f as i64
                }
            };
            DateTime::from_timestamp_millis(millis)
        }
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(start_of_day)
}

/// Calendar buckets derived from one record's timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeBuckets {
    pub timestamp: DateTime<Utc>,
    pub year: DateTime<Utc>,
    pub month: DateTime<Utc>,
    pub week: DateTime<Utc>,
    pub day: DateTime<Utc>,
    pub hour: DateTime<Utc>,
}

impl TimeBuckets {
    /// Derive all five buckets from a timestamp.
    pub fn derive(timestamp: DateTime<Utc>, week_start: WeekStart) -> Option<Self> {
        Some(Self {
            timestamp,
            year: TimeBucket::Year.truncate(timestamp, week_start)?,
            month: TimeBucket::Month.truncate(timestamp, week_start)?,
            week: TimeBucket::Week.truncate(timestamp, week_start)?,
            day: TimeBucket::Day.truncate(timestamp, week_start)?,
            hour: TimeBucket::Hour.truncate(timestamp, week_start)?,
        })
    }

    /// The truncated instant for a bucket.
    pub fn get(&self, bucket: TimeBucket) -> DateTime<Utc> {
        match bucket {
            TimeBucket::Year => self.year,
            TimeBucket::Month => self.month,
            TimeBucket::Week => self.week,
            TimeBucket::Day => self.day,
            TimeBucket::Hour => self.hour,
        }
    }
}

/// Running extent of all parsed timestamps in a corpus.
///
/// An empty range means no record carried usable time data. Serializes as
/// `{start, end}` RFC 3339 strings, both `null` when empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeRange {
    /// Widen the range to include a timestamp.
    pub fn extend(&mut self, ts: DateTime<Utc>) {
        self.start = Some(self.start.map_or(ts, |start| start.min(ts)));
        self.end = Some(self.end.map_or(ts, |end| end.max(ts)));
    }

    /// True when no timestamp has been seen.
    pub fn is_empty(&self) -> bool {
        self.start.is_none()
    }

    /// Duration between the first and last timestamp.
    pub fn span(&self) -> Option<TimeDelta> {
        Some(self.end? - self.start?)
    }

    /// Whether a timestamp falls inside the range.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= ts && ts <= end,
            _ => false,
        }
    }

    /// The range as epoch milliseconds.
    ///
    /// An empty range is reported as `(+infinity, 0)`.
    pub fn as_millis(&self) -> (f64, f64) {
        match (self.start, self.end) {
            (Some(start), Some(end)) => (
                start.timestamp_millis() as f64,
                end.timestamp_millis() as f64,
            ),
            _ => (f64::INFINITY, 0.0),
        }
    }
}
