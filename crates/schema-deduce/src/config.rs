//! Configuration types for schema deduction.
//!
//! The heuristics in the recommenders are driven by a handful of cardinality
//! thresholds. They are collected here, with defaults that reproduce the
//! stock behavior, and exposed through a builder.

use serde::{Deserialize, Serialize};

/// First day of the week used when truncating timestamps to the week bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    /// ISO 8601 weeks
    #[default]
    Monday,
    /// US-style weeks
    Sunday,
}

/// Configuration for a deduction run.
///
/// Use [`DeduceConfig::builder()`] to create a new configuration
/// with fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use schema_deduce::config::{DeduceConfig, WeekStart};
///
/// let config = DeduceConfig::builder()
///     .week_start(WeekStart::Sunday)
///     .row_filter_threshold(12)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeduceConfig {
    /// Week start convention for the `week` bucket.
    /// Default: Monday
    pub week_start: WeekStart,

    /// Dimensions with more distinct values than this get a `row` filter
    /// instead of a `pie` filter.
    /// Default: 9
    pub row_filter_threshold: usize,

    /// Minimum number of distinct values a dimension needs before it is used
    /// to split a metric into sub-series (sand and bar charts).
    /// Default: 2
    pub min_split_cardinality: usize,

    /// Maximum number of distinct values of the primary dimension of a
    /// cross-tabulated bar chart.
    /// Default: 10
    pub max_crosstab_cardinality: usize,

    /// Whether string-valued `location` sub-keys become categorical dimensions.
    /// Default: true
    pub location_dimensions: bool,

    /// Reject the corpus when a `time` field cannot be parsed.
    /// When false, the record simply contributes no time data.
    /// Default: false
    pub strict_timestamps: bool,
}

impl Default for DeduceConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            row_filter_threshold: 9,
            min_split_cardinality: 2,
            max_crosstab_cardinality: 10,
            location_dimensions: true,
            strict_timestamps: false,
        }
    }
}

impl DeduceConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DeduceConfigBuilder {
        DeduceConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.row_filter_threshold == 0 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "row_filter_threshold".to_string(),
                value: self.row_filter_threshold,
            });
        }

        if self.min_split_cardinality < 2 {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "min_split_cardinality".to_string(),
                value: self.min_split_cardinality,
            });
        }

        if self.max_crosstab_cardinality < self.min_split_cardinality {
            return Err(ConfigValidationError::InvalidCrosstabRange {
                min: self.min_split_cardinality,
                max: self.max_crosstab_cardinality,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value}")]
    InvalidThreshold { field: String, value: usize },

    #[error("Invalid cross-tabulation range: max {max} is below min {min}")]
    InvalidCrosstabRange { min: usize, max: usize },
}

/// Builder for [`DeduceConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DeduceConfigBuilder {
    week_start: Option<WeekStart>,
    row_filter_threshold: Option<usize>,
    min_split_cardinality: Option<usize>,
    max_crosstab_cardinality: Option<usize>,
    location_dimensions: Option<bool>,
    strict_timestamps: Option<bool>,
}

impl DeduceConfigBuilder {
    /// Set the week start convention.
    pub fn week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = Some(week_start);
        self
    }

    /// Set the cardinality above which filters become `row` lists.
    pub fn row_filter_threshold(mut self, threshold: usize) -> Self {
        self.row_filter_threshold = Some(threshold);
        self
    }

    /// Set the minimum cardinality of a splitting dimension.
    pub fn min_split_cardinality(mut self, min: usize) -> Self {
        self.min_split_cardinality = Some(min);
        self
    }

    /// Set the maximum cardinality of a cross-tabulated bar chart's primary dimension.
    pub fn max_crosstab_cardinality(mut self, max: usize) -> Self {
        self.max_crosstab_cardinality = Some(max);
        self
    }

    /// Enable or disable categorical dimensions from `location` sub-keys.
    pub fn location_dimensions(mut self, enable: bool) -> Self {
        self.location_dimensions = Some(enable);
        self
    }

    /// Enable or disable rejection of unparseable timestamps.
    pub fn strict_timestamps(mut self, strict: bool) -> Self {
        self.strict_timestamps = Some(strict);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DeduceConfig` or an error if validation fails.
    pub fn build(self) -> Result<DeduceConfig, ConfigValidationError> {
        let config = DeduceConfig {
            week_start: self.week_start.unwrap_or_default(),
            row_filter_threshold: self.row_filter_threshold.unwrap_or(9),
            min_split_cardinality: self.min_split_cardinality.unwrap_or(2),
            max_crosstab_cardinality: self.max_crosstab_cardinality.unwrap_or(10),
            location_dimensions: self.location_dimensions.unwrap_or(true),
            strict_timestamps: self.strict_timestamps.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}
