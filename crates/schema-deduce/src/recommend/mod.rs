//! Post-scan recommendation heuristics.
//!
//! Both recommenders read a fully populated [`Registry`](crate::registry::Registry)
//! and never mutate it. Recommendation order follows the registry's key
//! order, so the same corpus always yields the same list.

mod charts;
mod filters;

pub use charts::ChartRecommender;
pub use filters::FilterRecommender;

/// Compose a title such as `Temp by Hour by Region`.
pub(crate) fn compose_title(metric_title: &str, dimension_titles: &[&str]) -> String {
    std::iter::once(metric_title)
        .chain(dimension_titles.iter().copied())
        .collect::<Vec<_>>()
        .join(" by ")
}
