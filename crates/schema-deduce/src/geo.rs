//! Geo-location extraction from a record's `location` mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sub-key names recognized as latitude, matched case-insensitively.
pub const LATITUDE_NAMES: [&str; 4] = ["lat", "latitude", "lt", "ltd"];

/// Sub-key names recognized as longitude, matched case-insensitively.
pub const LONGITUDE_NAMES: [&str; 5] = ["lon", "long", "longitude", "lng", "ln"];

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Find the first numeric sub-key matching one of `names`.
fn find_coordinate<'a>(location: &'a Map<String, Value>, names: &[&str]) -> Option<(&'a str, f64)> {
    names.iter().find_map(|alias| {
        location
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(alias))
            .and_then(|(key, value)| value.as_f64().map(|v| (key.as_str(), v)))
    })
}

/// Extract a coordinate pair from a `location` mapping.
///
/// Both halves must be JSON numbers and within the usual degree ranges.
pub fn extract_point(location: &Map<String, Value>) -> Option<GeoPoint> {
    let (_, lat) = find_coordinate(location, &LATITUDE_NAMES)?;
    let (_, lon) = find_coordinate(location, &LONGITUDE_NAMES)?;
    let point = GeoPoint { lat, lon };
    point.is_valid().then_some(point)
}

/// Build the canonical key of a `location` mapping.
///
/// String-valued sub-keys are sorted by name and joined as
/// `subkey-value` pairs separated by `-`, so `{site: "A", lat: 10}` becomes
/// `site-A`. A location with only coordinates is keyed by its coordinate
/// sub-keys the same way (`lat-10-lon-20`). Returns `None` when neither
/// exists.
pub fn canonical_key(location: &Map<String, Value>) -> Option<String> {
    let mut pairs: Vec<(&str, &str)> = location
        .iter()
        .filter_map(|(key, value)| value.as_str().map(|s| (key.as_str(), s)))
        .collect();

    if pairs.is_empty() {
        let (lat_key, lat) = find_coordinate(location, &LATITUDE_NAMES)?;
        let (lon_key, lon) = find_coordinate(location, &LONGITUDE_NAMES)?;
        return Some(format!("{lat_key}-{lat}-{lon_key}-{lon}"));
    }

    pairs.sort_by(|a, b| a.0.cmp(b.0));
    Some(
        pairs
            .iter()
            .map(|(key, value)| format!("{key}-{value}"))
            .collect::<Vec<_>>()
            .join("-"),
    )
}
