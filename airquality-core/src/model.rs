use serde::{Deserialize, Serialize};

use crate::aqi::{self, LabelLocale};

/// Country used when neither the query nor the provider names one.
pub const DEFAULT_COUNTRY: &str = "FR";

/// City label used for coordinate queries the provider does not name.
pub const UNKNOWN_CITY: &str = "Unknown";

/// Largest search radius the providers accept, in meters.
pub const MAX_RADIUS_M: u32 = 25_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// How the caller keyed the query. Some sources filter differently by city.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    City,
    Point,
}

/// Everything a source needs to fetch the latest readings for one place.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub scope: QueryScope,
    /// Fallback display city when the provider does not name its station.
    pub city: String,
    /// Fallback display country.
    pub country: String,
    pub coordinates: Coordinates,
    /// Already clamped to [`MAX_RADIUS_M`].
    pub radius_m: u32,
}

impl SourceRequest {
    pub fn for_city(city: &str, country: &str, coordinates: Coordinates) -> Self {
        Self {
            scope: QueryScope::City,
            city: city.to_string(),
            country: country.to_string(),
            coordinates,
            radius_m: MAX_RADIUS_M,
        }
    }

    pub fn for_point(coordinates: Coordinates, radius_m: u32) -> Self {
        Self {
            scope: QueryScope::Point,
            city: UNKNOWN_CITY.to_string(),
            country: DEFAULT_COUNTRY.to_string(),
            coordinates,
            radius_m: radius_m.min(MAX_RADIUS_M),
        }
    }
}

/// A normalized pollutant reading before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Canonical lower-case identifier, e.g. `pm25`.
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub last_updated: Option<String>,
}

/// The source-agnostic reading handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalReading {
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub last_updated: Option<String>,
    pub aqi: u16,
    pub quality_level: String,
}

impl CanonicalReading {
    /// Finalize a measurement with its AQI and quality label.
    pub fn classify(m: Measurement, locale: LabelLocale) -> Self {
        let classification = aqi::classify(Some(&m.parameter), m.value);

        Self {
            city: m.city,
            country: m.country,
            latitude: m.latitude,
            longitude: m.longitude,
            parameter: m.parameter,
            value: m.value,
            unit: m.unit,
            last_updated: m.last_updated,
            aqi: classification.aqi,
            quality_level: classification.level.label(locale).to_string(),
        }
    }
}
