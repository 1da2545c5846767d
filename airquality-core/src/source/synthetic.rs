use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    FetchError,
    model::{Measurement, SourceRequest},
    source::{AirQualitySource, ReadingCollector, SourceId},
};

/// A pollutant the generator always emits, with its base range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantBand {
    pub parameter: &'static str,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const POLLUTANTS: &[PollutantBand] = &[
    PollutantBand { parameter: "pm25", unit: "µg/m³", min: 5.0, max: 35.0 },
    PollutantBand { parameter: "pm10", unit: "µg/m³", min: 10.0, max: 60.0 },
    PollutantBand { parameter: "no2", unit: "µg/m³", min: 10.0, max: 80.0 },
    PollutantBand { parameter: "o3", unit: "µg/m³", min: 20.0, max: 120.0 },
    PollutantBand { parameter: "so2", unit: "µg/m³", min: 1.0, max: 20.0 },
    PollutantBand { parameter: "co", unit: "µg/m³", min: 200.0, max: 1000.0 },
];

/// Readings scale up to 20% higher towards the poles.
pub fn latitude_factor(latitude: f64) -> f64 {
    1.0 + 0.2 * (latitude.abs().min(90.0) / 90.0)
}

/// Offline source producing plausible readings without any network call.
#[derive(Debug)]
pub struct SyntheticSource {
    rng: Mutex<StdRng>,
}

impl SyntheticSource {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible sequence of readings.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn generate(
        &self,
        city: &str,
        country: &str,
        latitude: f64,
        longitude: f64,
    ) -> Vec<Measurement> {
        let factor = latitude_factor(latitude);
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut collector = ReadingCollector::new();

        for band in POLLUTANTS {
            let base = rng.gen_range(band.min..=band.max);
            collector.push(Measurement {
                city: city.to_string(),
                country: country.to_string(),
                latitude,
                longitude,
                parameter: band.parameter.to_string(),
                value: base * factor,
                unit: band.unit.to_string(),
                last_updated: Some(now.clone()),
            });
        }

        collector.finish()
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AirQualitySource for SyntheticSource {
    fn id(&self) -> SourceId {
        SourceId::Synthetic
    }

    async fn latest(&self, request: &SourceRequest) -> Result<Vec<Measurement>, FetchError> {
        let coords = request.coordinates;
        Ok(self.generate(&request.city, &request.country, coords.latitude, coords.longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Coordinates;

    #[test]
    fn emits_one_reading_per_pollutant_within_band() {
        let source = SyntheticSource::with_seed(42);
        let readings = source.generate("Paris", "FR", 48.8566, 2.3522);
        let factor = latitude_factor(48.8566);

        assert_eq!(readings.len(), 6);
        for (reading, band) in readings.iter().zip(POLLUTANTS) {
            assert_eq!(reading.parameter, band.parameter);
            assert_eq!(reading.city, "Paris");
            assert_eq!(reading.latitude, 48.8566);
            assert_eq!(reading.longitude, 2.3522);
            assert!(
                reading.value >= band.min * factor && reading.value <= band.max * factor,
                "{} = {}",
                band.parameter,
                reading.value
            );
            assert!(reading.last_updated.is_some());
        }
    }

    #[test]
    fn same_seed_same_values() {
        let a = SyntheticSource::with_seed(7).generate("Lyon", "FR", 45.764, 4.8357);
        let b = SyntheticSource::with_seed(7).generate("Lyon", "FR", 45.764, 4.8357);

        let a: Vec<f64> = a.iter().map(|m| m.value).collect();
        let b: Vec<f64> = b.iter().map(|m| m.value).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn northern_locations_trend_higher() {
        assert_eq!(latitude_factor(0.0), 1.0);
        assert!(latitude_factor(60.0) > latitude_factor(43.0));
        assert_eq!(latitude_factor(-90.0), 1.2);
        assert_eq!(latitude_factor(200.0), 1.2);
    }

    #[tokio::test]
    async fn latest_uses_request_location() {
        let source = SyntheticSource::with_seed(1);
        let request = SourceRequest::for_point(Coordinates::new(50.6292, 3.0573), 1000);

        let readings = source.latest(&request).await.unwrap();

        assert_eq!(readings.len(), 6);
        assert!(readings.iter().all(|r| r.city == "Unknown" && r.latitude == 50.6292));
    }
}
