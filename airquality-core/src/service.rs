//! Public query operations: by city name or by coordinates.
//!
//! Every call counts one attempt, times the whole operation (artificial
//! delay and network round-trips included) and counts one error on failure.

use std::{sync::Arc, time::Instant};

use tracing::{error, info, warn};

use crate::{
    FetchError,
    aqi::LabelLocale,
    delay::DelayPolicy,
    gazetteer,
    metrics::{API_CALLS, API_ERRORS, API_LATENCY, MetricsSink, TracingMetrics},
    model::{CanonicalReading, Coordinates, MAX_RADIUS_M, SourceRequest},
    source::{AirQualitySource, MAX_READINGS},
};

pub const DEFAULT_RADIUS_M: u32 = MAX_RADIUS_M;

#[derive(Debug)]
pub struct AirQualityService {
    source: Box<dyn AirQualitySource>,
    metrics: Arc<dyn MetricsSink>,
    delay: DelayPolicy,
    locale: LabelLocale,
}

impl AirQualityService {
    pub fn new(source: Box<dyn AirQualitySource>) -> Self {
        Self {
            source,
            metrics: Arc::new(TracingMetrics),
            delay: DelayPolicy::Disabled,
            locale: LabelLocale::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_delay(mut self, delay: DelayPolicy) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_locale(mut self, locale: LabelLocale) -> Self {
        self.locale = locale;
        self
    }

    /// Latest readings around a city. Unknown cities use the default city's
    /// coordinates instead of failing.
    pub async fn query_by_city(
        &self,
        city: &str,
        country: &str,
    ) -> Result<Vec<CanonicalReading>, FetchError> {
        info!(city, country, source = %self.source.id(), "fetching air quality by city");

        let coordinates = gazetteer::find(city).unwrap_or_else(|| {
            warn!(city, fallback = gazetteer::DEFAULT_CITY, "unknown city, using default coordinates");
            gazetteer::lookup(gazetteer::DEFAULT_CITY)
        });

        let request = SourceRequest::for_city(city, country, coordinates);
        let readings = self.instrumented(&request).await?;

        if readings.is_empty() {
            warn!(city, "no air quality data found for city");
        }
        Ok(readings)
    }

    /// Latest readings within `radius_m` meters of a point. The radius is
    /// clamped to the provider ceiling.
    pub async fn query_by_coordinates(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Vec<CanonicalReading>, FetchError> {
        info!(latitude, longitude, radius = radius_m, source = %self.source.id(), "fetching air quality by coordinates");

        let request = SourceRequest::for_point(Coordinates::new(latitude, longitude), radius_m);
        let readings = self.instrumented(&request).await?;

        if readings.is_empty() {
            warn!(latitude, longitude, "no air quality data found for coordinates");
        }
        Ok(readings)
    }

    async fn instrumented(&self, request: &SourceRequest) -> Result<Vec<CanonicalReading>, FetchError> {
        self.metrics.increment_counter(API_CALLS);
        let started = Instant::now();

        let result = self.fetch(request).await;

        self.metrics.record_duration(API_LATENCY, started.elapsed());
        if let Err(err) = &result {
            error!(source = %self.source.id(), error = %err, "error fetching air quality data");
            self.metrics.increment_counter(API_ERRORS);
        }
        result
    }

    async fn fetch(&self, request: &SourceRequest) -> Result<Vec<CanonicalReading>, FetchError> {
        self.delay.wait().await;

        let measurements = self.source.latest(request).await?;

        Ok(measurements
            .into_iter()
            .take(MAX_READINGS)
            .map(|m| CanonicalReading::classify(m, self.locale))
            .collect())
    }
}
