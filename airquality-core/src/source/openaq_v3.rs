use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    FetchError,
    model::{Measurement, SourceRequest},
    source::{
        AirQualitySource, ReadingCollector, SourceId,
        http::{JsonClient, PRIMARY_TIMEOUT, SECONDARY_TIMEOUT},
        parse_entries, resolve_parameter_name,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v3";

/// Candidate stations requested per location search.
const LOCATION_LIMIT: &str = "20";

/// OpenAQ v3: searches stations near a point, then fetches each station's
/// latest values and joins them to parameters through the sensor ids.
#[derive(Debug, Clone)]
pub struct OpenAqV3Source {
    client: JsonClient,
}

impl OpenAqV3Source {
    pub fn new(api_key: String) -> Self {
        Self {
            client: JsonClient::new(DEFAULT_BASE_URL, api_key),
        }
    }

    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        Self {
            client: self.client.with_base_url(base_url),
        }
    }

    async fn search_locations(&self, request: &SourceRequest) -> Result<Vec<V3Location>, FetchError> {
        let coords = request.coordinates;

        let envelope: V3Envelope = self
            .client
            .get(
                "/locations",
                &[
                    ("coordinates", format!("{},{}", coords.latitude, coords.longitude)),
                    ("radius", request.radius_m.to_string()),
                    ("limit", LOCATION_LIMIT.to_string()),
                ],
                PRIMARY_TIMEOUT,
            )
            .await?;

        Ok(parse_entries(envelope.results, "location"))
    }

    async fn fetch_latest(&self, location_id: i64) -> Result<Vec<Value>, FetchError> {
        let envelope: V3Envelope = self
            .client
            .get(&format!("/locations/{location_id}/latest"), &[], SECONDARY_TIMEOUT)
            .await?;

        Ok(envelope.results)
    }
}

#[derive(Debug, Default, Deserialize)]
struct V3Envelope {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V3Location {
    id: Option<i64>,
    name: Option<String>,
    coordinates: Option<V3Coordinates>,
    country: Option<V3Country>,
    sensors: Vec<V3Sensor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V3Coordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V3Country {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V3Sensor {
    id: Option<i64>,
    parameter: Option<V3Parameter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct V3Parameter {
    id: Option<i64>,
    name: Option<String>,
    display_name: Option<String>,
    units: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct V3Latest {
    sensors_id: Option<i64>,
    value: Option<f64>,
    datetime: Option<V3Datetime>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V3Datetime {
    utc: Option<String>,
}

/// Join one station's latest values to its sensors and feed the collector.
fn collect_latest(
    location: &V3Location,
    latest: Vec<Value>,
    request: &SourceRequest,
    collector: &mut ReadingCollector,
) {
    let sensors: HashMap<i64, &V3Parameter> = location
        .sensors
        .iter()
        .filter_map(|s| match (s.id, s.parameter.as_ref()) {
            (Some(id), Some(parameter)) if id > 0 => Some((id, parameter)),
            _ => None,
        })
        .collect();

    let city = location.name.clone().unwrap_or_else(|| request.city.clone());
    let country = location
        .country
        .as_ref()
        .and_then(|c| c.name.clone())
        .unwrap_or_else(|| request.country.clone());
    let coords = location.coordinates.as_ref();
    let latitude = coords
        .and_then(|c| c.latitude)
        .unwrap_or(request.coordinates.latitude);
    let longitude = coords
        .and_then(|c| c.longitude)
        .unwrap_or(request.coordinates.longitude);

    for entry in parse_entries::<V3Latest>(latest, "latest value") {
        if collector.is_full() {
            return;
        }

        let Some(parameter) = entry.sensors_id.and_then(|id| sensors.get(&id)) else {
            debug!(sensor_id = ?entry.sensors_id, "latest value has no matching sensor");
            continue;
        };

        let Some(name) = resolve_parameter_name(
            parameter.display_name.as_deref(),
            parameter.name.as_deref(),
            parameter.id,
        ) else {
            continue;
        };

        collector.push(Measurement {
            city: city.clone(),
            country: country.clone(),
            latitude,
            longitude,
            parameter: name,
            value: entry.value.unwrap_or(0.0),
            unit: parameter.units.clone().unwrap_or_default(),
            last_updated: entry.datetime.and_then(|d| d.utc),
        });
    }
}

#[async_trait]
impl AirQualitySource for OpenAqV3Source {
    fn id(&self) -> SourceId {
        SourceId::OpenAqV3
    }

    async fn latest(&self, request: &SourceRequest) -> Result<Vec<Measurement>, FetchError> {
        let locations = self.search_locations(request).await?;
        debug!(count = locations.len(), "openaq v3 locations found");

        let mut collector = ReadingCollector::new();

        for location in &locations {
            if collector.is_full() {
                break;
            }

            let Some(location_id) = location.id.filter(|id| *id > 0) else {
                continue;
            };

            match self.fetch_latest(location_id).await {
                Ok(latest) => collect_latest(location, latest, request, &mut collector),
                Err(err) => {
                    warn!(location_id, error = %err, "failed to fetch latest values for location");
                }
            }
        }

        Ok(collector.finish())
    }
}
