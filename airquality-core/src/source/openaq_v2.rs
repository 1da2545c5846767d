use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    FetchError,
    model::{Measurement, QueryScope, SourceRequest},
    source::{
        AirQualitySource, ReadingCollector, SourceId,
        http::{JsonClient, PRIMARY_TIMEOUT},
        parse_entries, resolve_parameter_name,
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.openaq.org/v2";

const LOCATION_LIMIT: &str = "20";

/// OpenAQ v2: one request to the locations listing, whose entries already
/// carry the last value of every parameter.
#[derive(Debug, Clone)]
pub struct OpenAqV2Source {
    client: JsonClient,
}

impl OpenAqV2Source {
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
}

fn query_params(request: &SourceRequest) -> Vec<(&'static str, String)> {
    let mut params = match request.scope {
        QueryScope::City => vec![
            ("city", request.city.clone()),
            ("country", request.country.clone()),
        ],
        QueryScope::Point => vec![
            (
                "coordinates",
                format!(
                    "{},{}",
                    request.coordinates.latitude, request.coordinates.longitude
                ),
            ),
            ("radius", request.radius_m.to_string()),
        ],
    };
    params.push(("limit", LOCATION_LIMIT.to_string()));
    params
}

#[derive(Debug, Default, Deserialize)]
struct V2Envelope {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V2Location {
    name: Option<String>,
    city: Option<String>,
    country: Option<String>,
    coordinates: Option<V2Coordinates>,
    parameters: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct V2Coordinates {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct V2Parameter {
    id: Option<i64>,
    parameter: Option<String>,
    display_name: Option<String>,
    unit: Option<String>,
    last_value: Option<f64>,
    last_updated: Option<String>,
}

fn normalize(results: Vec<Value>, request: &SourceRequest) -> Vec<Measurement> {
    let mut collector = ReadingCollector::new();

    for location in parse_entries::<V2Location>(results, "location") {
        let city = location
            .name
            .or(location.city)
            .unwrap_or_else(|| request.city.clone());
        let country = location.country.unwrap_or_else(|| request.country.clone());
        let coords = location.coordinates.unwrap_or_default();
        let latitude = coords.latitude.unwrap_or(request.coordinates.latitude);
        let longitude = coords.longitude.unwrap_or(request.coordinates.longitude);

        for parameter in parse_entries::<V2Parameter>(location.parameters, "parameter") {
            if collector.is_full() {
                return collector.finish();
            }

            let Some(name) = resolve_parameter_name(
                parameter.display_name.as_deref(),
                parameter.parameter.as_deref(),
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
                value: parameter.last_value.unwrap_or(0.0),
                unit: parameter.unit.unwrap_or_default(),
                last_updated: parameter.last_updated,
            });
        }
    }

    collector.finish()
}

#[async_trait]
impl AirQualitySource for OpenAqV2Source {
    fn id(&self) -> SourceId {
        SourceId::OpenAqV2
    }

    async fn latest(&self, request: &SourceRequest) -> Result<Vec<Measurement>, FetchError> {
        let envelope: V2Envelope = self
            .client
            .get("/locations", &query_params(request), PRIMARY_TIMEOUT)
            .await?;

        debug!(count = envelope.results.len(), "openaq v2 locations found");
        Ok(normalize(envelope.results, request))
    }
}
