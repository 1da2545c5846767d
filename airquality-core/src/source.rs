use crate::{
    Config, FetchError,
    model::{Measurement, SourceRequest},
    source::{openaq_v2::OpenAqV2Source, openaq_v3::OpenAqV3Source, synthetic::SyntheticSource},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{collections::HashSet, convert::TryFrom, fmt::Debug};

pub mod http;
pub mod openaq_v2;
pub mod openaq_v3;
pub mod synthetic;

/// Most readings a single query may return.
pub const MAX_READINGS: usize = 10;

/// Environment variable consulted when the config carries no OpenAQ key.
pub const API_KEY_ENV: &str = "OPENAQ_API_KEY";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    /// Two-stage locations + per-location latest lookups.
    OpenAqV3,
    /// Single-stage locations listing with embedded latest values.
    OpenAqV2,
    Synthetic,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceId::OpenAqV3 => "openaq-v3",
            SourceId::OpenAqV2 => "openaq-v2",
            SourceId::Synthetic => "synthetic",
        }
    }

    pub const fn all() -> &'static [SourceId] {
        &[SourceId::OpenAqV3, SourceId::OpenAqV2, SourceId::Synthetic]
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, SourceId::Synthetic)
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openaq-v3" | "openaq" => Ok(SourceId::OpenAqV3),
            "openaq-v2" => Ok(SourceId::OpenAqV2),
            "synthetic" => Ok(SourceId::Synthetic),
            _ => Err(anyhow::anyhow!(
                "Unknown source '{value}'. Supported sources: openaq-v3, openaq-v2, synthetic."
            )),
        }
    }
}

/// Fetch the latest pollutant readings for a location.
///
/// Implementations return at most [`MAX_READINGS`] measurements with unique
/// canonical parameter names.
#[async_trait]
pub trait AirQualitySource: Send + Sync + Debug {
    fn id(&self) -> SourceId;

    async fn latest(&self, request: &SourceRequest) -> Result<Vec<Measurement>, FetchError>;
}

/// Construct a source from config and explicit SourceId.
pub fn source_from_config(
    id: SourceId,
    config: &Config,
) -> anyhow::Result<Box<dyn AirQualitySource>> {
    let settings = config.source_config(id).cloned().unwrap_or_default();

    let api_key = || {
        settings
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No API key configured for source '{id}'.\n\
                     Hint: run `airquality configure {id}` or set {API_KEY_ENV}."
                )
            })
    };

    let boxed: Box<dyn AirQualitySource> = match id {
        SourceId::OpenAqV3 => {
            let mut source = OpenAqV3Source::new(api_key()?);
            if let Some(url) = settings.base_url {
                source = source.with_base_url(url);
            }
            Box::new(source)
        }
        SourceId::OpenAqV2 => {
            let mut source = OpenAqV2Source::new(api_key()?);
            if let Some(url) = settings.base_url {
                source = source.with_base_url(url);
            }
            Box::new(source)
        }
        SourceId::Synthetic => match settings.seed {
            Some(seed) => Box::new(SyntheticSource::with_seed(seed)),
            None => Box::new(SyntheticSource::new()),
        },
    };

    Ok(boxed)
}

/// Construct the default source from config, using `default_source` field.
pub fn default_source_from_config(config: &Config) -> anyhow::Result<Box<dyn AirQualitySource>> {
    let id = config.default_source_id()?;
    source_from_config(id, config)
}

/// Lower-case, strip separators and fold subscript digits so "PM2.5",
/// "pm25" and "NO₂"/"no2" compare equal.
pub fn canonical_parameter(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | '_' | '-' | ' '))
        .map(fold_subscript)
        .flat_map(char::to_lowercase)
        .collect()
}

fn fold_subscript(c: char) -> char {
    match c {
        '₀'..='₉' => char::from_digit(c as u32 - '₀' as u32, 10).unwrap_or(c),
        _ => c,
    }
}

/// Pick the best label for a pollutant: display name, short name, then id.
pub(crate) fn resolve_parameter_name(
    display_name: Option<&str>,
    name: Option<&str>,
    id: Option<i64>,
) -> Option<String> {
    let non_empty = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(String::from);

    non_empty(display_name)
        .or_else(|| non_empty(name))
        .or_else(|| id.map(|id| id.to_string()))
        .map(|label| canonical_parameter(&label))
        .filter(|label| !label.is_empty())
}

/// Decode each raw entry on its own; malformed ones are logged and skipped.
pub(crate) fn parse_entries<T: DeserializeOwned>(entries: Vec<Value>, kind: &str) -> Vec<T> {
    entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                tracing::warn!(index, kind, error = %err, "skipping malformed entry");
                None
            }
        })
        .collect()
}

/// Accumulates measurements, dropping repeated parameters and stopping at the cap.
#[derive(Debug, Default)]
pub(crate) struct ReadingCollector {
    seen: HashSet<String>,
    readings: Vec<Measurement>,
}

impl ReadingCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.readings.len() >= MAX_READINGS
    }

    /// Returns whether the measurement was kept.
    pub fn push(&mut self, measurement: Measurement) -> bool {
        if self.is_full() || !self.seen.insert(measurement.parameter.clone()) {
            return false;
        }
        self.readings.push(measurement);
        true
    }

    pub fn finish(self) -> Vec<Measurement> {
        self.readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn measurement(parameter: &str, value: f64) -> Measurement {
        Measurement {
            city: "Paris".into(),
            country: "FR".into(),
            latitude: 48.8566,
            longitude: 2.3522,
            parameter: parameter.into(),
            value,
            unit: "µg/m³".into(),
            last_updated: None,
        }
    }

    #[test]
    fn source_id_as_str_roundtrip() {
        for id in SourceId::all() {
            let s = id.as_str();
            let parsed = SourceId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn source_id_parsing_ignores_case() {
        assert_eq!(SourceId::try_from("OpenAQ-V2").unwrap(), SourceId::OpenAqV2);
    }

    #[test]
    fn unknown_source_error() {
        let err = SourceId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown source"));
    }

    #[test]
    fn synthetic_needs_no_key() {
        let cfg = Config::default();
        let source = source_from_config(SourceId::Synthetic, &cfg).expect("synthetic source");
        assert_eq!(source.id(), SourceId::Synthetic);
    }

    #[test]
    fn default_source_is_synthetic_when_unset() {
        let cfg = Config::default();
        let source = default_source_from_config(&cfg).expect("default source");
        assert_eq!(source.id(), SourceId::Synthetic);
    }

    #[test]
    fn live_source_uses_configured_key() {
        let mut cfg = Config::default();
        cfg.upsert_source_key(SourceId::OpenAqV3, "KEY".to_string());

        let source = source_from_config(SourceId::OpenAqV3, &cfg).expect("configured source");
        assert_eq!(source.id(), SourceId::OpenAqV3);
    }

    #[test]
    fn canonical_parameter_strips_separators() {
        assert_eq!(canonical_parameter("PM2.5"), "pm25");
        assert_eq!(canonical_parameter("pm25"), "pm25");
        assert_eq!(canonical_parameter("NO₂"), "no2");
        assert_eq!(canonical_parameter("O₃"), "o3");
        assert_eq!(canonical_parameter("SO₂"), "so2");
        assert_eq!(canonical_parameter("pm_10"), "pm10");
    }

    #[test]
    fn name_resolution_priority() {
        assert_eq!(
            resolve_parameter_name(Some("PM2.5"), Some("pm25"), Some(2)),
            Some("pm25".to_string())
        );
        assert_eq!(
            resolve_parameter_name(Some(""), Some("no2"), Some(7)),
            Some("no2".to_string())
        );
        assert_eq!(
            resolve_parameter_name(Some("NO₂"), Some("no2"), Some(7)),
            Some("no2".to_string())
        );
        assert_eq!(resolve_parameter_name(None, None, Some(7)), Some("7".to_string()));
        assert_eq!(resolve_parameter_name(None, Some("  "), None), None);
    }

    #[test]
    fn parse_entries_skips_malformed() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Entry {
            value: f64,
        }

        let entries = vec![
            serde_json::json!({ "value": 1.5 }),
            serde_json::json!({ "value": "oops" }),
            serde_json::json!(null),
            serde_json::json!({ "value": 3 }),
        ];

        let parsed: Vec<Entry> = parse_entries(entries, "entry");
        assert_eq!(parsed, vec![Entry { value: 1.5 }, Entry { value: 3.0 }]);
    }

    #[test]
    fn collector_keeps_first_occurrence() {
        let mut collector = ReadingCollector::new();
        assert!(collector.push(measurement("pm25", 10.0)));
        assert!(!collector.push(measurement("pm25", 99.0)));
        assert!(collector.push(measurement("no2", 5.0)));

        let readings = collector.finish();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].value, 10.0);
    }

    #[test]
    fn collector_caps_results() {
        let mut collector = ReadingCollector::new();
        for i in 0..25 {
            collector.push(measurement(&format!("p{i}"), i as f64));
        }
        assert!(collector.is_full());
        assert_eq!(collector.finish().len(), MAX_READINGS);
    }
}
