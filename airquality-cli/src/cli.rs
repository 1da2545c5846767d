use std::sync::Arc;

use airquality_core::{
    AirQualityService, AirQualitySource, CanonicalReading, Config, DelayPolicy, InMemoryMetrics,
    MetricsSink, SourceId, TracingMetrics, gazetteer,
    metrics::API_LATENCY,
    model::DEFAULT_COUNTRY,
    service::DEFAULT_RADIUS_M,
    source::{self, synthetic::SyntheticSource},
};
use anyhow::Context;
use chrono::{DateTime, Local};
use clap::{Args, Parser, Subcommand};
use inquire::Password;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "airquality", version, about = "Air quality CLI")]
pub struct Cli {
    #[command(flatten)]
    pub options: QueryOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct QueryOptions {
    /// Source to query instead of the configured default.
    #[arg(long, global = true)]
    pub source: Option<String>,

    /// Print readings as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Add 100-1500 ms of random latency before each query.
    #[arg(long, global = true)]
    pub simulate_latency: bool,

    /// Seed for the synthetic source.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Print call, error and latency metrics to stderr after the query.
    #[arg(long, global = true)]
    pub metrics: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific source and make it the default.
    Configure {
        /// Source id, e.g. "openaq-v3", "openaq-v2" or "synthetic".
        #[arg(value_name = "SOURCE")]
        id: String,
    },

    /// Show latest readings around a city.
    City {
        /// City name, e.g. "Paris". Unknown names use Paris.
        city: String,

        #[arg(long, default_value = DEFAULT_COUNTRY)]
        country: String,
    },

    /// Show latest readings around a point.
    Coords {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Search radius in meters, capped at 25000.
        #[arg(long, default_value_t = DEFAULT_RADIUS_M)]
        radius: u32,
    },

    /// List the cities with known coordinates.
    Cities,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { id } => configure(&id),
            Command::Cities => {
                for (name, coords) in gazetteer::cities() {
                    println!("{name:<20} {:>9.4} {:>9.4}", coords.latitude, coords.longitude);
                }
                Ok(())
            }
            Command::City { city, country } => {
                let (service, metrics) = build_service(&self.options)?;
                let readings = service.query_by_city(&city, &country).await?;
                report(&self.options, &readings, metrics.as_deref())
            }
            Command::Coords {
                latitude,
                longitude,
                radius,
            } => {
                let (service, metrics) = build_service(&self.options)?;
                let readings = service
                    .query_by_coordinates(latitude, longitude, radius)
                    .await?;
                report(&self.options, &readings, metrics.as_deref())
            }
        }
    }
}

fn configure(name: &str) -> anyhow::Result<()> {
    let id = SourceId::try_from(name)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let api_key = Password::new(&format!("API key for {id}:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.upsert_source_key(id, api_key.trim().to_string());
    }
    config.set_default_source(id);
    config.save()?;

    println!(
        "Default source set to {id}. Config saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

fn build_service(
    options: &QueryOptions,
) -> anyhow::Result<(AirQualityService, Option<Arc<InMemoryMetrics>>)> {
    let config = Config::load()?;

    let id = match options.source.as_deref() {
        Some(s) => SourceId::try_from(s)?,
        None => config.default_source_id()?,
    };

    let source: Box<dyn AirQualitySource> = match (id, options.seed) {
        (SourceId::Synthetic, Some(seed)) => Box::new(SyntheticSource::with_seed(seed)),
        _ => source::source_from_config(id, &config)?,
    };

    let delay = if options.simulate_latency {
        DelayPolicy::demo()
    } else {
        config.delay_policy()
    };

    let recorder = options.metrics.then(|| Arc::new(InMemoryMetrics::new()));
    let sink: Arc<dyn MetricsSink> = match &recorder {
        Some(recorder) => recorder.clone(),
        None => Arc::new(TracingMetrics),
    };

    let service = AirQualityService::new(source)
        .with_metrics(sink)
        .with_delay(delay)
        .with_locale(config.label_locale);

    Ok((service, recorder))
}

fn report(
    options: &QueryOptions,
    readings: &[CanonicalReading],
    metrics: Option<&InMemoryMetrics>,
) -> anyhow::Result<()> {
    if options.json {
        println!("{}", serde_json::to_string_pretty(readings)?);
    } else if readings.is_empty() {
        println!("No air quality data found.");
    } else {
        for reading in readings {
            println!("{}", format_reading(reading));
        }
    }

    if let Some(metrics) = metrics {
        for (name, value) in metrics.counters() {
            eprintln!("{name}: {value}");
        }
        for elapsed in metrics.durations(API_LATENCY) {
            eprintln!("{API_LATENCY}: {elapsed:?}");
        }
    }

    Ok(())
}

fn format_reading(r: &CanonicalReading) -> String {
    let updated = r
        .last_updated
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:<6} {:>9.2} {:<7} AQI {:>3} {:<32} {}, {} ({:.4}, {:.4}) @ {}",
        r.parameter,
        r.value,
        r.unit,
        r.aqi,
        r.quality_level,
        r.city,
        r.country,
        r.latitude,
        r.longitude,
        updated,
    )
}

fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> CanonicalReading {
        CanonicalReading {
            city: "Paris".into(),
            country: "FR".into(),
            latitude: 48.8566,
            longitude: 2.3522,
            parameter: "pm25".into(),
            value: 18.25,
            unit: "µg/m³".into(),
            last_updated: Some("not a date".into()),
            aqi: 100,
            quality_level: "Moderate".into(),
        }
    }

    #[test]
    fn parses_city_command_with_default_country() {
        let cli = Cli::try_parse_from(["airquality", "city", "Lyon"]).unwrap();
        match cli.command {
            Command::City { city, country } => {
                assert_eq!(city, "Lyon");
                assert_eq!(country, "FR");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_coords_with_negative_longitude() {
        let cli = Cli::try_parse_from(["airquality", "--json", "coords", "47.2184", "-1.5536"])
            .unwrap();
        assert!(cli.options.json);
        match cli.command {
            Command::Coords {
                latitude,
                longitude,
                radius,
            } => {
                assert_eq!(latitude, 47.2184);
                assert_eq!(longitude, -1.5536);
                assert_eq!(radius, 25_000);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn format_keeps_unparseable_timestamps() {
        let line = format_reading(&reading());
        assert!(line.starts_with("pm25"));
        assert!(line.contains("AQI 100"));
        assert!(line.ends_with("@ not a date"));
    }
}
