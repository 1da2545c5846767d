//! Core library for the `airquality` CLI.
//!
//! This crate defines:
//! - A static gazetteer of French city coordinates
//! - Interchangeable air-quality sources (OpenAQ v3, OpenAQ v2, synthetic)
//!   normalized into one reading shape
//! - AQI and quality level classification
//! - The query service wrapping sources with latency simulation and metrics
//! - Configuration handling
//!
//! It is used by `airquality-cli`, but can also be embedded in an HTTP service.

pub mod aqi;
pub mod config;
pub mod delay;
pub mod error;
pub mod gazetteer;
pub mod metrics;
pub mod model;
pub mod service;
pub mod source;

pub use aqi::{Classification, LabelLocale, QualityLevel, classify};
pub use config::{Config, SourceConfig};
pub use delay::DelayPolicy;
pub use error::FetchError;
pub use metrics::{InMemoryMetrics, MetricsSink, TracingMetrics};
pub use model::{CanonicalReading, Coordinates, Measurement, SourceRequest};
pub use service::AirQualityService;
pub use source::{AirQualitySource, SourceId};
