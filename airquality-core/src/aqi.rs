//! Simplified AQI derivation from a single pollutant concentration.
//!
//! PM2.5 and PM10 use fixed breakpoint tables; every other pollutant uses a
//! linear `value * 2` estimate capped at 500.

use serde::{Deserialize, Serialize};

pub const MAX_AQI: u16 = 500;

/// (upper bound inclusive, aqi)
const PM25_BREAKPOINTS: &[(f64, u16)] = &[
    (12.0, 50),
    (35.4, 100),
    (55.4, 150),
    (150.4, 200),
    (250.4, 300),
];

const PM10_BREAKPOINTS: &[(f64, u16)] = &[
    (54.0, 50),
    (154.0, 100),
    (254.0, 150),
    (354.0, 200),
    (424.0, 300),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityLevel {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl QualityLevel {
    pub fn from_aqi(aqi: u16) -> Self {
        match aqi {
            0..=50 => QualityLevel::Good,
            51..=100 => QualityLevel::Moderate,
            101..=150 => QualityLevel::UnhealthyForSensitiveGroups,
            151..=200 => QualityLevel::Unhealthy,
            201..=300 => QualityLevel::VeryUnhealthy,
            _ => QualityLevel::Hazardous,
        }
    }

    pub fn label(&self, locale: LabelLocale) -> &'static str {
        match locale {
            LabelLocale::English => match self {
                QualityLevel::Good => "Good",
                QualityLevel::Moderate => "Moderate",
                QualityLevel::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
                QualityLevel::Unhealthy => "Unhealthy",
                QualityLevel::VeryUnhealthy => "Very Unhealthy",
                QualityLevel::Hazardous => "Hazardous",
            },
            LabelLocale::French => match self {
                QualityLevel::Good => "Bon",
                QualityLevel::Moderate => "Moyen",
                QualityLevel::UnhealthyForSensitiveGroups => "Dégradé",
                QualityLevel::Unhealthy => "Mauvais",
                QualityLevel::VeryUnhealthy => "Très mauvais",
                QualityLevel::Hazardous => "Extrême",
            },
        }
    }
}

/// Language of the quality level labels. Thresholds are identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelLocale {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
}

impl LabelLocale {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelLocale::English => "en",
            LabelLocale::French => "fr",
        }
    }
}

impl TryFrom<&str> for LabelLocale {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "en" | "english" => Ok(LabelLocale::English),
            "fr" | "french" => Ok(LabelLocale::French),
            _ => Err(anyhow::anyhow!(
                "Unknown label locale '{value}'. Supported locales: en, fr."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub aqi: u16,
    pub level: QualityLevel,
}

/// Map a pollutant reading to its AQI and quality level.
///
/// Parameter matching is case-insensitive. NaN is treated as 0 and negative
/// concentrations clamp to an AQI of 0 on the linear path.
pub fn classify(parameter: Option<&str>, value: f64) -> Classification {
    let aqi = aqi_for(parameter, value);
    Classification {
        aqi,
        level: QualityLevel::from_aqi(aqi),
    }
}

fn aqi_for(parameter: Option<&str>, value: f64) -> u16 {
    let value = if value.is_nan() { 0.0 } else { value };

    match parameter.map(str::to_lowercase).as_deref() {
        Some("pm25") => from_breakpoints(PM25_BREAKPOINTS, value),
        Some("pm10") => from_breakpoints(PM10_BREAKPOINTS, value),
        _ => linear(value),
    }
}

fn from_breakpoints(table: &[(f64, u16)], value: f64) -> u16 {
    table
        .iter()
        .find(|(upper, _)| value <= *upper)
        .map(|(_, aqi)| *aqi)
        .unwrap_or(MAX_AQI)
}

fn linear(value: f64) -> u16 {
    // Truncates toward zero, matching an integer cast of the product.
    (value * 2.0).clamp(0.0, MAX_AQI as f64) as u16
}
