//! Request and response bodies for the REST API.
//!
//! Stored history entries and weather records are served with the core types'
//! own serde representation; history listings drop the raw payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use weather_core::{ComparisonResult, Deltas, Source, WeatherSnapshot, Winner};

pub use weather_core::{HistoryEntry, NewHistoryEntry, NewWeatherRecord, PostalAddress, WeatherRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /weather/{city}` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub city: String,
    pub country: String,
    pub region: Option<String>,
    pub localtime: Option<String>,
    pub temperature: f64,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub wind_speed: Option<f64>,
    pub humidity: Option<i64>,
    pub feelslike: Option<f64>,
    pub raw_data: Value,
}

impl From<WeatherSnapshot> for WeatherResponse {
    fn from(s: WeatherSnapshot) -> Self {
        Self {
            city: s.city,
            country: s.country,
            region: s.region,
            localtime: s.local_time,
            temperature: s.temperature_c,
            description: s.description,
            icon: s.icon,
            wind_speed: s.wind_speed_kmh,
            humidity: s.humidity_pct,
            feelslike: s.feels_like_c,
            raw_data: s.raw,
        }
    }
}

/// `GET /history` item: a saved entry without `raw_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryListItem {
    pub id: i64,
    pub city: String,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub feelslike: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryEntry> for HistoryListItem {
    fn from(e: HistoryEntry) -> Self {
        Self {
            id: e.id,
            city: e.city,
            country: e.country,
            postal_code: e.postal_code,
            temperature: e.temperature_c,
            humidity: e.humidity_pct,
            wind_speed: e.wind_speed_kmh,
            feelslike: e.feels_like_c,
            description: e.description,
            icon: e.icon,
            created_at: e.created_at,
        }
    }
}

/// `POST /weather/compare` body. Fields are optional so a missing one
/// surfaces as a validation message rather than a decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub city1: Option<String>,
    #[serde(default)]
    pub city2: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitySummary {
    pub city: String,
    pub country: String,
    pub temperature: f64,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub feelslike: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub source: Source,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonDeltas {
    pub temperature_diff: f64,
    pub humidity_diff: i64,
    pub wind_speed_diff: f64,
}

impl From<Deltas> for ComparisonDeltas {
    fn from(d: Deltas) -> Self {
        Self {
            temperature_diff: d.temperature_diff,
            humidity_diff: d.humidity_diff,
            wind_speed_diff: d.wind_speed_diff,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResponse {
    pub success: bool,
    pub city1: CitySummary,
    pub city2: CitySummary,
    pub comparison: ComparisonDeltas,
    /// `"city1"`, `"city2"` or `"tie"`.
    pub winner: String,
}

impl From<ComparisonResult> for CompareResponse {
    fn from(result: ComparisonResult) -> Self {
        let summary = |source: Source, s: WeatherSnapshot| CitySummary {
            city: s.city,
            country: s.country,
            temperature: s.temperature_c,
            humidity: s.humidity_pct,
            wind_speed: s.wind_speed_kmh,
            feelslike: s.feels_like_c,
            description: s.description,
            icon: s.icon,
            source,
        };
        let winner = match result.winner {
            Winner::Left => "city1",
            Winner::Right => "city2",
            Winner::Tie => "tie",
        };

        Self {
            success: true,
            city1: summary(result.left.source, result.left.snapshot),
            city2: summary(result.right.source, result.right.snapshot),
            comparison: result.deltas.into(),
            winner: winner.to_string(),
        }
    }
}
