use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::WeatherError;

/// One normalized weather reading for a city at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub city: String,
    pub country: String,
    pub region: Option<String>,
    /// Upstream local time at the city, as reported (`YYYY-MM-DD HH:MM`).
    #[serde(rename = "localtime")]
    pub local_time: Option<String>,
    #[serde(rename = "temperature")]
    pub temperature_c: f64,
    #[serde(rename = "humidity")]
    pub humidity_pct: Option<i64>,
    #[serde(rename = "wind_speed")]
    pub wind_speed_kmh: Option<f64>,
    #[serde(rename = "feelslike")]
    pub feels_like_c: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub captured_at: DateTime<Utc>,
    /// Full upstream payload; fields not promoted above are read through [`Conditions`].
    #[serde(rename = "raw_data")]
    pub raw: Value,
}

impl WeatherSnapshot {
    /// Normalize a Weatherstack-shaped payload.
    ///
    /// A payload without a temperature carries no usable data and is rejected,
    /// so it can never be displayed or saved.
    pub fn from_payload(
        city_query: &str,
        payload: Value,
        captured_at: DateTime<Utc>,
    ) -> Result<Self, WeatherError> {
        let parsed: WsPayload = serde_json::from_value(payload.clone())
            .map_err(|e| WeatherError::provider(city_query, format!("malformed response: {e}")))?;

        let location = parsed.location.unwrap_or_default();
        let current = parsed.current.unwrap_or_default();

        let temperature_c = current.temperature.ok_or_else(|| WeatherError::Provider {
            city: city_query.to_string(),
            message: format!("No weather data available for {city_query}"),
        })?;

        let city = non_empty(location.name).unwrap_or_else(|| city_query.to_string());
        let country = location.country.unwrap_or_default();
        if city.trim().is_empty() && country.trim().is_empty() {
            return Err(WeatherError::provider(city_query, "response does not identify a location"));
        }

        Ok(Self {
            city,
            country,
            region: non_empty(location.region),
            local_time: non_empty(location.localtime),
            temperature_c,
            humidity_pct: current.humidity.map(|h| h.round() as i64),
            wind_speed_kmh: current.wind_speed,
            feels_like_c: current.feelslike,
            description: current.weather_descriptions.into_iter().next(),
            icon: current.weather_icons.into_iter().next(),
            captured_at,
            raw: payload,
        })
    }

    pub fn conditions(&self) -> Conditions {
        Conditions::from_raw(&self.raw)
    }

    /// `"City, Country"`, or whichever half is present.
    pub fn display_name(&self) -> String {
        match (self.city.is_empty(), self.country.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.country),
            (false, true) => self.city.clone(),
            _ => self.country.clone(),
        }
    }
}

/// Display-only readings kept inside the raw payload.
///
/// | field         | source               | default |
/// |---------------|----------------------|---------|
/// | wind_dir      | `current.wind_dir`   | `"N/A"` |
/// | pressure_mb   | `current.pressure`   | `0`     |
/// | precip_mm     | `current.precip`     | `0`     |
/// | uv_index      | `current.uv_index`   | `0`     |
/// | visibility_km | `current.visibility` | `0`     |
///
/// Absent, null and empty values fall back to the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub wind_dir: String,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub uv_index: f64,
    pub visibility_km: f64,
}

impl Conditions {
    pub const MISSING_TEXT: &'static str = "N/A";

    pub fn from_raw(raw: &Value) -> Self {
        let number = |key: &str| {
            raw.pointer(&format!("/current/{key}"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
        };

        let wind_dir = raw
            .pointer("/current/wind_dir")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(Self::MISSING_TEXT)
            .to_string();

        Self {
            wind_dir,
            pressure_mb: number("pressure"),
            precip_mm: number("precip"),
            uv_index: number("uv_index"),
            visibility_km: number("visibility"),
        }
    }
}

/// Where a resolved snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Cache,
    Live,
}

/// A snapshot together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolved {
    pub source: Source,
    pub snapshot: WeatherSnapshot,
}

impl Resolved {
    pub fn is_from_cache(&self) -> bool {
        self.source == Source::Cache
    }
}

/// A saved lookup. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub city: String,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    #[serde(rename = "temperature")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "humidity")]
    pub humidity_pct: Option<i64>,
    #[serde(rename = "wind_speed")]
    pub wind_speed_kmh: Option<f64>,
    #[serde(rename = "feelslike")]
    pub feels_like_c: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "raw_data")]
    pub raw: Option<Value>,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Whether this entry carries a usable reading.
    pub fn has_reading(&self) -> bool {
        self.temperature_c.is_some()
    }

    /// Rebuild the snapshot this entry was saved from; `None` without a temperature.
    pub fn to_snapshot(&self) -> Option<WeatherSnapshot> {
        let temperature_c = self.temperature_c?;
        let raw = self.raw.clone().unwrap_or(Value::Null);
        let region = raw.pointer("/location/region").and_then(Value::as_str).map(str::to_string);
        let local_time = raw.pointer("/location/localtime").and_then(Value::as_str).map(str::to_string);

        Some(WeatherSnapshot {
            city: self.city.clone(),
            country: self.country.clone().unwrap_or_default(),
            region: region.filter(|s| !s.is_empty()),
            local_time: local_time.filter(|s| !s.is_empty()),
            temperature_c,
            humidity_pct: self.humidity_pct,
            wind_speed_kmh: self.wind_speed_kmh,
            feels_like_c: self.feels_like_c,
            description: self.description.clone(),
            icon: self.icon.clone(),
            captured_at: self.created_at,
            raw,
        })
    }
}

/// Payload for appending to the search history. Only `city` is required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, alias = "cep")]
    pub postal_code: Option<String>,
    #[serde(default, rename = "temperature")]
    pub temperature_c: Option<f64>,
    #[serde(default, rename = "humidity", deserialize_with = "rounded")]
    pub humidity_pct: Option<i64>,
    #[serde(default, rename = "wind_speed")]
    pub wind_speed_kmh: Option<f64>,
    #[serde(default, rename = "feelslike")]
    pub feels_like_c: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default, rename = "raw_data")]
    pub raw: Option<Value>,
}

impl NewHistoryEntry {
    pub fn from_snapshot(snapshot: &WeatherSnapshot, postal_code: Option<String>) -> Self {
        Self {
            city: snapshot.city.clone(),
            country: Some(snapshot.country.clone()).filter(|c| !c.is_empty()),
            postal_code,
            temperature_c: Some(snapshot.temperature_c),
            humidity_pct: snapshot.humidity_pct,
            wind_speed_kmh: snapshot.wind_speed_kmh,
            feels_like_c: snapshot.feels_like_c,
            description: snapshot.description.clone(),
            icon: snapshot.icon.clone(),
            raw: Some(snapshot.raw.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), WeatherError> {
        if self.city.trim().is_empty() {
            return Err(WeatherError::Validation("The city field is required.".to_string()));
        }
        Ok(())
    }
}

/// Row of the simple weather-record log. No field is validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub id: i64,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub temperature: Option<f64>,
    pub humidity: Option<i64>,
    pub wind_speed: Option<f64>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub raw_data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewWeatherRecord {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, alias = "cep")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "rounded")]
    pub humidity: Option<i64>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub raw_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct WsPayload {
    location: Option<WsLocation>,
    current: Option<WsCurrent>,
}

#[derive(Debug, Default, Deserialize)]
struct WsLocation {
    name: Option<String>,
    country: Option<String>,
    region: Option<String>,
    localtime: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WsCurrent {
    temperature: Option<f64>,
    humidity: Option<f64>,
    wind_speed: Option<f64>,
    feelslike: Option<f64>,
    #[serde(default)]
    weather_descriptions: Vec<String>,
    #[serde(default)]
    weather_icons: Vec<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// `null` reads as an empty string, which validation then rejects.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Any JSON number, rounded to the nearest integer.
fn rounded<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.map(|n| n.round() as i64))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use serde_json::json;

    pub fn payload(city: &str, temperature: f64, humidity: i64, wind_speed: f64) -> Value {
        json!({
            "location": {
                "name": city,
                "country": "Brazil",
                "region": "Sao Paulo",
                "localtime": "2026-10-19 14:00"
            },
            "current": {
                "temperature": temperature,
                "weather_descriptions": ["Partly cloudy"],
                "weather_icons": ["https://cdn.example/icons/partly.png"],
                "humidity": humidity,
                "wind_speed": wind_speed,
                "feelslike": temperature + 1.0,
                "wind_dir": "SE",
                "pressure": 1015,
                "precip": 0.2,
                "uv_index": 6,
                "visibility": 10
            }
        })
    }

    pub fn entry(id: i64, city: &str, created_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            id,
            city: city.to_string(),
            country: Some("Brazil".to_string()),
            postal_code: None,
            temperature_c: Some(25.0),
            humidity_pct: Some(60),
            wind_speed_kmh: Some(12.0),
            feels_like_c: Some(26.0),
            description: Some("Sunny".to_string()),
            icon: None,
            raw: Some(payload(city, 25.0, 60, 12.0)),
            created_at,
        }
    }
}
