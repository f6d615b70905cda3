//! Display choices derived from a snapshot: background theme, icon, and how a
//! comparison delta reads in prose.

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;

use crate::model::WeatherSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    Sunny,
    Rainy,
    Cloudy,
    Snowy,
    Night,
    NightClear,
    NightRainy,
    NightCloudy,
    Default,
}

impl Theme {
    /// Pick a theme from the condition text and the local hour (0-23).
    pub fn select(description: Option<&str>, local_hour: u32) -> Self {
        let condition = description.unwrap_or_default().to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| condition.contains(w));

        if !(6..20).contains(&local_hour) {
            return if has(&["clear"]) {
                Self::NightClear
            } else if has(&["rain"]) {
                Self::NightRainy
            } else if has(&["cloud"]) {
                Self::NightCloudy
            } else {
                Self::Night
            };
        }

        if has(&["rain", "drizzle", "storm"]) {
            Self::Rainy
        } else if has(&["cloud", "overcast", "fog", "mist"]) {
            Self::Cloudy
        } else if has(&["snow"]) {
            Self::Snowy
        } else if has(&["clear", "sunny"]) {
            Self::Sunny
        } else {
            Self::Default
        }
    }

    /// Theme for a snapshot, using its upstream local time or else the capture hour (UTC).
    pub fn for_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let hour = snapshot
            .local_time
            .as_deref()
            .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%d %H:%M").ok())
            .map(|t| t.hour())
            .unwrap_or_else(|| snapshot.captured_at.hour());
        Self::select(snapshot.description.as_deref(), hour)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Rainy => "rainy",
            Self::Cloudy => "cloudy",
            Self::Snowy => "snowy",
            Self::Night => "night",
            Self::NightClear => "night-clear",
            Self::NightRainy => "night-rainy",
            Self::NightCloudy => "night-cloudy",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IconKind {
    Rain,
    Cloud,
    Snow,
    Sun,
}

impl IconKind {
    pub fn from_description(description: Option<&str>) -> Self {
        let desc = description.unwrap_or_default().to_lowercase();
        if desc.contains("rain") {
            Self::Rain
        } else if desc.contains("cloud") {
            Self::Cloud
        } else if desc.contains("snow") {
            Self::Snow
        } else if desc.contains("clear") || desc.contains("sunny") {
            Self::Sun
        } else {
            Self::Cloud
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Rain => "🌧",
            Self::Cloud => "☁",
            Self::Snow => "🌨",
            Self::Sun => "☀",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn of(diff: f64) -> Self {
        if diff > 0.0 {
            Self::Up
        } else if diff < 0.0 {
            Self::Down
        } else {
            Self::Flat
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Humidity,
    Wind,
}

impl Metric {
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Wind => " km/h",
        }
    }

    fn words(&self) -> (&'static str, &'static str) {
        match self {
            Self::Temperature => ("warmer", "colder"),
            Self::Humidity => ("more humid", "drier"),
            Self::Wind => ("windier", "less windy"),
        }
    }
}

/// "3.5°C warmer", "10.0% drier", or "Same".
pub fn describe_delta(metric: Metric, diff: f64) -> String {
    let (more, less) = metric.words();
    match Trend::of(diff) {
        Trend::Up => format!("{:.1}{} {more}", diff.abs(), metric.unit()),
        Trend::Down => format!("{:.1}{} {less}", diff.abs(), metric.unit()),
        Trend::Flat => "Same".to_string(),
    }
}
