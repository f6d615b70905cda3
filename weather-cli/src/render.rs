//! Plain-text rendering of lookups, comparisons and history.

use std::fmt::{Display, Write};

use weather_core::{
    ComparisonResult, HistoryEntry, PostalAddress, Resolved, Winner,
    display::{IconKind, Metric, Theme, Trend, describe_delta},
};

const MISSING: &str = "N/A";

fn or_missing<T: Display>(value: Option<T>, unit: &str) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v}{unit}"))
}

fn one_decimal(value: Option<f64>, unit: &str) -> String {
    or_missing(value.map(|v| format!("{v:.1}")), unit)
}

pub fn lookup(resolved: &Resolved) -> String {
    let s = &resolved.snapshot;
    let conditions = s.conditions();
    let icon = IconKind::from_description(s.description.as_deref());
    let mut out = String::new();

    let _ = writeln!(out, "{} {}  [{}]", icon.glyph(), s.display_name(), Theme::for_snapshot(s));
    if let Some(region) = &s.region {
        let _ = writeln!(out, "  Region         {region}");
    }
    if let Some(local_time) = &s.local_time {
        let _ = writeln!(out, "  Local time     {local_time}");
    }
    let _ = writeln!(
        out,
        "  Temperature    {:.1}°C (feels like {})",
        s.temperature_c,
        one_decimal(s.feels_like_c, "°C")
    );
    let _ = writeln!(out, "  Conditions     {}", s.description.as_deref().unwrap_or(MISSING));
    let _ = writeln!(out, "  Humidity       {}", or_missing(s.humidity_pct, "%"));
    let _ = writeln!(out, "  Wind           {} {}", one_decimal(s.wind_speed_kmh, " km/h"), conditions.wind_dir);
    let _ = writeln!(out, "  Pressure       {} mb", conditions.pressure_mb);
    let _ = writeln!(out, "  Precipitation  {} mm", conditions.precip_mm);
    let _ = writeln!(out, "  UV index       {}", conditions.uv_index);
    let _ = writeln!(out, "  Visibility     {} km", conditions.visibility_km);

    let source = if resolved.is_from_cache() {
        format!("saved search from {}", s.captured_at.format("%d/%m/%Y %H:%M UTC"))
    } else {
        "live".to_string()
    };
    let _ = write!(out, "  Source         {source}");
    out
}

pub fn postal(address: &PostalAddress) -> String {
    match &address.state {
        Some(state) => format!("{}: {} - {}", address.postal_code, address.city, state),
        None => format!("{}: {}", address.postal_code, address.city),
    }
}

pub fn comparison(result: &ComparisonResult) -> String {
    let (left, right) = (&result.left.snapshot, &result.right.snapshot);
    let d = &result.deltas;
    let mut out = String::new();

    let _ = writeln!(out, "{}  vs  {}", left.display_name(), right.display_name());

    let rows = [
        (
            "Temperature",
            format!("{:.1}°C", left.temperature_c),
            format!("{:.1}°C", right.temperature_c),
            Metric::Temperature,
            d.temperature_diff,
        ),
        (
            "Humidity",
            or_missing(left.humidity_pct, "%"),
            or_missing(right.humidity_pct, "%"),
            Metric::Humidity,
            d.humidity_diff as f64,
        ),
        (
            "Wind",
            one_decimal(left.wind_speed_kmh, " km/h"),
            one_decimal(right.wind_speed_kmh, " km/h"),
            Metric::Wind,
            d.wind_speed_diff,
        ),
    ];
    for (label, a, b, metric, diff) in rows {
        let _ = writeln!(
            out,
            "  {label:<12} {a:>10} | {b:<10} {} {}",
            Trend::of(diff).arrow(),
            describe_delta(metric, diff)
        );
    }

    let verdict = match result.winner {
        Winner::Left => format!("Better weather: {}", left.city),
        Winner::Right => format!("Better weather: {}", right.city),
        Winner::Tie => "No clear winner".to_string(),
    };
    let _ = write!(out, "{verdict} ({}-{})", result.scores.left, result.scores.right);
    if result.served_from_history() {
        out.push_str("\n  (both cities served from saved searches)");
    }
    out
}

pub fn history(entries: &[&HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No saved searches.".to_string();
    }

    entries
        .iter()
        .map(|e| {
            format!(
                "{}  {:<24} {:>8}  {}",
                e.created_at.format("%d/%m/%Y %H:%M"),
                e.city,
                one_decimal(e.temperature_c, "°C"),
                e.postal_code.as_deref().unwrap_or("")
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
