//! Freshness rules for reusing saved lookups instead of calling the provider.
//!
//! A city is served from history when the *first* saved entry for it (in the
//! store's most-recent-first order, case-insensitive, ignoring entries without
//! a temperature) is younger than the freshness window. A stale first match is
//! not skipped in favour of an older-listed fresh one.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::error::WeatherError;
use crate::model::{HistoryEntry, Resolved, Source, WeatherSnapshot};
use crate::provider::WeatherProvider;

/// Validity period of a saved snapshot, in milliseconds.
pub const FRESHNESS_WINDOW_MS: i64 = 5 * 3600 * 1000;

/// First qualifying history entry per lowercased city name.
///
/// Equivalent to a linear scan over the list it was built from; rebuild it
/// whenever that list changes.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    by_city: HashMap<String, HistoryEntry>,
}

impl HistoryIndex {
    pub fn build(entries: &[HistoryEntry]) -> Self {
        let mut by_city = HashMap::new();
        for entry in entries.iter().filter(|e| e.has_reading()) {
            by_city.entry(entry.city.to_lowercase()).or_insert_with(|| entry.clone());
        }
        Self { by_city }
    }

    pub fn first_match(&self, city: &str) -> Option<&HistoryEntry> {
        self.by_city.get(&city.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_city.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_city.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheDecision {
    Hit(WeatherSnapshot),
    Miss(MissReason),
}

impl CacheDecision {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissReason {
    NoMatch,
    Stale { age: Duration },
}

#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    window: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self { window: Duration::milliseconds(FRESHNESS_WINDOW_MS) }
    }
}

impl FreshnessPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn is_fresh(&self, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - created_at < self.window
    }

    /// Decide between the saved snapshot and a live fetch without any I/O.
    pub fn decide(&self, city: &str, index: &HistoryIndex, now: DateTime<Utc>) -> CacheDecision {
        let Some(entry) = index.first_match(city) else {
            return CacheDecision::Miss(MissReason::NoMatch);
        };

        if !self.is_fresh(entry.created_at, now) {
            return CacheDecision::Miss(MissReason::Stale { age: now - entry.created_at });
        }

        match entry.to_snapshot() {
            Some(snapshot) => CacheDecision::Hit(snapshot),
            None => CacheDecision::Miss(MissReason::NoMatch),
        }
    }

    /// Serve `city` from history when fresh, otherwise from the provider.
    ///
    /// Never writes to the history store.
    pub async fn resolve(
        &self,
        city: &str,
        index: &HistoryIndex,
        provider: &dyn WeatherProvider,
        now: DateTime<Utc>,
    ) -> Result<Resolved, WeatherError> {
        match self.decide(city, index, now) {
            CacheDecision::Hit(snapshot) => {
                tracing::debug!(city, captured_at = %snapshot.captured_at, "serving weather from history");
                Ok(Resolved { source: Source::Cache, snapshot })
            }
            CacheDecision::Miss(reason) => {
                tracing::debug!(city, ?reason, "history miss, fetching live weather");
                let snapshot = fetch_live(city, provider, now).await?;
                Ok(Resolved { source: Source::Live, snapshot })
            }
        }
    }
}

/// Fetch and normalize current weather for `city`.
pub async fn fetch_live(
    city: &str,
    provider: &dyn WeatherProvider,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let payload = provider.fetch(city).await.map_err(|failure| {
        tracing::warn!(city, %failure, "weather provider failed");
        WeatherError::provider(city, failure)
    })?;
    WeatherSnapshot::from_payload(city, payload, now)
}
