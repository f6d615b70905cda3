//! Two-city comparison: resolution, signed deltas and the "nicer weather" heuristic.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheDecision, FreshnessPolicy, HistoryIndex, fetch_live};
use crate::error::WeatherError;
use crate::model::{Resolved, Source, WeatherSnapshot};
use crate::provider::WeatherProvider;

pub const IDEAL_TEMPERATURE_C: f64 = 22.0;
pub const IDEAL_HUMIDITY_PCT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Left,
    Right,
    Tie,
}

impl Winner {
    /// The same verdict seen with the operands swapped.
    pub fn swapped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Tie => Self::Tie,
        }
    }
}

/// Signed differences, always `left - right`. Missing readings count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deltas {
    pub temperature_diff: f64,
    pub humidity_diff: i64,
    pub wind_speed_diff: f64,
}

impl Deltas {
    pub fn between(left: &WeatherSnapshot, right: &WeatherSnapshot) -> Self {
        Self {
            temperature_diff: left.temperature_c - right.temperature_c,
            humidity_diff: left.humidity_pct.unwrap_or(0) - right.humidity_pct.unwrap_or(0),
            wind_speed_diff: left.wind_speed_kmh.unwrap_or(0.0) - right.wind_speed_kmh.unwrap_or(0.0),
        }
    }
}

/// Points per side after the three metric awards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    pub left: u8,
    pub right: u8,
}

impl Scoreboard {
    /// Award one point per metric, in order: temperature, humidity, wind.
    ///
    /// Each award is a single strict `<` test won by the left side; anything
    /// else, including equality, goes to the right side.
    pub fn score(left: &WeatherSnapshot, right: &WeatherSnapshot) -> Self {
        let mut board = Self::default();

        let temp_distance = |s: &WeatherSnapshot| (s.temperature_c - IDEAL_TEMPERATURE_C).abs();
        board.award(temp_distance(left) < temp_distance(right));

        let humidity_distance = |s: &WeatherSnapshot| (s.humidity_pct.unwrap_or(0) - IDEAL_HUMIDITY_PCT).abs();
        board.award(humidity_distance(left) < humidity_distance(right));

        board.award(left.wind_speed_kmh.unwrap_or(0.0) < right.wind_speed_kmh.unwrap_or(0.0));

        board
    }

    fn award(&mut self, to_left: bool) {
        if to_left {
            self.left += 1;
        } else {
            self.right += 1;
        }
    }

    pub fn winner(&self) -> Winner {
        use std::cmp::Ordering;
        match self.left.cmp(&self.right) {
            Ordering::Greater => Winner::Left,
            Ordering::Less => Winner::Right,
            Ordering::Equal => Winner::Tie,
        }
    }
}

/// Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub left: Resolved,
    pub right: Resolved,
    pub deltas: Deltas,
    pub scores: Scoreboard,
    pub winner: Winner,
}

impl ComparisonResult {
    pub fn from_snapshots(left: Resolved, right: Resolved) -> Self {
        let deltas = Deltas::between(&left.snapshot, &right.snapshot);
        let scores = Scoreboard::score(&left.snapshot, &right.snapshot);
        Self { left, right, deltas, winner: scores.winner(), scores }
    }

    /// Snapshot judged to have the nicer weather, if any.
    pub fn winning_snapshot(&self) -> Option<&WeatherSnapshot> {
        match self.winner {
            Winner::Left => Some(&self.left.snapshot),
            Winner::Right => Some(&self.right.snapshot),
            Winner::Tie => None,
        }
    }

    /// True when neither side needed a provider call.
    pub fn served_from_history(&self) -> bool {
        self.left.is_from_cache() && self.right.is_from_cache()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEngine {
    policy: FreshnessPolicy,
}

impl ComparisonEngine {
    pub fn new(policy: FreshnessPolicy) -> Self {
        Self { policy }
    }

    /// Compare `city_a` (left) with `city_b` (right).
    ///
    /// Names are trimmed, then checked before any network call. Sides that miss the
    /// history are fetched concurrently; the first failure aborts the
    /// comparison with an error naming that city.
    pub async fn compare(
        &self,
        city_a: &str,
        city_b: &str,
        index: &HistoryIndex,
        provider: &dyn WeatherProvider,
        now: DateTime<Utc>,
    ) -> Result<ComparisonResult, WeatherError> {
        let (city_a, city_b) = (city_a.trim(), city_b.trim());
        if city_a.is_empty() || city_b.is_empty() {
            return Err(WeatherError::Validation("Select two cities to compare.".to_string()));
        }
        if city_a == city_b {
            return Err(WeatherError::InvalidComparison(format!(
                "Select two different cities to compare (got {city_a} twice)."
            )));
        }

        let left = self.policy.decide(city_a, index, now);
        let right = self.policy.decide(city_b, index, now);

        if let (CacheDecision::Hit(l), CacheDecision::Hit(r)) = (&left, &right) {
            tracing::debug!(city_a, city_b, "both cities fresh in history, comparing without network");
            return Ok(ComparisonResult::from_snapshots(
                Resolved { source: Source::Cache, snapshot: l.clone() },
                Resolved { source: Source::Cache, snapshot: r.clone() },
            ));
        }

        let (left, right) = tokio::try_join!(
            settle(city_a, left, provider, now),
            settle(city_b, right, provider, now),
        )?;

        Ok(ComparisonResult::from_snapshots(left, right))
    }
}

async fn settle(
    city: &str,
    decision: CacheDecision,
    provider: &dyn WeatherProvider,
    now: DateTime<Utc>,
) -> Result<Resolved, WeatherError> {
    match decision {
        CacheDecision::Hit(snapshot) => Ok(Resolved { source: Source::Cache, snapshot }),
        CacheDecision::Miss(_) => {
            let snapshot = fetch_live(city, provider, now).await?;
            Ok(Resolved { source: Source::Live, snapshot })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HistoryEntry, fixtures};
    use crate::provider::fake::FakeProvider;
    use chrono::Duration;

    fn snapshot(city: &str, temperature: f64, humidity: i64, wind: f64) -> WeatherSnapshot {
        WeatherSnapshot::from_payload(city, fixtures::payload(city, temperature, humidity, wind), Utc::now())
            .expect("fixture payload is complete")
    }

    fn live(snapshot: WeatherSnapshot) -> Resolved {
        Resolved { source: Source::Live, snapshot }
    }

    fn saved(id: i64, city: &str, temperature: f64, humidity: i64, wind: f64, created_at: DateTime<Utc>) -> HistoryEntry {
        HistoryEntry {
            temperature_c: Some(temperature),
            humidity_pct: Some(humidity),
            wind_speed_kmh: Some(wind),
            ..fixtures::entry(id, city, created_at)
        }
    }

    #[test]
    fn ideal_city_wins_every_metric() {
        let a = snapshot("A", 22.0, 50, 5.0);
        let b = snapshot("B", 30.0, 80, 20.0);

        let result = ComparisonResult::from_snapshots(live(a), live(b));
        assert_eq!(result.scores, Scoreboard { left: 3, right: 0 });
        assert_eq!(result.winner, Winner::Left);
        assert_eq!(result.deltas, Deltas { temperature_diff: -8.0, humidity_diff: -30, wind_speed_diff: -15.0 });
    }

    #[test]
    fn identical_conditions_favor_the_right_side() {
        let a = snapshot("A", 22.0, 50, 10.0);
        let b = snapshot("B", 22.0, 50, 10.0);

        let result = ComparisonResult::from_snapshots(live(a), live(b));
        assert_eq!(result.scores, Scoreboard { left: 0, right: 3 });
        assert_eq!(result.winner, Winner::Right);
    }

    #[test]
    fn swapping_operands_negates_deltas_and_swaps_winner() {
        let a = snapshot("A", 18.0, 70, 12.0);
        let b = snapshot("B", 27.0, 45, 4.0);

        let ab = ComparisonResult::from_snapshots(live(a.clone()), live(b.clone()));
        let ba = ComparisonResult::from_snapshots(live(b), live(a));

        assert_eq!(ab.deltas.temperature_diff, -ba.deltas.temperature_diff);
        assert_eq!(ab.deltas.humidity_diff, -ba.deltas.humidity_diff);
        assert_eq!(ab.deltas.wind_speed_diff, -ba.deltas.wind_speed_diff);
        assert_eq!(ab.winner, ba.winner.swapped());
    }

    #[test]
    fn missing_readings_count_as_zero() {
        let mut a = snapshot("A", 20.0, 40, 10.0);
        a.humidity_pct = None;
        a.wind_speed_kmh = None;
        let b = snapshot("B", 20.0, 40, 10.0);

        let deltas = Deltas::between(&a, &b);
        assert_eq!(deltas.humidity_diff, -40);
        assert_eq!(deltas.wind_speed_diff, -10.0);
    }

    #[tokio::test]
    async fn rejects_bad_input_before_any_fetch() {
        let provider = FakeProvider::default();
        let engine = ComparisonEngine::default();
        let index = HistoryIndex::default();
        let now = Utc::now();

        let same = engine.compare("Lisboa", "Lisboa", &index, &provider, now).await.unwrap_err();
        assert!(matches!(same, WeatherError::InvalidComparison(_)));

        let empty = engine.compare("Lisboa", "  ", &index, &provider, now).await.unwrap_err();
        assert!(matches!(empty, WeatherError::Validation(_)));

        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn fresh_history_on_both_sides_skips_the_provider() {
        let now = Utc::now();
        let index = HistoryIndex::build(&[
            saved(2, "Curitiba", 16.0, 85, 14.0, now - Duration::minutes(20)),
            saved(1, "Fortaleza", 29.0, 70, 20.0, now - Duration::hours(4)),
        ]);
        let provider = FakeProvider::default();

        let result = ComparisonEngine::default()
            .compare("curitiba", "FORTALEZA", &index, &provider, now)
            .await
            .unwrap();

        assert!(result.served_from_history());
        assert_eq!(provider.call_count(), 0);
        assert_eq!(result.deltas, Deltas { temperature_diff: -13.0, humidity_diff: 15, wind_speed_diff: -6.0 });
    }

    #[tokio::test]
    async fn one_stale_side_is_fetched_live() {
        let now = Utc::now();
        let index = HistoryIndex::build(&[
            saved(2, "Curitiba", 16.0, 85, 14.0, now - Duration::minutes(20)),
            saved(1, "Fortaleza", 29.0, 70, 20.0, now - Duration::hours(6)),
        ]);
        let provider = FakeProvider::default().with("Fortaleza", fixtures::payload("Fortaleza", 30.0, 65, 22.0));

        let result = ComparisonEngine::default()
            .compare("Curitiba", "Fortaleza", &index, &provider, now)
            .await
            .unwrap();

        assert_eq!(result.left.source, Source::Cache);
        assert_eq!(result.right.source, Source::Live);
        assert_eq!(result.right.snapshot.temperature_c, 30.0);
        assert_eq!(*provider.calls.lock(), vec!["Fortaleza".to_string()]);
    }

    #[tokio::test]
    async fn surrounding_whitespace_is_ignored() {
        let now = Utc::now();
        let index = HistoryIndex::build(&[saved(1, "Natal", 22.0, 50, 5.0, now - Duration::minutes(5))]);
        let provider = FakeProvider::default().with("Cuiaba", fixtures::payload("Cuiaba", 35.0, 20, 3.0));
        let engine = ComparisonEngine::default();

        let result = engine.compare("Natal ", "  Cuiaba", &index, &provider, now).await.unwrap();
        assert_eq!(result.left.source, Source::Cache);
        assert_eq!(*provider.calls.lock(), vec!["Cuiaba".to_string()]);

        let same = engine.compare(" Natal", "Natal ", &index, &provider, now).await.unwrap_err();
        assert!(matches!(same, WeatherError::InvalidComparison(_)));
    }

    #[tokio::test]
    async fn failing_side_is_named_in_the_error() {
        let provider = FakeProvider::default().with("Lima", fixtures::payload("Lima", 19.0, 75, 11.0));

        let err = ComparisonEngine::default()
            .compare("Lima", "Nowhereland", &HistoryIndex::default(), &provider, Utc::now())
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::Provider { ref city, .. } if city == "Nowhereland"));
        assert!(err.to_string().contains("Nowhereland"));
    }
}
