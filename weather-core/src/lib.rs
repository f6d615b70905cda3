//! Core library for the weather lookup service.
//!
//! This crate defines:
//! - Configuration handling
//! - The weather provider and postal-code clients
//! - Normalized snapshots and the SQLite search history
//! - The freshness rules for reusing saved lookups
//! - City comparison and its winner heuristic
//!
//! It is used by `weather-server` and `weather-cli`.

pub mod cache;
pub mod compare;
pub mod config;
pub mod display;
pub mod error;
pub mod model;
pub mod postal;
pub mod provider;
pub mod search;
pub mod service;
pub mod store;

pub use cache::{CacheDecision, FreshnessPolicy, HistoryIndex, FRESHNESS_WINDOW_MS};
pub use compare::{ComparisonEngine, ComparisonResult, Deltas, Scoreboard, Winner};
pub use config::Config;
pub use error::{ProviderFailure, WeatherError};
pub use model::{
    Conditions, HistoryEntry, NewHistoryEntry, NewWeatherRecord, Resolved, Source, WeatherRecord,
    WeatherSnapshot,
};
pub use postal::{PostalAddress, PostalLookup, ViaCepClient};
pub use provider::{WeatherProvider, provider_from_config};
pub use service::{SaveOutcome, WeatherService};
pub use store::{HistoryStore, SqliteStore};
