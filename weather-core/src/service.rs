use anyhow::Context;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::{FreshnessPolicy, HistoryIndex, fetch_live};
use crate::compare::{ComparisonEngine, ComparisonResult};
use crate::error::WeatherError;
use crate::model::{
    HistoryEntry, NewHistoryEntry, NewWeatherRecord, Resolved, WeatherRecord, WeatherSnapshot,
};
use crate::postal::{PostalAddress, PostalLookup, ViaCepClient};
use crate::provider::{WeatherProvider, provider_from_config};
use crate::store::{HistoryStore, SqliteStore};
use crate::Config;

/// Result of an explicit save request.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(HistoryEntry),
    /// The snapshot was served from history; it is not appended a second time.
    AlreadyInHistory,
}

/// User-level weather operations over a provider, a postal lookup and the history store.
///
/// The history index is rebuilt lazily after every append made through this service.
/// `generation` is bumped on each invalidation so a build that read the store
/// before an append is never installed.
pub struct WeatherService {
    store: Arc<dyn HistoryStore>,
    provider: Arc<dyn WeatherProvider>,
    postal: Arc<dyn PostalLookup>,
    policy: FreshnessPolicy,
    engine: ComparisonEngine,
    index: RwLock<Option<Arc<HistoryIndex>>>,
    generation: AtomicU64,
}

impl WeatherService {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        provider: Arc<dyn WeatherProvider>,
        postal: Arc<dyn PostalLookup>,
    ) -> Self {
        let policy = FreshnessPolicy::default();
        Self {
            store,
            provider,
            postal,
            policy,
            engine: ComparisonEngine::new(policy),
            index: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Wire up the SQLite store, provider and postal client described by `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let db_path = config.database_path()?;
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open history database: {}", db_path.display()))?;
        let provider = provider_from_config(config)?;
        let postal = ViaCepClient::new(&config.postal.base_url, config.postal_timeout())?;

        tracing::info!(database = %db_path.display(), "weather service ready");
        Ok(Self::new(Arc::new(store), provider, Arc::new(postal)))
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>, WeatherError> {
        self.store.list_all()
    }

    /// History for first display; a storage failure is logged and shows as empty.
    pub fn history_or_empty(&self) -> Vec<HistoryEntry> {
        self.history().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load search history");
            Vec::new()
        })
    }

    fn index(&self) -> Result<Arc<HistoryIndex>, WeatherError> {
        if let Some(index) = self.index.read().as_ref() {
            return Ok(Arc::clone(index));
        }
        let generation = self.generation.load(Ordering::Acquire);
        let index = Arc::new(HistoryIndex::build(&self.store.list_all()?));

        let mut slot = self.index.write();
        if self.generation.load(Ordering::Acquire) == generation {
            *slot = Some(Arc::clone(&index));
        } else {
            tracing::debug!("history changed while indexing, not caching the index");
        }
        Ok(index)
    }

    fn invalidate_index(&self) {
        let mut slot = self.index.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        *slot = None;
    }

    /// Weather for `city`, from fresh history when possible.
    pub async fn lookup(&self, city: &str) -> Result<Resolved, WeatherError> {
        let city = require_city(city)?;
        let index = self.index()?;
        self.policy.resolve(city, &index, self.provider.as_ref(), Utc::now()).await
    }

    /// Resolve `code` to a city, then look that city up.
    pub async fn lookup_by_postal_code(
        &self,
        code: &str,
    ) -> Result<(PostalAddress, Resolved), WeatherError> {
        let address = self.resolve_postal_code(code).await?;
        let resolved = self.lookup(&address.city).await?;
        Ok((address, resolved))
    }

    /// Always fetch from the provider, bypassing history.
    pub async fn live(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let city = require_city(city)?;
        fetch_live(city, self.provider.as_ref(), Utc::now()).await
    }

    pub async fn resolve_postal_code(&self, code: &str) -> Result<PostalAddress, WeatherError> {
        self.postal.lookup(code).await
    }

    /// Persist a looked-up snapshot. History-sourced snapshots are never re-appended.
    pub fn save(
        &self,
        resolved: &Resolved,
        postal_code: Option<String>,
    ) -> Result<SaveOutcome, WeatherError> {
        if resolved.is_from_cache() {
            tracing::debug!(city = %resolved.snapshot.city, "snapshot came from history, not saving again");
            return Ok(SaveOutcome::AlreadyInHistory);
        }
        let entry = self.append_history(NewHistoryEntry::from_snapshot(&resolved.snapshot, postal_code))?;
        Ok(SaveOutcome::Saved(entry))
    }

    pub fn append_history(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, WeatherError> {
        entry.validate()?;
        let saved = self.store.append(entry)?;
        self.invalidate_index();
        tracing::info!(id = saved.id, city = %saved.city, "search saved to history");
        Ok(saved)
    }

    pub async fn compare(&self, city_a: &str, city_b: &str) -> Result<ComparisonResult, WeatherError> {
        let index = self.index()?;
        self.engine.compare(city_a, city_b, &index, self.provider.as_ref(), Utc::now()).await
    }

    pub fn add_record(&self, record: NewWeatherRecord) -> Result<WeatherRecord, WeatherError> {
        let saved = self.store.append_record(record)?;
        tracing::debug!(id = saved.id, "weather record stored");
        Ok(saved)
    }

    pub fn records(&self) -> Result<Vec<WeatherRecord>, WeatherError> {
        self.store.list_records()
    }
}

fn require_city(city: &str) -> Result<&str, WeatherError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(WeatherError::Validation("Please provide a city.".to_string()));
    }
    Ok(city)
}
