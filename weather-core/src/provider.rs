use crate::{Config, error::ProviderFailure, provider::weatherstack::WeatherstackProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

pub mod weatherstack;

/// Client for an external current-weather API.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the raw current-conditions payload for `city`.
    async fn fetch(&self, city: &str) -> Result<Value, ProviderFailure>;
}

/// Construct the weather provider described by `config`.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the weather provider.\n\
                 Hint: run `weather configure` or set WEATHERSTACK_KEY."
        )
    })?;

    let provider = WeatherstackProvider::new(
        api_key.to_owned(),
        &config.provider.base_url,
        config.provider_timeout(),
    )?;

    Ok(Arc::new(provider))
}
