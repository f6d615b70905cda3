use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::error::ProviderFailure;

use super::WeatherProvider;

/// Weatherstack `current` endpoint client.
#[derive(Debug, Clone)]
pub struct WeatherstackProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherstackProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the weather provider")?;

        Ok(Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http })
    }
}

#[async_trait]
impl WeatherProvider for WeatherstackProvider {
    async fn fetch(&self, city: &str) -> Result<Value, ProviderFailure> {
        let url = format!("{}/current", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("access_key", self.api_key.as_str()), ("query", city)])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(ProviderFailure::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|e| ProviderFailure::Decode(e.to_string()))?;

        // Weatherstack reports failures with HTTP 200 and `"success": false`.
        if payload.get("success").and_then(Value::as_bool) == Some(false) {
            let info = payload
                .pointer("/error/info")
                .and_then(Value::as_str)
                .unwrap_or("weather provider reported a failure");
            tracing::debug!(city, info, "weather provider rejected query");
            return Err(ProviderFailure::Upstream(info.to_string()));
        }

        Ok(payload)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
