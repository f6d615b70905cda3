//! Brazilian postal code (CEP) to city resolution via a ViaCEP-compatible API.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, time::Duration};

use crate::error::WeatherError;

pub const POSTAL_CODE_DIGITS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub postal_code: String,
    pub city: String,
    pub state: Option<String>,
}

#[async_trait]
pub trait PostalLookup: Send + Sync + Debug {
    async fn lookup(&self, code: &str) -> Result<PostalAddress, WeatherError>;
}

/// Strip everything but digits and require exactly eight of them.
pub fn normalize_postal_code(input: &str) -> Result<String, WeatherError> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != POSTAL_CODE_DIGITS {
        return Err(WeatherError::Validation(format!(
            "Invalid postal code '{input}': expected {POSTAL_CODE_DIGITS} digits."
        )));
    }
    Ok(digits)
}

#[derive(Debug, Clone)]
pub struct ViaCepClient {
    base_url: String,
    http: Client,
}

impl ViaCepClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for postal code lookup")?;

        Ok(Self { base_url: base_url.trim_end_matches('/').to_string(), http })
    }
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    erro: Option<serde_json::Value>,
    localidade: Option<String>,
    uf: Option<String>,
}

#[async_trait]
impl PostalLookup for ViaCepClient {
    async fn lookup(&self, code: &str) -> Result<PostalAddress, WeatherError> {
        let code = normalize_postal_code(code)?;
        let url = format!("{}/ws/{}/json/", self.base_url, code);
        let unavailable = |e: reqwest::Error| {
            tracing::warn!(postal_code = %code, error = %e, "postal code lookup failed");
            WeatherError::Provider { city: code.clone(), message: "Error looking up postal code.".to_string() }
        };

        let res = self.http.get(&url).send().await.map_err(unavailable)?;
        if !res.status().is_success() {
            return Err(WeatherError::Provider {
                city: code.clone(),
                message: format!("Postal code service responded with status {}.", res.status()),
            });
        }
        let body: ViaCepResponse = res.json().await.map_err(unavailable)?;

        // ViaCEP signals unknown codes with `"erro": true` (older deployments send the string "true").
        let not_found = matches!(
            body.erro,
            Some(serde_json::Value::Bool(true)) | Some(serde_json::Value::String(_))
        );
        let city = body.localidade.filter(|c| !c.trim().is_empty());
        match (not_found, city) {
            (false, Some(city)) => Ok(PostalAddress { postal_code: code, city, state: body.uf }),
            _ => Err(WeatherError::NotFound(format!("Postal code {code} not found."))),
        }
    }
}
