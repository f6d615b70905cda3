use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_WEATHER_BASE_URL: &str = "http://api.weatherstack.com";
pub const DEFAULT_POSTAL_BASE_URL: &str = "https://viacep.com.br";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Postal-code (CEP) lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for PostalConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_POSTAL_BASE_URL.to_string(), timeout_secs: DEFAULT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file holding the search history. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8000 }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [provider]
/// api_key = "..."
/// timeout_secs = 10
///
/// [storage]
/// database_path = "/var/lib/weather/history.sqlite3"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub postal: PostalConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Apply `WEATHERSTACK_KEY`, `WEATHER_DB`, `HOST` and `PORT` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("WEATHERSTACK_KEY").filter(|k| !k.is_empty()) {
            self.provider.api_key = Some(key);
        }
        if let Some(path) = lookup("WEATHER_DB").filter(|p| !p.is_empty()) {
            self.storage.database_path = Some(PathBuf::from(path));
        }
        if let Some(host) = lookup("HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        self
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.provider.api_key = Some(api_key);
    }

    /// Returns the provider API key, if present.
    pub fn api_key(&self) -> Option<&str> {
        self.provider.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn is_provider_configured(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider.timeout_secs)
    }

    pub fn postal_timeout(&self) -> Duration {
        Duration::from_secs(self.postal.timeout_secs)
    }

    /// Configured history database, or `history.sqlite3` in the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.database_path {
            return Ok(path.clone());
        }
        Ok(Self::project_dirs()?.data_dir().join("history.sqlite3"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_public_services() {
        let cfg = Config::default();

        assert_eq!(cfg.provider.base_url, DEFAULT_WEATHER_BASE_URL);
        assert_eq!(cfg.postal.base_url, DEFAULT_POSTAL_BASE_URL);
        assert_eq!(cfg.provider_timeout(), Duration::from_secs(10));
        assert!(!cfg.is_provider_configured());
        assert_eq!(cfg.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key(String::new());
        assert!(!cfg.is_provider_configured());

        cfg.set_api_key("KEY".into());
        assert_eq!(cfg.api_key(), Some("KEY"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WEATHERSTACK_KEY", "ENV_KEY"),
            ("WEATHER_DB", "/tmp/history.sqlite3"),
            ("PORT", "9090"),
        ]);

        let cfg = Config::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.api_key(), Some("ENV_KEY"));
        assert_eq!(cfg.database_path().expect("explicit path"), PathBuf::from("/tmp/history.sqlite3"));
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
    }

    #[test]
    fn unparsable_port_is_ignored() {
        let cfg = Config::default().with_overrides(|k| (k == "PORT").then(|| "eighty".to_string()));
        assert_eq!(cfg.server.port, 8000);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str("[provider]\napi_key = \"abc\"\n").expect("valid toml");

        assert_eq!(cfg.api_key(), Some("abc"));
        assert_eq!(cfg.provider.timeout_secs, 10);
        assert_eq!(cfg.postal.base_url, DEFAULT_POSTAL_BASE_URL);
    }
}
