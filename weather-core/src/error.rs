use thiserror::Error;

/// Errors surfaced by the user-level weather operations.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Required input missing or malformed (city name, comparison target, postal code).
    #[error("{0}")]
    Validation(String),

    /// The weather provider returned no usable data for `city`.
    #[error("{message}")]
    Provider { city: String, message: String },

    /// The postal-code service reports the code does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Both sides of a comparison name the same city.
    #[error("{0}")]
    InvalidComparison(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl WeatherError {
    pub fn provider(city: &str, failure: impl std::fmt::Display) -> Self {
        Self::Provider {
            city: city.to_string(),
            message: format!("Unable to fetch weather data for {city}: {failure}"),
        }
    }

    /// Whether the error was caused by the caller's input rather than an upstream or storage fault.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidComparison(_))
    }
}

impl From<rusqlite::Error> for WeatherError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Failure reported by a weather provider client.
#[derive(Debug, Error)]
pub enum ProviderFailure {
    /// Upstream answered with an explicit failure flag and, usually, an explanation.
    #[error("{0}")]
    Upstream(String),

    #[error("upstream responded with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Transport(reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { Self::Timeout } else { Self::Transport(err) }
    }
}
