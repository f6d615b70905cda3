//! Application state for the HTTP server.

use std::sync::Arc;
use weather_core::WeatherService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<WeatherService>,
}

impl AppState {
    pub fn new(service: Arc<WeatherService>) -> Self {
        Self { service }
    }
}
