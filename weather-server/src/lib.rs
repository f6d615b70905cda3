//! HTTP surface for the weather service.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  axum handlers                               │
//! │  - JSON in/out, validation, error mapping    │
//! └─────────────────────┬────────────────────────┘
//!                       │
//! ┌─────────────────────▼────────────────────────┐
//! │  weather_core::WeatherService                │
//! │  - provider, freshness rules, comparison     │
//! │  - SQLite search history                     │
//! └──────────────────────────────────────────────┘
//! ```

pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::create_router;
pub use state::AppState;
